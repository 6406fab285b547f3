//! Cooperative shutdown signalling for the rotation loop

use tokio::sync::watch;

/// Sending half, held by whoever receives termination requests
#[derive(Debug)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

/// Receiving half, polled by the rotation loop at every suspension point
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

/// Create a connected handle/receiver pair
pub fn channel() -> (ShutdownHandle, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, Shutdown { rx })
}

impl ShutdownHandle {
    /// Request shutdown; idempotent
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been requested
    ///
    /// A dropped [`ShutdownHandle`] counts as a request.
    pub async fn wait(&mut self) {
        // wait_for checks the current value first
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_resolves_after_trigger() {
        let (handle, mut shutdown) = channel();
        assert!(!shutdown.is_triggered());

        handle.trigger();
        tokio::time::timeout(Duration::from_secs(1), shutdown.wait())
            .await
            .expect("wait should resolve after trigger");
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_dropped_handle_counts_as_shutdown() {
        let (handle, mut shutdown) = channel();
        drop(handle);
        tokio::time::timeout(Duration::from_secs(1), shutdown.wait())
            .await
            .expect("wait should resolve when the handle is gone");
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_pends_without_trigger() {
        let (_handle, mut shutdown) = channel();
        let result = tokio::time::timeout(Duration::from_secs(60), shutdown.wait()).await;
        assert!(result.is_err());
    }
}
