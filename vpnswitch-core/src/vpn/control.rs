//! Capability interface over the VPN control tool
//!
//! The rotation loop only ever talks to the tool through [`VpnControl`], so
//! tests can substitute a scripted implementation.

use crate::error::ControlError;
use crate::types::Location;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Operations the daemon needs from the VPN control tool
///
/// Implementations do not enforce timeouts themselves; callers bound each
/// call with [`bounded`].
#[async_trait]
pub trait VpnControl: Send + Sync {
    /// Persist `option=value` in the tool's configuration
    async fn set(&self, option: &str, value: &str) -> Result<(), ControlError>;

    /// Tear down the current session, if any
    async fn disconnect(&self) -> Result<(), ControlError>;

    /// Connect to `location` within server `group`, returning the tool's output
    async fn connect(&self, location: &Location, group: &str) -> Result<String, ControlError>;

    /// Raw status text
    async fn status(&self) -> Result<String, ControlError>;

    /// Raw settings listing
    async fn settings(&self) -> Result<String, ControlError>;

    /// Refresh the meshnet peer list
    async fn refresh_meshnet_peers(&self) -> Result<(), ControlError>;
}

#[async_trait]
impl<T: VpnControl + ?Sized> VpnControl for Arc<T> {
    async fn set(&self, option: &str, value: &str) -> Result<(), ControlError> {
        (**self).set(option, value).await
    }

    async fn disconnect(&self) -> Result<(), ControlError> {
        (**self).disconnect().await
    }

    async fn connect(&self, location: &Location, group: &str) -> Result<String, ControlError> {
        (**self).connect(location, group).await
    }

    async fn status(&self) -> Result<String, ControlError> {
        (**self).status().await
    }

    async fn settings(&self) -> Result<String, ControlError> {
        (**self).settings().await
    }

    async fn refresh_meshnet_peers(&self) -> Result<(), ControlError> {
        (**self).refresh_meshnet_peers().await
    }
}

/// Run a control call with a deadline, mapping expiry to [`ControlError::Timeout`]
///
/// Dropping the inner future on expiry is what stops the underlying
/// process, so adapters must kill their child on drop.
pub async fn bounded<T, F>(command: &str, limit: Duration, call: F) -> Result<T, ControlError>
where
    F: Future<Output = Result<T, ControlError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ControlError::Timeout {
            command: command.to_string(),
            seconds: limit.as_secs(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_bounded_maps_elapsed_to_timeout() {
        let result: Result<(), ControlError> = bounded(
            "connect",
            Duration::from_secs(90),
            std::future::pending(),
        )
        .await;

        assert_eq!(
            result,
            Err(ControlError::Timeout {
                command: "connect".to_string(),
                seconds: 90,
            })
        );
    }

    #[tokio::test]
    async fn test_bounded_passes_through_result() {
        let result = bounded("status", Duration::from_secs(5), async {
            Ok::<_, ControlError>("Status: Connected".to_string())
        })
        .await;
        assert_eq!(result.unwrap(), "Status: Connected");
    }
}
