//! VPN rotation loop with exponential backoff
//!
//! [`Rotator`] keeps a tunnel established through a [`VpnControl`],
//! rotating to a random location on a jittered schedule and backing off
//! after failed attempts, until shutdown is requested.

use crate::config::SwitcherConfig;
use crate::error::{ConnectError, FatalError, VerifyError};
use crate::types::{Location, LocationCatalog};
use crate::vpn::connection_event::{
    AttemptError, AttemptOutcome, ConnectionAttempt, RotationEvent,
};
use crate::vpn::control::{bounded, VpnControl};
use crate::vpn::policy::{BackoffPolicy, RotationPolicy};
use crate::vpn::shutdown::Shutdown;
use crate::vpn::state::{RotationState, RotatorState};
use crate::vpn::status::StatusMatcher;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Why the rotation loop returned normally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Shutdown,
}

/// Drives the connection lifecycle state machine
pub struct Rotator {
    control: Arc<dyn VpnControl>,
    catalog: LocationCatalog,
    rotation: RotationPolicy,
    backoff: BackoffPolicy,
    group: String,
    connect_timeout: Duration,
    command_timeout: Duration,
    matcher: StatusMatcher,
    rng: StdRng,
    state_tx: watch::Sender<RotatorState>,
    state_rx: watch::Receiver<RotatorState>,
    /// Present only while someone holds the receiving half
    event_tx: Option<mpsc::UnboundedSender<RotationEvent>>,
}

impl Rotator {
    /// Create a rotator from the daemon configuration
    ///
    /// The catalog is not checked here; an empty catalog is reported by
    /// [`Rotator::run`] so that it still goes through the final disconnect.
    pub fn new(control: Arc<dyn VpnControl>, config: &SwitcherConfig) -> Self {
        let (state_tx, state_rx) = watch::channel(RotatorState::Starting);

        Self {
            control,
            catalog: config.catalog(),
            rotation: config.rotation.clone(),
            backoff: config.backoff.clone(),
            group: config.control.group.clone(),
            connect_timeout: config.control.connect_timeout(),
            command_timeout: config.control.command_timeout(),
            matcher: StatusMatcher::new(&config.control.connected_marker),
            rng: StdRng::from_entropy(),
            state_tx,
            state_rx,
            event_tx: None,
        }
    }

    /// Use a seeded RNG so location and interval choices are reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Get a receiver for state updates
    pub fn state_receiver(&self) -> watch::Receiver<RotatorState> {
        self.state_rx.clone()
    }

    /// Subscribe to per-attempt events
    ///
    /// Returns `None` while an earlier receiver is still alive. Without a
    /// subscriber events are only logged.
    pub fn take_event_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<RotationEvent>> {
        if self.event_tx.is_some() {
            return None;
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.event_tx = Some(tx);
        Some(rx)
    }

    /// Run until shutdown, then issue exactly one final disconnect
    ///
    /// # Returns
    ///
    /// * `Ok(StopReason::Shutdown)` when shutdown was requested
    /// * `Err(FatalError)` when the loop cannot proceed
    pub async fn run(mut self, mut shutdown: Shutdown) -> Result<StopReason, FatalError> {
        let result = self.rotate(&mut shutdown).await;
        if let Err(ref e) = result {
            error!("Rotation loop aborted: {}", e);
        }
        self.stop().await;
        result
    }

    async fn rotate(&mut self, shutdown: &mut Shutdown) -> Result<StopReason, FatalError> {
        if self.catalog.is_empty() {
            return Err(FatalError::EmptyCatalog);
        }
        self.rotation
            .validate()
            .map_err(|e| FatalError::InvalidPolicy(e.to_string()))?;
        self.backoff
            .validate()
            .map_err(|e| FatalError::InvalidPolicy(e.to_string()))?;

        self.publish(RotatorState::Starting);
        info!(
            locations = self.catalog.len(),
            group = %self.group,
            "Starting VPN rotation"
        );

        // Clear any session left over from a previous run
        if interruptible(shutdown, self.disconnect_best_effort("startup"))
            .await
            .is_none()
        {
            return Ok(StopReason::Shutdown);
        }
        if pause(shutdown, self.rotation.disconnect_settle()).await {
            return Ok(StopReason::Shutdown);
        }

        let mut state = RotationState::new(self.rotation.choose_base_interval(&mut self.rng));
        info!(
            base_interval_secs = state.base_interval().as_secs(),
            "Chose base rotation interval"
        );

        loop {
            let attempt = match interruptible(shutdown, self.attempt()).await {
                Some(attempt) => attempt?,
                None => return Ok(StopReason::Shutdown),
            };

            let delay = match &attempt.outcome {
                AttemptOutcome::Success => {
                    state.record_success();
                    let delay = self
                        .rotation
                        .jittered_interval(state.base_interval(), &mut self.rng);
                    let next_rotation_at = state.schedule(delay);
                    info!(
                        location = %attempt.location,
                        outcome = "success",
                        delay_secs = delay.as_secs(),
                        consecutive_failures = 0,
                        "VPN active. Next switch in {} minutes",
                        delay.as_secs() / 60
                    );
                    self.publish(RotatorState::Connected {
                        location: attempt.location.clone(),
                        next_rotation_at,
                    });
                    delay
                }
                AttemptOutcome::Failure(reason) => {
                    let failures = state.record_failure();
                    let delay = self.backoff.calculate_backoff(failures);
                    let next_retry_at = state.schedule(delay);
                    warn!(
                        location = %attempt.location,
                        outcome = "failure",
                        error = %reason,
                        delay_secs = delay.as_secs(),
                        consecutive_failures = failures,
                        "VPN connection failed. Retrying in {} seconds",
                        delay.as_secs()
                    );
                    self.publish(RotatorState::Backoff {
                        consecutive_failures: failures,
                        next_retry_at,
                    });
                    delay
                }
            };

            self.emit(RotationEvent {
                attempt,
                consecutive_failures: state.consecutive_failures(),
                delay,
            });

            if pause(shutdown, delay).await {
                return Ok(StopReason::Shutdown);
            }
        }
    }

    /// Select a location, reconnect to it and verify the result
    ///
    /// Every control failure becomes a failed outcome; only an empty
    /// catalog is an error.
    async fn attempt(&mut self) -> Result<ConnectionAttempt, FatalError> {
        let location = self
            .catalog
            .choose(&mut self.rng)
            .cloned()
            .ok_or(FatalError::EmptyCatalog)?;
        let started_at = Utc::now();

        self.publish(RotatorState::Connecting {
            location: location.clone(),
        });
        info!(location = %location, "Attempting to connect to a {} server in {}", self.group, location);

        self.disconnect_best_effort("rotation").await;
        tokio::time::sleep(self.rotation.disconnect_settle()).await;

        let finish = |outcome, status| ConnectionAttempt {
            location: location.clone(),
            started_at,
            outcome,
            status,
        };

        if let Err(e) = self.connect(&location).await {
            error!(location = %location, error = %e, "Failed to connect");
            return Ok(finish(AttemptOutcome::Failure(e.into()), None));
        }

        self.publish(RotatorState::Verifying {
            location: location.clone(),
        });
        tokio::time::sleep(self.rotation.verify_settle()).await;

        let status = match bounded("status", self.command_timeout, self.control.status()).await {
            Ok(status) => status,
            Err(e) => {
                let error = VerifyError::from(e);
                warn!(location = %location, error = %error, "Status check failed");
                return Ok(finish(
                    AttemptOutcome::Failure(AttemptError::Verify(error)),
                    None,
                ));
            }
        };

        let outcome = match self.matcher.verify(&status) {
            Ok(()) => {
                info!(location = %location, "VPN connection verified as active");
                AttemptOutcome::Success
            }
            Err(e) => {
                warn!(
                    location = %location,
                    status = %status.trim(),
                    "VPN connection reported as not connected after wait"
                );
                AttemptOutcome::Failure(e.into())
            }
        };
        Ok(finish(outcome, Some(status)))
    }

    async fn connect(&self, location: &Location) -> Result<(), ConnectError> {
        let output = bounded(
            "connect",
            self.connect_timeout,
            self.control.connect(location, &self.group),
        )
        .await
        .map_err(|e| ConnectError::from_control(location.as_str(), e))?;

        info!(location = %location, "Connect command succeeded");
        debug!(location = %location, output = %output.trim(), "Connect output");
        Ok(())
    }

    /// Disconnect, logging and ignoring any failure
    async fn disconnect_best_effort(&self, phase: &str) {
        match bounded("disconnect", self.command_timeout, self.control.disconnect()).await {
            Ok(()) => debug!(phase, "Disconnected"),
            Err(e) => warn!(phase, error = %e, "Disconnect failed, continuing"),
        }
    }

    async fn stop(&mut self) {
        self.publish(RotatorState::Stopping);
        info!("Service stopping. Attempting to disconnect VPN.");
        match bounded("disconnect", self.command_timeout, self.control.disconnect()).await {
            Ok(()) => info!("VPN disconnected"),
            Err(e) => error!(error = %e, "Error during final VPN disconnect"),
        }
    }

    /// Forward an event to the subscriber, forgetting it once it hangs up
    fn emit(&mut self, event: RotationEvent) {
        if let Some(tx) = &self.event_tx {
            if tx.send(event).is_err() {
                debug!("Event receiver dropped");
                self.event_tx = None;
            }
        }
    }

    fn publish(&self, state: RotatorState) {
        debug!(state = %state, "Rotator state changed");
        self.state_tx.send_replace(state);
    }
}

/// Run `work` unless shutdown is requested first; `None` on shutdown
async fn interruptible<T>(shutdown: &mut Shutdown, work: impl Future<Output = T>) -> Option<T> {
    tokio::select! {
        biased;
        _ = shutdown.wait() => None,
        value = work => Some(value),
    }
}

/// Sleep for `duration`; `true` if shutdown cut the sleep short
async fn pause(shutdown: &mut Shutdown, duration: Duration) -> bool {
    interruptible(shutdown, tokio::time::sleep(duration))
        .await
        .is_none()
}
