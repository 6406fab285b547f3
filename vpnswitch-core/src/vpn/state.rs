//! Rotation state machine states and the loop's long-lived counters

use crate::types::Location;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Observable state of the rotation loop
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RotatorState {
    /// Clearing any stale session before the first attempt
    #[default]
    Starting,

    /// Disconnect, settle and connect command in progress
    Connecting { location: Location },

    /// Connect returned, waiting for the status check
    Verifying { location: Location },

    /// Tunnel verified, sleeping until the next rotation
    Connected {
        location: Location,
        next_rotation_at: DateTime<Utc>,
    },

    /// Attempt failed, sleeping until the next retry
    Backoff {
        consecutive_failures: u32,
        next_retry_at: DateTime<Utc>,
    },

    /// Final disconnect issued, loop exiting
    Stopping,
}

impl RotatorState {
    pub fn is_connected(&self) -> bool {
        matches!(self, RotatorState::Connected { .. })
    }

    pub fn is_backoff(&self) -> bool {
        matches!(self, RotatorState::Backoff { .. })
    }
}

impl std::fmt::Display for RotatorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RotatorState::Starting => write!(f, "starting"),
            RotatorState::Connecting { location } => write!(f, "connecting to {}", location),
            RotatorState::Verifying { location } => write!(f, "verifying {}", location),
            RotatorState::Connected {
                location,
                next_rotation_at,
            } => write!(
                f,
                "connected to {} until {}",
                location,
                next_rotation_at.format("%H:%M:%S")
            ),
            RotatorState::Backoff {
                consecutive_failures,
                next_retry_at,
            } => write!(
                f,
                "backoff after {} failure(s) until {}",
                consecutive_failures,
                next_retry_at.format("%H:%M:%S")
            ),
            RotatorState::Stopping => write!(f, "stopping"),
        }
    }
}

/// Mutable state owned by the rotation loop for the life of the process
#[derive(Debug, Clone)]
pub struct RotationState {
    consecutive_failures: u32,
    base_interval: Duration,
    last_scheduled_wake: Option<DateTime<Utc>>,
}

impl RotationState {
    /// Fresh state for a run with the given base rotation interval
    pub fn new(base_interval: Duration) -> Self {
        Self {
            consecutive_failures: 0,
            base_interval,
            last_scheduled_wake: None,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn base_interval(&self) -> Duration {
        self.base_interval
    }

    pub fn last_scheduled_wake(&self) -> Option<DateTime<Utc>> {
        self.last_scheduled_wake
    }

    /// Reset the failure streak after a verified connection
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Extend the failure streak and return its new length
    pub fn record_failure(&mut self) -> u32 {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.consecutive_failures
    }

    /// Record the wall-clock time the loop will wake after sleeping `delay`
    pub fn schedule(&mut self, delay: Duration) -> DateTime<Utc> {
        let wake = Utc::now()
            + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
        self.last_scheduled_wake = Some(wake);
        wake
    }
}
