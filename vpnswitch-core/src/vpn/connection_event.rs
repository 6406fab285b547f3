//! Per-attempt records emitted by the rotation loop

use crate::error::{ConnectError, VerifyError};
use crate::types::Location;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Why an attempt did not produce a verified connection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttemptError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Verify(#[from] VerifyError),
}

/// Outcome of one connect-and-verify attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failure(AttemptError),
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Success)
    }
}

/// A single rotation attempt; never persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionAttempt {
    pub location: Location,
    pub started_at: DateTime<Utc>,
    pub outcome: AttemptOutcome,
    /// Raw status text, when the status query returned any
    pub status: Option<String>,
}

/// Emitted after every attempt, once the next sleep has been scheduled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationEvent {
    pub attempt: ConnectionAttempt,
    /// Failure streak after this attempt; zero after a success
    pub consecutive_failures: u32,
    /// Rotation interval on success, backoff delay on failure
    pub delay: Duration,
}
