//! Rotation scheduling and exponential backoff
//!
//! This module holds the two timing policies of the rotation loop: how long
//! to stay on a location after a verified connection, and how long to wait
//! after consecutive failures.

use rand::Rng;
use std::time::Duration;

/// Longest base rotation interval accepted, 30 days
pub const MAX_INTERVAL_SECS: u64 = 30 * 24 * 3600;

/// Timing of the success path
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RotationPolicy {
    /// Lower bound for the per-run base interval, in seconds
    #[serde(default = "default_min_interval")]
    pub min_interval_secs: u64,

    /// Upper bound for the per-run base interval, in seconds
    #[serde(default = "default_max_interval")]
    pub max_interval_secs: u64,

    /// Maximum deviation of each rotation sleep from the base, in percent
    #[serde(default = "default_jitter_percent")]
    pub jitter_percent: u32,

    /// Pause after the pre-connect disconnect
    #[serde(default = "default_disconnect_settle")]
    pub disconnect_settle_secs: u64,

    /// Pause between a successful connect and the status query
    #[serde(default = "default_verify_settle")]
    pub verify_settle_secs: u64,
}

fn default_min_interval() -> u64 {
    3600
}
fn default_max_interval() -> u64 {
    7200
}
fn default_jitter_percent() -> u32 {
    10
}
fn default_disconnect_settle() -> u64 {
    2
}
fn default_verify_settle() -> u64 {
    10
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            min_interval_secs: default_min_interval(),
            max_interval_secs: default_max_interval(),
            jitter_percent: default_jitter_percent(),
            disconnect_settle_secs: default_disconnect_settle(),
            verify_settle_secs: default_verify_settle(),
        }
    }
}

impl RotationPolicy {
    /// Validate the entire policy
    ///
    /// # Returns
    ///
    /// * `Ok(())` if all fields are valid
    /// * `Err(PolicyValidationError)` with the first validation error encountered
    pub fn validate(&self) -> Result<(), PolicyValidationError> {
        if self.min_interval_secs < 60 {
            return Err(PolicyValidationError::InvalidMinInterval(
                self.min_interval_secs,
            ));
        }
        if self.max_interval_secs < self.min_interval_secs {
            return Err(PolicyValidationError::MaxIntervalLessThanMin(
                self.max_interval_secs,
                self.min_interval_secs,
            ));
        }
        if self.max_interval_secs > MAX_INTERVAL_SECS {
            return Err(PolicyValidationError::MaxIntervalTooLong(
                self.max_interval_secs,
            ));
        }
        if self.jitter_percent > 50 {
            return Err(PolicyValidationError::InvalidJitter(self.jitter_percent));
        }
        Ok(())
    }

    /// Choose the base interval for a run, uniformly within the configured range
    pub fn choose_base_interval<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let secs = rng.gen_range(self.min_interval_secs..=self.max_interval_secs);
        Duration::from_secs(secs)
    }

    /// Inclusive bounds, in whole seconds, of a jittered sleep around `base`
    ///
    /// The lower bound rounds up and the upper bound rounds down so that
    /// every value in range lies within the jitter band.
    pub fn jitter_bounds(&self, base: Duration) -> (Duration, Duration) {
        let base = base.as_secs();
        let pct = self.jitter_percent as u64;
        let low = base.saturating_mul(100u64.saturating_sub(pct)).div_ceil(100);
        let high = base.saturating_mul(100 + pct) / 100;
        if low > high {
            (Duration::from_secs(base), Duration::from_secs(base))
        } else {
            (Duration::from_secs(low), Duration::from_secs(high))
        }
    }

    /// Re-randomize the sleep for one successful rotation
    pub fn jittered_interval<R: Rng + ?Sized>(&self, base: Duration, rng: &mut R) -> Duration {
        let (low, high) = self.jitter_bounds(base);
        Duration::from_secs(rng.gen_range(low.as_secs()..=high.as_secs()))
    }

    pub fn disconnect_settle(&self) -> Duration {
        Duration::from_secs(self.disconnect_settle_secs)
    }

    pub fn verify_settle(&self) -> Duration {
        Duration::from_secs(self.verify_settle_secs)
    }
}

/// Retry timing of the failure path
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BackoffPolicy {
    /// Delay after the first failure, in seconds
    #[serde(default = "default_base_delay")]
    pub base_secs: u64,

    /// Cap for exponential growth, in seconds
    #[serde(default = "default_max_delay")]
    pub max_secs: u64,
}

fn default_base_delay() -> u64 {
    60
}
fn default_max_delay() -> u64 {
    1800
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_secs: default_base_delay(),
            max_secs: default_max_delay(),
        }
    }
}

impl BackoffPolicy {
    pub fn validate(&self) -> Result<(), PolicyValidationError> {
        if self.base_secs < 1 {
            return Err(PolicyValidationError::InvalidBaseDelay(self.base_secs));
        }
        if self.max_secs < self.base_secs {
            return Err(PolicyValidationError::MaxDelayLessThanBase(
                self.max_secs,
                self.base_secs,
            ));
        }
        Ok(())
    }

    /// Calculate the retry delay after `consecutive_failures` failures in a row
    ///
    /// Formula: base × 2^(failures-1), capped at max. A count of zero is
    /// treated as the first failure.
    #[tracing::instrument(skip(self), fields(base = self.base_secs, max = self.max_secs))]
    pub fn calculate_backoff(&self, consecutive_failures: u32) -> Duration {
        let exponent = consecutive_failures.saturating_sub(1).min(63);
        let delay = self
            .base_secs
            .checked_mul(1u64 << exponent)
            .unwrap_or(u64::MAX);
        Duration::from_secs(delay.min(self.max_secs))
    }
}

/// Validation errors for rotation and backoff policies
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PolicyValidationError {
    #[error("min_interval_secs must be at least 60, got: {0}")]
    InvalidMinInterval(u64),

    #[error("max_interval_secs ({0}) must be >= min_interval_secs ({1})")]
    MaxIntervalLessThanMin(u64, u64),

    #[error("max_interval_secs must be at most 2592000 (30 days), got: {0}")]
    MaxIntervalTooLong(u64),

    #[error("jitter_percent must be between 0 and 50, got: {0}")]
    InvalidJitter(u32),

    #[error("backoff base_secs must be at least 1, got: {0}")]
    InvalidBaseDelay(u64),

    #[error("backoff max_secs ({0}) must be >= base_secs ({1})")]
    MaxDelayLessThanBase(u64, u64),
}
