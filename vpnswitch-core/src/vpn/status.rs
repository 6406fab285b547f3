//! Pattern-based interpretation of control tool output
//!
//! The connected marker is the only success signal the tool offers, so it
//! lives here and nowhere else in the state machine.

use crate::error::VerifyError;
use regex::Regex;

/// Marker printed by `nordvpn status` while a tunnel is up
pub const DEFAULT_CONNECTED_MARKER: &str = "Status: Connected";

/// Decides whether status text reports a live connection
#[derive(Debug, Clone)]
pub struct StatusMatcher {
    /// Literal marker, matched at a line start modulo leading whitespace
    connected_pattern: Regex,
    /// Pattern for "Meshnet: enabled" in the settings listing
    meshnet_pattern: Regex,
}

impl StatusMatcher {
    /// Build a matcher for a literal connected `marker`
    pub fn new(marker: &str) -> Self {
        Self {
            connected_pattern: Regex::new(&format!(r"(?m)^\s*{}", regex::escape(marker)))
                .expect("Failed to compile connected pattern"),
            meshnet_pattern: Regex::new(r"(?im)^\s*meshnet:\s*enabled\b")
                .expect("Failed to compile meshnet pattern"),
        }
    }

    /// Whether `status` contains the connected marker
    pub fn is_connected(&self, status: &str) -> bool {
        self.connected_pattern.is_match(status)
    }

    /// Classify a status response, returning the raw text on failure
    pub fn verify(&self, status: &str) -> Result<(), VerifyError> {
        if self.is_connected(status) {
            Ok(())
        } else {
            Err(VerifyError::NotConnected {
                status: status.trim().to_string(),
            })
        }
    }

    /// Whether a settings listing reports meshnet as enabled
    pub fn meshnet_enabled(&self, settings: &str) -> bool {
        self.meshnet_pattern.is_match(settings)
    }
}

impl Default for StatusMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECTED_MARKER)
    }
}
