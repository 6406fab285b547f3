//! Configuration module
//!
//! Handles the daemon's settings and loading/saving them from TOML files.

use crate::types::LocationCatalog;
use crate::vpn::policy::{BackoffPolicy, RotationPolicy};
use crate::vpn::status::DEFAULT_CONNECTED_MARKER;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod toml_config;

/// How to reach the VPN control tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Control tool executable, resolved on `PATH` when not absolute
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Server group passed to `connect --group`
    #[serde(default = "default_group")]
    pub group: String,

    /// Upper bound for a connect command, in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Upper bound for every other command, in seconds
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    /// Text whose presence in the status output means connected
    #[serde(default = "default_connected_marker")]
    pub connected_marker: String,
}

fn default_binary() -> String {
    "nordvpn".to_string()
}
fn default_group() -> String {
    "p2p".to_string()
}
fn default_connect_timeout() -> u64 {
    90
}
fn default_command_timeout() -> u64 {
    30
}
fn default_connected_marker() -> String {
    DEFAULT_CONNECTED_MARKER.to_string()
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            group: default_group(),
            connect_timeout_secs: default_connect_timeout(),
            command_timeout_secs: default_command_timeout(),
            connected_marker: default_connected_marker(),
        }
    }
}

impl ControlConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.binary.trim().is_empty() {
            return Err("Control binary cannot be empty".to_string());
        }
        if self.group.trim().is_empty() {
            return Err("Server group cannot be empty".to_string());
        }
        if self.connect_timeout_secs == 0 || self.command_timeout_secs == 0 {
            return Err("Timeouts cannot be zero".to_string());
        }
        if self.connected_marker.trim().is_empty() {
            return Err("Connected marker cannot be empty".to_string());
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

/// One `set <option> <value>` applied at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub option: String,
    pub value: String,
}

impl Setting {
    pub fn new(option: &str, value: &str) -> Self {
        Self {
            option: option.to_string(),
            value: value.to_string(),
        }
    }
}

/// Startup settings applied once, in order, before rotation begins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupSettings {
    /// Ordered `set` calls
    #[serde(default = "default_settings")]
    pub apply: Vec<Setting>,

    /// Make sure meshnet is on and its peers refreshed
    #[serde(default)]
    pub meshnet: bool,

    /// Pause after enabling meshnet before refreshing peers
    #[serde(default = "default_meshnet_settle")]
    pub meshnet_settle_secs: u64,
}

fn default_settings() -> Vec<Setting> {
    vec![
        Setting::new("killswitch", "off"),
        Setting::new("cybersec", "off"),
        Setting::new("autoconnect", "off"),
        Setting::new("firewall", "off"),
    ]
}
fn default_meshnet_settle() -> u64 {
    5
}

impl Default for StartupSettings {
    fn default() -> Self {
        Self {
            apply: default_settings(),
            meshnet: false,
            meshnet_settle_secs: default_meshnet_settle(),
        }
    }
}

/// Complete daemon configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SwitcherConfig {
    /// Overrides the built-in P2P catalog when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<String>>,

    #[serde(default)]
    pub control: ControlConfig,

    #[serde(default)]
    pub rotation: RotationPolicy,

    #[serde(default)]
    pub backoff: BackoffPolicy,

    #[serde(default)]
    pub settings: StartupSettings,
}

impl SwitcherConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<(), String> {
        self.control.validate()?;
        self.rotation.validate().map_err(|e| e.to_string())?;
        self.backoff.validate().map_err(|e| e.to_string())?;
        Ok(())
    }

    /// The catalog the rotator will draw from
    pub fn catalog(&self) -> LocationCatalog {
        match &self.locations {
            Some(codes) => LocationCatalog::new(codes),
            None => LocationCatalog::p2p(),
        }
    }
}
