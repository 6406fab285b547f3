//! Scripted VpnControl used by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use vpnswitch_core::config::SwitcherConfig;
use vpnswitch_core::error::ControlError;
use vpnswitch_core::types::Location;
use vpnswitch_core::vpn::VpnControl;

/// A call received by the fake, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Set(String, String),
    Disconnect,
    Connect(String),
    Status,
    Settings,
    RefreshPeers,
}

/// How one connect-and-verify attempt plays out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Connect succeeds and status reports connected
    Connected,
    /// Connect succeeds but status reports disconnected
    NotConnected,
    /// Connect exits non-zero
    ConnectFails,
    /// Connect never returns
    ConnectHangs,
    /// Connect succeeds, status exits non-zero
    StatusFails,
    /// Connect succeeds, status never returns
    StatusHangs,
}

pub struct FakeControl {
    calls: Mutex<Vec<Call>>,
    script: Mutex<VecDeque<Step>>,
    default_step: Step,
    current: Mutex<Step>,
    failing_options: HashSet<String>,
    hanging_options: HashSet<String>,
    disconnect_fails: bool,
    settings_text: String,
}

impl FakeControl {
    /// Every attempt plays out as `step`
    pub fn new(step: Step) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
            default_step: step,
            current: Mutex::new(step),
            failing_options: HashSet::new(),
            hanging_options: HashSet::new(),
            disconnect_fails: false,
            settings_text: "Technology: NORDLYNX\nMeshnet: disabled\n".to_string(),
        }
    }

    /// Play `steps` first, then fall back to `then`
    pub fn scripted(steps: &[Step], then: Step) -> Self {
        let fake = Self::new(then);
        fake.script.lock().unwrap().extend(steps.iter().copied());
        fake
    }

    pub fn failing_option(mut self, option: &str) -> Self {
        self.failing_options.insert(option.to_string());
        self
    }

    pub fn hanging_option(mut self, option: &str) -> Self {
        self.hanging_options.insert(option.to_string());
        self
    }

    pub fn failing_disconnect(mut self) -> Self {
        self.disconnect_fails = true;
        self
    }

    pub fn with_settings_text(mut self, text: &str) -> Self {
        self.settings_text = text.to_string();
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn failure(command: &str) -> ControlError {
        ControlError::CommandFailed {
            command: command.to_string(),
            code: Some(1),
            stderr: "Whoops! Connection failed.".to_string(),
        }
    }
}

#[async_trait]
impl VpnControl for FakeControl {
    async fn set(&self, option: &str, value: &str) -> Result<(), ControlError> {
        self.record(Call::Set(option.to_string(), value.to_string()));
        if self.hanging_options.contains(option) {
            std::future::pending::<()>().await;
        }
        if self.failing_options.contains(option) {
            return Err(Self::failure("set"));
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ControlError> {
        self.record(Call::Disconnect);
        if self.disconnect_fails {
            Err(Self::failure("disconnect"))
        } else {
            Ok(())
        }
    }

    async fn connect(&self, location: &Location, _group: &str) -> Result<String, ControlError> {
        self.record(Call::Connect(location.to_string()));
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.default_step);
        *self.current.lock().unwrap() = step;

        match step {
            Step::ConnectFails => Err(Self::failure("connect")),
            Step::ConnectHangs => std::future::pending().await,
            _ => Ok(format!("You are connected to {} #123 (p2p)!\n", location)),
        }
    }

    async fn status(&self) -> Result<String, ControlError> {
        self.record(Call::Status);
        let step = *self.current.lock().unwrap();
        match step {
            Step::Connected => Ok("Status: Connected\nHostname: x123.nordvpn.com\n".to_string()),
            Step::StatusFails => Err(Self::failure("status")),
            Step::StatusHangs => std::future::pending().await,
            _ => Ok("Status: Disconnected\n".to_string()),
        }
    }

    async fn settings(&self) -> Result<String, ControlError> {
        self.record(Call::Settings);
        Ok(self.settings_text.clone())
    }

    async fn refresh_meshnet_peers(&self) -> Result<(), ControlError> {
        self.record(Call::RefreshPeers);
        Ok(())
    }
}

/// Default configuration with a fixed base interval and the given catalog
pub fn test_config(locations: &[&str], base_interval_secs: u64) -> SwitcherConfig {
    let mut config = SwitcherConfig::default();
    config.locations = Some(locations.iter().map(|l| l.to_string()).collect());
    config.rotation.min_interval_secs = base_interval_secs;
    config.rotation.max_interval_secs = base_interval_secs;
    config
}
