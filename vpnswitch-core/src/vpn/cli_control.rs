//! Subprocess adapter for the `nordvpn` command-line client
//!
//! Each operation spawns one short-lived process and waits for it to exit.

use crate::error::{ControlError, FatalError};
use crate::types::Location;
use crate::vpn::control::VpnControl;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// [`VpnControl`] implementation that shells out to the control tool
#[derive(Debug, Clone)]
pub struct CliControl {
    /// Resolved path of the control binary
    binary: PathBuf,
}

impl CliControl {
    /// Use `binary` as given, without checking it exists
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Resolve `binary` on `PATH`
    pub fn locate(binary: &str) -> Result<Self, FatalError> {
        let path = which::which(binary).map_err(|e| FatalError::ToolNotFound {
            binary: binary.to_string(),
            reason: e.to_string(),
        })?;
        tracing::debug!("Using VPN control tool at {}", path.display());
        Ok(Self::new(path))
    }

    /// Run the tool with `args`, returning stdout on a zero exit status
    ///
    /// The child is killed if this future is dropped before it exits.
    async fn run(&self, args: &[&str]) -> Result<String, ControlError> {
        let command = args.join(" ");
        tracing::debug!("Running {} {}", self.binary.display(), command);

        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ControlError::Spawn {
                binary: self.binary.display().to_string(),
                reason: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            Ok(stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // nordvpn reports most errors on stdout
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            Err(ControlError::CommandFailed {
                command,
                code: output.status.code(),
                stderr: detail,
            })
        }
    }
}

#[async_trait]
impl VpnControl for CliControl {
    async fn set(&self, option: &str, value: &str) -> Result<(), ControlError> {
        self.run(&["set", option, value]).await.map(|_| ())
    }

    async fn disconnect(&self) -> Result<(), ControlError> {
        self.run(&["disconnect"]).await.map(|_| ())
    }

    async fn connect(&self, location: &Location, group: &str) -> Result<String, ControlError> {
        self.run(&["connect", location.as_str(), "--group", group])
            .await
    }

    async fn status(&self) -> Result<String, ControlError> {
        self.run(&["status"]).await
    }

    async fn settings(&self) -> Result<String, ControlError> {
        self.run(&["settings"]).await
    }

    async fn refresh_meshnet_peers(&self) -> Result<(), ControlError> {
        self.run(&["meshnet", "peer", "refresh"]).await.map(|_| ())
    }
}
