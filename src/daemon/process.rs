//! Daemon process management
//!
//! Handles detaching the rotation service, PID file management, and
//! stopping a detached instance.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use daemonize::Daemonize;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::{info, warn};

use vpnswitch_core::error::{Result, SwitchError};

/// How long `stop` waits for a graceful exit before SIGKILL
///
/// Covers the final disconnect, which is bounded by the command timeout.
const STOP_GRACE_PERIOD: Duration = Duration::from_secs(35);

fn daemon_error(reason: String) -> SwitchError {
    SwitchError::Daemon { reason }
}

/// A daemon identified by its PID file
pub struct DaemonProcess {
    pid_file: PathBuf,
}

impl DaemonProcess {
    /// Create a new daemon process manager
    pub fn new(pid_file: PathBuf) -> Self {
        Self { pid_file }
    }

    /// Check if a daemon is already running
    ///
    /// A PID file naming a dead process is removed.
    pub fn is_running(&self) -> Result<bool> {
        if !self.pid_file.exists() {
            return Ok(false);
        }

        let pid = self.get_pid()?;
        match kill(Pid::from_raw(pid), None) {
            Ok(_) => Ok(true),
            Err(nix::errno::Errno::ESRCH) => {
                let _ = fs::remove_file(&self.pid_file);
                Ok(false)
            }
            // Alive but owned by someone else
            Err(nix::errno::Errno::EPERM) => Ok(true),
            Err(e) => Err(daemon_error(format!(
                "Failed to check process status: {}",
                e
            ))),
        }
    }

    /// Daemonize the current process
    pub fn daemonize(&self) -> Result<()> {
        if let Some(parent) = self.pid_file.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                daemon_error(format!("Failed to create PID file directory: {}", e))
            })?;
        }

        Daemonize::new()
            .pid_file(&self.pid_file)
            .chown_pid_file(true)
            .working_directory("/")
            .umask(0o027)
            .start()
            .map_err(|e| daemon_error(format!("Failed to daemonize process: {}", e)))?;

        info!("Successfully daemonized process, PID: {}", process::id());
        Ok(())
    }

    /// Get the PID of the running daemon
    pub fn get_pid(&self) -> Result<i32> {
        let pid_content = fs::read_to_string(&self.pid_file).map_err(|e| {
            daemon_error(format!(
                "Failed to read PID file {}: {}",
                self.pid_file.display(),
                e
            ))
        })?;

        pid_content
            .trim()
            .parse()
            .map_err(|_| daemon_error("Invalid PID in PID file".to_string()))
    }

    /// Stop the daemon, escalating to SIGKILL after the grace period
    pub fn stop(&self) -> Result<()> {
        if !self.is_running()? {
            return Err(daemon_error(format!(
                "No running daemon found for {}",
                self.pid_file.display()
            )));
        }

        let pid = Pid::from_raw(self.get_pid()?);
        kill(pid, Signal::SIGTERM)
            .map_err(|e| daemon_error(format!("Failed to send SIGTERM to daemon: {}", e)))?;
        info!("Sent SIGTERM to daemon {}", pid);

        let poll = Duration::from_millis(500);
        let mut waited = Duration::ZERO;
        while waited < STOP_GRACE_PERIOD {
            std::thread::sleep(poll);
            waited += poll;
            if kill(pid, None).is_err() {
                info!("Daemon {} stopped", pid);
                let _ = fs::remove_file(&self.pid_file);
                return Ok(());
            }
        }

        warn!("Daemon {} did not stop within {:?}, sending SIGKILL", pid, STOP_GRACE_PERIOD);
        kill(pid, Signal::SIGKILL)
            .map_err(|e| daemon_error(format!("Failed to send SIGKILL to daemon: {}", e)))?;
        let _ = fs::remove_file(&self.pid_file);
        Ok(())
    }
}

impl Drop for DaemonProcess {
    fn drop(&mut self) {
        // Only the daemon itself cleans up its PID file
        if matches!(self.get_pid(), Ok(pid) if pid as u32 == process::id()) {
            let _ = fs::remove_file(&self.pid_file);
        }
    }
}

/// Get the default PID file path
pub fn get_default_pid_file() -> PathBuf {
    // Use XDG_RUNTIME_DIR if available, otherwise /tmp
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        Path::new(&runtime_dir).join("vpnswitch.pid")
    } else {
        Path::new("/tmp").join(format!("vpnswitch-{}.pid", nix::unistd::getuid()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_pid_file_is_not_running() {
        let dir = tempdir().unwrap();
        let daemon = DaemonProcess::new(dir.path().join("vpnswitch.pid"));
        assert!(!daemon.is_running().unwrap());
    }

    #[test]
    fn test_stale_pid_file_is_removed() {
        let dir = tempdir().unwrap();
        let pid_file = dir.path().join("vpnswitch.pid");
        // Larger than any default pid_max
        fs::write(&pid_file, "99999999\n").unwrap();

        let daemon = DaemonProcess::new(pid_file.clone());
        assert!(!daemon.is_running().unwrap());
        assert!(!pid_file.exists());
    }

    #[test]
    fn test_live_pid_is_running_and_file_survives_drop() {
        let dir = tempdir().unwrap();
        let pid_file = dir.path().join("vpnswitch.pid");
        // PID 1 always exists and is never this test process
        fs::write(&pid_file, "1\n").unwrap();

        {
            let daemon = DaemonProcess::new(pid_file.clone());
            assert!(daemon.is_running().unwrap());
        }
        assert!(pid_file.exists());
    }

    #[test]
    fn test_invalid_pid_file() {
        let dir = tempdir().unwrap();
        let pid_file = dir.path().join("vpnswitch.pid");
        fs::write(&pid_file, "not-a-pid").unwrap();

        let daemon = DaemonProcess::new(pid_file);
        assert!(matches!(
            daemon.get_pid(),
            Err(SwitchError::Daemon { .. })
        ));
    }

    #[test]
    fn test_stop_without_daemon() {
        let dir = tempdir().unwrap();
        let daemon = DaemonProcess::new(dir.path().join("vpnswitch.pid"));
        assert!(daemon.stop().is_err());
    }
}
