//! Rotation service commands
//!
//! `run` configures the VPN client and drives the rotation loop until
//! SIGINT or SIGTERM; `stop` signals a detached instance.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

use vpnswitch_core::config::toml_config::load_config;
use vpnswitch_core::config::SwitcherConfig;
use vpnswitch_core::error::SwitchError;
use vpnswitch_core::vpn::shutdown::{self, ShutdownHandle};
use vpnswitch_core::vpn::{Configurator, Rotator, VpnControl};

use crate::daemon::{get_default_pid_file, DaemonProcess};

/// Run the rotation service in the foreground or as a daemon
pub fn run_service(
    config_path: Option<&Path>,
    detach: bool,
    pid_file: Option<PathBuf>,
) -> Result<(), SwitchError> {
    let config = load_config(config_path)?;
    let control = super::locate_control(&config)?;

    // Kept alive so the PID file is removed when the daemon exits
    let _daemon = if detach {
        let daemon = DaemonProcess::new(pid_file.unwrap_or_else(get_default_pid_file));
        if daemon.is_running()? {
            return Err(SwitchError::Daemon {
                reason: format!("vpnswitch is already running with PID {}", daemon.get_pid()?),
            });
        }
        println!("Starting vpnswitch in the background");
        daemon.daemonize()?;
        Some(daemon)
    } else {
        None
    };

    let runtime = super::build_runtime()?;
    runtime.block_on(rotate(control, config))
}

async fn rotate(control: Arc<dyn VpnControl>, config: SwitcherConfig) -> Result<(), SwitchError> {
    let (handle, shutdown) = shutdown::channel();
    tokio::spawn(forward_signals(handle));

    // Rotation proceeds after a partial failure. After a shutdown request
    // the rotator exits at once through its final disconnect.
    let configurator = Configurator::new(
        control.as_ref(),
        &config.settings,
        config.control.command_timeout(),
    );
    if let Some(Err(e)) = configurator.apply_until_shutdown(&mut shutdown.clone()).await {
        warn!("{}", e);
    }

    let reason = Rotator::new(control, &config).run(shutdown).await?;
    info!(?reason, "VPN rotation stopped");
    Ok(())
}

/// Trigger shutdown on the first SIGINT or SIGTERM
///
/// A signal source that cannot be registered never fires, so the handle
/// stays alive and shutdown is not requested spuriously.
async fn forward_signals(handle: ShutdownHandle) {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = interrupt => info!("Received SIGINT, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
    handle.trigger();
}

/// Stop a daemon started with `run --daemon`
pub fn run_stop(pid_file: Option<PathBuf>) -> Result<(), SwitchError> {
    let daemon = DaemonProcess::new(pid_file.unwrap_or_else(get_default_pid_file));
    let pid = daemon.get_pid().ok();
    daemon.stop()?;
    match pid {
        Some(pid) => println!("Stopped vpnswitch (PID {})", pid),
        None => println!("Stopped vpnswitch"),
    }
    Ok(())
}
