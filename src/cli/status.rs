//! Show the VPN client's status and the daemon's state

use std::path::Path;

use colored::Colorize;
use vpnswitch_core::config::toml_config::load_config;
use vpnswitch_core::error::SwitchError;
use vpnswitch_core::vpn::control::bounded;
use vpnswitch_core::vpn::{StatusMatcher, VpnControl};

use crate::daemon::{get_default_pid_file, DaemonProcess};

/// Run the status command
pub fn run_status(config_path: Option<&Path>) -> Result<(), SwitchError> {
    let config = load_config(config_path)?;
    let control = super::locate_control(&config)?;
    let matcher = StatusMatcher::new(&config.control.connected_marker);

    let runtime = super::build_runtime()?;
    let status = runtime.block_on(bounded(
        "status",
        config.control.command_timeout(),
        control.status(),
    ))?;

    println!("{}", status.trim_end());
    println!();

    if matcher.is_connected(&status) {
        println!("VPN: {}", "connected".green().bold());
    } else {
        println!(
            "VPN: {} (no \"{}\" in status)",
            "not connected".red().bold(),
            config.control.connected_marker
        );
    }

    let daemon = DaemonProcess::new(get_default_pid_file());
    if daemon.is_running()? {
        println!("Daemon: {} (PID {})", "running".green(), daemon.get_pid()?);
    } else {
        println!("Daemon: {}", "not running".yellow());
    }
    Ok(())
}
