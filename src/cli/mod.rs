//! CLI command implementations
//!
//! Each subcommand is a synchronous entry point that builds its own tokio
//! runtime, so `run --daemon` can fork before any runtime threads exist.

pub mod configure;
pub mod init;
pub mod locations;
pub mod run;
pub mod status;

use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::warn;
use vpnswitch_core::config::SwitcherConfig;
use vpnswitch_core::error::{ConfigError, SwitchError};
use vpnswitch_core::vpn::{CliControl, Configurator, VpnControl};

/// Build the multi-threaded runtime used by every command
fn build_runtime() -> Result<Runtime, SwitchError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(SwitchError::Io)
}

/// Resolve the configured control tool on `PATH`
fn locate_control(config: &SwitcherConfig) -> Result<Arc<dyn VpnControl>, SwitchError> {
    let control = CliControl::locate(&config.control.binary)?;
    Ok(Arc::new(control))
}

/// Apply the configured startup settings, logging a partial failure
async fn apply_settings(
    control: &dyn VpnControl,
    config: &SwitcherConfig,
) -> Result<(), ConfigError> {
    let configurator = Configurator::new(
        control,
        &config.settings,
        config.control.command_timeout(),
    );
    let result = configurator.apply_startup_settings().await;
    if let Err(ref e) = result {
        warn!("{}", e);
    }
    result
}
