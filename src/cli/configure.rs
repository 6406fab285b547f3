//! Apply startup settings once and exit

use std::path::Path;

use vpnswitch_core::config::toml_config::load_config;
use vpnswitch_core::error::SwitchError;

/// Run the configure command
///
/// Unlike `run`, a setting that could not be applied is reported as an
/// error so scripts can notice it.
pub fn run_configure(config_path: Option<&Path>) -> Result<(), SwitchError> {
    let config = load_config(config_path)?;
    let control = super::locate_control(&config)?;

    let runtime = super::build_runtime()?;
    runtime.block_on(super::apply_settings(control.as_ref(), &config))?;

    println!(
        "Applied {} startup settings{}",
        config.settings.apply.len(),
        if config.settings.meshnet {
            " and enabled meshnet"
        } else {
            ""
        }
    );
    Ok(())
}
