//! Write a default configuration file

use std::path::Path;

use colored::Colorize;
use vpnswitch_core::config::toml_config::{get_config_path, save_config_to_path};
use vpnswitch_core::config::SwitcherConfig;
use vpnswitch_core::error::SwitchError;

/// Run the init command
///
/// An existing file is left untouched unless `force` is set.
pub fn run_init(config_path: Option<&Path>, force: bool) -> Result<(), SwitchError> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => get_config_path()?,
    };

    if path.exists() && !force {
        println!(
            "{} Configuration already exists at {} (use --force to overwrite)",
            "!".yellow().bold(),
            path.display()
        );
        return Ok(());
    }

    save_config_to_path(&SwitcherConfig::default(), &path)?;
    println!(
        "{} Wrote default configuration to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}
