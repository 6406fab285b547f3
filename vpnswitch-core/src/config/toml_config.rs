//! TOML configuration file I/O
//!
//! Handles loading and saving the daemon configuration to/from TOML files
//! in the user's configuration directory.

use crate::config::SwitcherConfig;
use crate::error::{ConfigError, Result, SwitchError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default configuration file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Get the default configuration directory
///
/// Returns ~/.config/vpnswitch, or VPNSWITCH_CONFIG_DIR if set
pub fn get_config_dir() -> Result<PathBuf> {
    if let Ok(config_dir) = std::env::var("VPNSWITCH_CONFIG_DIR") {
        return Ok(PathBuf::from(config_dir));
    }

    let home = std::env::var("HOME").map_err(|_| {
        SwitchError::Config(ConfigError::IoError {
            message: "HOME environment variable not set".to_string(),
        })
    })?;

    Ok(PathBuf::from(home).join(".config").join("vpnswitch"))
}

/// Get the default configuration file path
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load configuration from `path`, or the default location when `None`
///
/// A missing file at the default location yields the built-in defaults;
/// a missing file that was asked for explicitly is an error.
pub fn load_config(path: Option<&Path>) -> Result<SwitcherConfig> {
    match path {
        Some(path) => load_config_from_path(path),
        None => {
            let default_path = get_config_path()?;
            if default_path.exists() {
                load_config_from_path(&default_path)
            } else {
                debug!(
                    "No configuration at {}, using defaults",
                    default_path.display()
                );
                Ok(SwitcherConfig::default())
            }
        }
    }
}

/// Load configuration from a specific TOML file
pub fn load_config_from_path<P: AsRef<Path>>(path: P) -> Result<SwitcherConfig> {
    let contents = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SwitchError::Config(ConfigError::LoadFailed {
            path: path.as_ref().to_string_lossy().to_string(),
        }),
        _ => SwitchError::Config(ConfigError::IoError {
            message: format!("Failed to read config file: {}", e),
        }),
    })?;

    let config: SwitcherConfig = toml::from_str(&contents)?;

    config
        .validate()
        .map_err(|message| SwitchError::Config(ConfigError::ValidationError { message }))?;

    info!(
        "Loaded configuration from {}: rotation={}-{}s (±{}%), backoff={}s..{}s, {} startup settings",
        path.as_ref().display(),
        config.rotation.min_interval_secs,
        config.rotation.max_interval_secs,
        config.rotation.jitter_percent,
        config.backoff.base_secs,
        config.backoff.max_secs,
        config.settings.apply.len()
    );

    Ok(config)
}

/// Save configuration to a specific TOML file
pub fn save_config_to_path<P: AsRef<Path>>(
    config: &SwitcherConfig,
    path: P,
) -> Result<()> {
    config
        .validate()
        .map_err(|message| SwitchError::Config(ConfigError::ValidationError { message }))?;

    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            SwitchError::Config(ConfigError::IoError {
                message: format!("Failed to create config directory: {}", e),
            })
        })?;
    }

    let contents = toml::to_string_pretty(config)?;

    std::fs::write(&path, contents).map_err(|_| {
        SwitchError::Config(ConfigError::SaveFailed {
            path: path.as_ref().to_string_lossy().to_string(),
        })
    })?;

    info!("Saved configuration to {:?}", path.as_ref());
    Ok(())
}
