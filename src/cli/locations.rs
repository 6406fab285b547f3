//! Print the effective location catalog

use std::path::Path;

use colored::Colorize;
use vpnswitch_core::config::toml_config::load_config;
use vpnswitch_core::error::SwitchError;
use vpnswitch_core::types::Location;

/// Run the locations command
pub fn run_locations(config_path: Option<&Path>, json: bool) -> Result<(), SwitchError> {
    let config = load_config(config_path)?;
    let catalog = config.catalog();

    if json {
        let locations: Vec<&Location> = catalog.iter().collect();
        let output = serde_json::to_string(&locations).map_err(std::io::Error::from)?;
        println!("{}", output);
        return Ok(());
    }

    let source = if config.locations.is_some() {
        "configured"
    } else {
        "built-in P2P"
    };
    println!(
        "{} {} locations",
        catalog.len().to_string().bold(),
        source
    );

    let codes: Vec<&str> = catalog.iter().map(Location::as_str).collect();
    for row in codes.chunks(13) {
        println!("  {}", row.join(" "));
    }

    if catalog.is_empty() {
        println!("{}", "Rotation cannot start with an empty catalog".red());
    }
    Ok(())
}
