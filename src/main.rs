//! vpnswitch - NordVPN rotation daemon
//!
//! Keeps a VPN tunnel established through the vendor's command-line client
//! and periodically rotates its exit country on a randomized schedule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use vpnswitch_core::{error::SwitchError, init_logging};

mod cli;
mod daemon;

#[derive(Parser)]
#[command(name = "vpnswitch")]
#[command(version, about = "Rotate a NordVPN connection between P2P locations")]
struct Cli {
    /// Configuration file (default: ~/.config/vpnswitch/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply startup settings and rotate locations until stopped
    Run {
        /// Detach from the terminal and write a PID file
        #[arg(long)]
        daemon: bool,

        /// PID file used with --daemon
        #[arg(long, value_name = "PATH")]
        pid_file: Option<PathBuf>,
    },
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Apply startup settings once and exit
    Configure,
    /// List the locations rotation draws from
    Locations {
        /// Print a JSON array instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show VPN and daemon status
    Status,
    /// Stop a daemon started with `run --daemon`
    Stop {
        /// PID file of the daemon to stop
        #[arg(long, value_name = "PATH")]
        pid_file: Option<PathBuf>,
    },
}

fn main() {
    // Initialize logging
    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(2);
    }

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Run { daemon, pid_file } => cli::run::run_service(config, daemon, pid_file),
        Commands::Init { force } => cli::init::run_init(config, force),
        Commands::Configure => cli::configure::run_configure(config),
        Commands::Locations { json } => cli::locations::run_locations(config, json),
        Commands::Status => cli::status::run_status(config),
        Commands::Stop { pid_file } => cli::run::run_stop(pid_file),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            let exit_code = match e {
                // Configuration and startup errors (exit code 2)
                SwitchError::Config(_) | SwitchError::Toml(_) | SwitchError::TomlSerialize(_) => 2,
                SwitchError::Fatal(_) => 2,
                // Runtime errors (exit code 1)
                SwitchError::Control(_) | SwitchError::Daemon { .. } | SwitchError::Io(_) => 1,
            };

            eprintln!("{}", e);
            std::process::exit(exit_code);
        }
    }
}
