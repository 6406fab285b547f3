//! Detached daemon support
//!
//! PID file management and lifecycle of a `vpnswitch run --daemon` process.

pub mod process;

pub use process::{get_default_pid_file, DaemonProcess};
