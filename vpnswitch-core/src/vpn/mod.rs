//! VPN rotation module
//!
//! Control-tool integration, startup configuration and the rotation state
//! machine.

pub mod cli_control;
pub mod connection_event;
pub mod control;
pub mod status;

// Lifecycle
pub mod configurator;
pub mod policy;
pub mod rotator;
pub mod shutdown;
pub mod state;

// Public re-exports
pub use cli_control::CliControl;
pub use configurator::Configurator;
pub use connection_event::{AttemptError, AttemptOutcome, ConnectionAttempt, RotationEvent};
pub use control::VpnControl;
pub use rotator::{Rotator, StopReason};
pub use status::StatusMatcher;
