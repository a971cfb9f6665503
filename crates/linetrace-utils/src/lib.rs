//! # linetrace utilities
//!
//! Shared logging setup for the linetrace workspace.
//!
//! The library crate only emits `tracing` events; binaries embedding it call
//! [`init_logging`] once to decide where those events go.

pub mod logging;

// Re-export commonly used logging items for convenience
pub use logging::{init_logging, LogFormat, LogLevel, LoggingConfig, LoggingError, LoggingGuard};
pub use tracing::{debug, error, info, trace, warn};
