//! Logging utilities.
//!
//! Centralizes logger initialization. Everything else in the engine logs
//! through the standard `log` facade; recoverable effect conditions
//! (rejected scripts, unresolved targets, unbound semantics) are warnings,
//! never errors.

mod init;

pub use init::{LoggingConfig, init_logging};
