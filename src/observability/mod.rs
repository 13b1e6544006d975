//! Observability subsystem.
//!
//! Logging only: this service's operational surface is its structured log
//! stream (request outcomes, dropped entries, upstream failures).

pub mod logging;

pub use logging::init_logging;
