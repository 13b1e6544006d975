//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! SIGINT / SIGTERM (signals.rs)
//!     → Shutdown::trigger (shutdown.rs)
//!     → every subscriber drains and exits
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
