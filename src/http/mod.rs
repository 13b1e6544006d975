//! HTTP surface of the converter.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → server.rs (Axum router, timeout + trace layers)
//!     → target extraction (path with leading slash removed, plus query)
//!     → subscription::Converter::process
//!     → 200 text/plain payload, or error kind mapped to 400/502/500
//! ```

pub mod server;

pub use server::{AppState, HttpServer};
