//! The fetch-and-transform pipeline.
//!
//! # Data Flow
//! ```text
//! service.rs (Converter)
//!     → coalesce.rs (one in-flight fetch per target URL)
//!     → document.rs (bounded read, locate `proxies` sequence)
//!     → record.rs (per-entry field coercion)
//!     → uri.rs (filter invalid entries, render https lines)
//!     → encode.rs (newline join, base64)
//! ```
//!
//! Structural and coercion problems fail the whole request; per-entry
//! validation problems drop the entry with a logged reason and continue.
//! That split is deliberate and load-bearing: a malformed document means the
//! upstream cannot be trusted, while one incomplete entry is routine.

pub mod coalesce;
pub mod document;
pub mod encode;
pub mod error;
pub mod record;
pub mod service;
pub mod uri;

pub use coalesce::FlightGroup;
pub use error::{ConvertError, ErrorKind};
pub use record::ProxyRecord;
pub use service::{Converter, PipelineConfig};
