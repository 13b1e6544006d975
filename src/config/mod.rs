//! Runtime configuration.
//!
//! Flags are parsed by clap; a few environment variables override flags to
//! match the deployment contract (`PORT`, `DNS_SERVER`,
//! `MAX_DOCUMENT_BYTES`). All settings are validated before startup and
//! every problem is reported at once.

pub mod schema;
pub mod validation;

pub use schema::{Cli, Settings};
pub use validation::ValidationError;
