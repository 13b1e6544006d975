//! Settings validation.

use thiserror::Error;

use crate::config::schema::Settings;

/// A single configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// `PORT` override was not a valid port number.
    #[error("invalid port: {0}")]
    InvalidPort(String),

    /// `MAX_DOCUMENT_BYTES` override was not a valid byte count.
    #[error("invalid max document bytes: {0}")]
    InvalidMaxDocumentBytes(String),

    /// The DNS server is not an IP literal with an optional port.
    #[error("invalid DNS server {0:?}: expected IP[:port]")]
    InvalidDnsServer(String),

    /// A zero document budget would reject every upstream.
    #[error("max document bytes must be greater than zero")]
    ZeroDocumentBudget,

    /// A zero timeout would fail every request.
    #[error("timeouts must be greater than zero")]
    ZeroTimeout,
}

/// Checks cross-field constraints, appending every problem found.
pub(crate) fn collect(settings: &Settings, errors: &mut Vec<ValidationError>) {
    if settings.max_document_bytes == 0 {
        errors.push(ValidationError::ZeroDocumentBudget);
    }
    if settings.request_timeout.is_zero() || settings.upstream_timeout.is_zero() {
        errors.push(ValidationError::ZeroTimeout);
    }
}
