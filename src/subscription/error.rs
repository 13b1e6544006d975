//! Error taxonomy for the conversion pipeline.
//!
//! Every failure a request can surface is one of three kinds: the caller sent
//! a bad target (`InvalidInput`), the upstream document or its fetch was bad
//! (`Upstream`), or the service itself misbehaved (`Internal`). The HTTP
//! layer maps kinds to status codes; the variants carry the operator-facing
//! detail.

use thiserror::Error;

/// Classification of a [`ConvertError`], used for HTTP status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied invalid parameters.
    InvalidInput,
    /// A failure while interacting with external systems.
    Upstream,
    /// A defect in the service itself; should not occur.
    Internal,
}

/// Error type for [`Converter::process`](crate::subscription::Converter::process).
///
/// `Clone` is required: one in-flight computation produces one outcome that
/// is handed verbatim to every coalesced waiter.
#[derive(Debug, Clone, Error)]
pub enum ConvertError {
    /// The target URL was empty after trimming.
    #[error("empty target URL")]
    EmptyTarget,

    /// The target URL did not parse.
    #[error("target URL: {0}")]
    MalformedTarget(String),

    /// The target URL scheme is not http/https.
    #[error("unsupported scheme {0:?}")]
    UnsupportedScheme(String),

    /// The outbound request failed at the transport level.
    #[error("fetch upstream failed: {0}")]
    Fetch(String),

    /// The upstream answered with a non-200 status.
    #[error("upstream returned {0}")]
    UpstreamStatus(u16),

    /// The upstream body was empty.
    #[error("upstream empty")]
    UpstreamEmpty,

    /// The upstream body exceeded the configured byte budget.
    #[error("upstream document exceeds {0} bytes")]
    DocumentTooLarge(usize),

    /// The document structure or a field value could not be understood.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// Hostname resolution for a proxy entry failed.
    #[error("dns lookup for host {host} failed: {reason}")]
    Resolve { host: String, reason: String },

    /// Every entry was dropped by validation.
    #[error("no valid proxies found")]
    NoValidProxies,

    /// The shared in-flight computation vanished without publishing a result.
    #[error("in-flight fetch terminated without a result")]
    FlightLost,
}

impl ConvertError {
    /// Creates a malformed-document error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Classifies this error for status mapping.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyTarget | Self::MalformedTarget(_) | Self::UnsupportedScheme(_) => {
                ErrorKind::InvalidInput
            }
            Self::Fetch(_)
            | Self::UpstreamStatus(_)
            | Self::UpstreamEmpty
            | Self::DocumentTooLarge(_)
            | Self::Malformed(_)
            | Self::Resolve { .. }
            | Self::NoValidProxies => ErrorKind::Upstream,
            Self::FlightLost => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_classify_variants() {
        assert_eq!(ConvertError::EmptyTarget.kind(), ErrorKind::InvalidInput);
        assert_eq!(
            ConvertError::UnsupportedScheme("ftp".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(ConvertError::UpstreamStatus(404).kind(), ErrorKind::Upstream);
        assert_eq!(ConvertError::NoValidProxies.kind(), ErrorKind::Upstream);
        assert_eq!(ConvertError::FlightLost.kind(), ErrorKind::Internal);
    }

    #[test]
    fn display_carries_detail() {
        let err = ConvertError::Resolve {
            host: "proxy.example".into(),
            reason: "timed out".into(),
        };
        assert!(err.to_string().contains("proxy.example"));
        assert!(ConvertError::DocumentTooLarge(1024)
            .to_string()
            .contains("1024"));
    }
}
