//! Upstream document reading and structural extraction.
//!
//! # Responsibilities
//! - Accumulate the response body under a hard byte budget
//! - Locate the top-level `proxies` sequence
//! - Hand each sequence element to record normalization
//!
//! # Design Decisions
//! - Exceeding the budget is a hard failure, never a silent truncation: a
//!   cut-off document must not round-trip into a plausible-looking payload
//! - Structural problems (wrong shapes, unparseable values) fail the whole
//!   request; there is no best-effort output for a document we cannot trust

use futures_util::{pin_mut, Stream, StreamExt};
use serde_yaml::Value;

use crate::subscription::error::ConvertError;
use crate::subscription::record::ProxyRecord;

/// Default cap on the upstream document size.
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 1 << 20; // 1 MiB

/// Collects the body stream into memory, failing as soon as the accumulated
/// size would exceed `max_bytes`.
pub async fn read_bounded<S, B, E>(stream: S, max_bytes: usize) -> Result<Vec<u8>, ConvertError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    pin_mut!(stream);
    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| ConvertError::Fetch(format!("reading body: {err}")))?;
        let chunk = chunk.as_ref();
        if body.len() + chunk.len() > max_bytes {
            return Err(ConvertError::DocumentTooLarge(max_bytes));
        }
        body.extend_from_slice(chunk);
    }
    Ok(body)
}

/// Parses the document and normalizes every element of the top-level
/// `proxies` sequence.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<ProxyRecord>, ConvertError> {
    if bytes.is_empty() {
        return Err(ConvertError::UpstreamEmpty);
    }

    let document: Value =
        serde_yaml::from_slice(bytes).map_err(|err| ConvertError::malformed(err.to_string()))?;
    if document.is_null() {
        // Whitespace or comments only; same as an immediately-empty body.
        return Err(ConvertError::UpstreamEmpty);
    }
    if !document.is_mapping() {
        return Err(ConvertError::malformed("document root is not a mapping"));
    }

    let proxies = document
        .get("proxies")
        .ok_or_else(|| ConvertError::malformed("missing `proxies` key"))?;
    let entries = proxies
        .as_sequence()
        .ok_or_else(|| ConvertError::malformed("`proxies` must be a sequence"))?;

    entries
        .iter()
        .map(|entry| {
            let mapping = entry
                .as_mapping()
                .ok_or_else(|| ConvertError::malformed("proxy entry is not a mapping"))?;
            ProxyRecord::from_mapping(mapping)
        })
        .collect()
}
