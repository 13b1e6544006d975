//! The fetch coordinator.
//!
//! # Responsibilities
//! - Validate and normalize the caller's target URL
//! - Coalesce concurrent requests for the same target into one fetch
//! - Drive fetch → parse → normalize → resolve → filter → render → encode
//!
//! # Design Decisions
//! - The shared computation is spawned, so it survives any individual caller
//!   giving up; every waiter of a generation observes the same outcome
//! - Zero surviving entries is a failure, not an empty payload: a client
//!   must never install an empty subscription because of a bad upstream

use std::sync::Arc;

use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use crate::resolver::{self, LookupHost};
use crate::subscription::coalesce::FlightGroup;
use crate::subscription::document;
use crate::subscription::encode;
use crate::subscription::error::ConvertError;
use crate::subscription::uri;

/// Pipeline tuning owned by the CLI layer.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Cap on the upstream document size in bytes.
    pub max_document_bytes: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: document::DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}

type Outcome = Result<Arc<str>, ConvertError>;

/// Converts upstream proxy documents into encoded subscription payloads.
///
/// When `lookup` is present the service runs in resolving mode: server
/// hostnames are replaced by IP literals and entries without an `sni` are
/// dropped. Without it, server strings pass through unchanged.
pub struct Converter {
    client: Client,
    lookup: Option<Arc<dyn LookupHost>>,
    config: PipelineConfig,
    flights: FlightGroup<Outcome>,
}

impl Converter {
    pub fn new(client: Client, lookup: Option<Arc<dyn LookupHost>>, config: PipelineConfig) -> Self {
        Self {
            client,
            lookup,
            config,
            flights: FlightGroup::new(),
        }
    }

    /// Fetches the document at `target` and returns the encoded payload.
    ///
    /// Concurrent calls carrying the same normalized target URL attach to a
    /// single in-flight fetch and receive its one outcome; once a generation
    /// completes, the next call fetches afresh.
    pub async fn process(&self, target: &str) -> Result<Arc<str>, ConvertError> {
        let target = target.trim();
        if target.is_empty() {
            return Err(ConvertError::EmptyTarget);
        }
        let url = Url::parse(target)
            .map_err(|err| ConvertError::MalformedTarget(err.to_string()))?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(ConvertError::UnsupportedScheme(other.to_owned())),
        }

        let key = url.to_string();
        let flight = {
            let client = self.client.clone();
            let lookup = self.lookup.clone();
            let config = self.config.clone();
            let url = url.clone();
            async move {
                fetch_and_convert(client, lookup, config, url)
                    .await
                    .map(Arc::from)
            }
        };
        self.flights
            .run(&key, flight)
            .await
            .ok_or(ConvertError::FlightLost)?
    }
}

async fn fetch_and_convert(
    client: Client,
    lookup: Option<Arc<dyn LookupHost>>,
    config: PipelineConfig,
    url: Url,
) -> Result<String, ConvertError> {
    debug!(target = %url, "fetching upstream document");
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|err| ConvertError::Fetch(err.to_string()))?;
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(ConvertError::UpstreamStatus(status.as_u16()));
    }

    let body =
        document::read_bounded(response.bytes_stream(), config.max_document_bytes).await?;
    let records = document::parse_records(&body)?;

    let mut lines = Vec::with_capacity(records.len());
    for record in &records {
        if !uri::admit(record, lookup.is_some()) {
            continue;
        }
        let host = match &lookup {
            Some(lookup) => resolver::resolve_host(lookup.as_ref(), &record.server)
                .await
                .map_err(|err| ConvertError::Resolve {
                    host: record.server.clone(),
                    reason: err.to_string(),
                })?,
            None => record.server.clone(),
        };
        lines.push(uri::render(record, &host));
    }
    if lines.is_empty() {
        return Err(ConvertError::NoValidProxies);
    }

    info!(
        target = %url,
        entries = records.len(),
        published = lines.len(),
        "converted subscription"
    );
    Ok(encode::encode_lines(&lines))
}
