//! Settings schema and resolution.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::Parser;

use crate::config::validation::{self, ValidationError};
use crate::resolver::{parse_dns_server, DEFAULT_DNS_SERVER};
use crate::subscription::document::DEFAULT_MAX_DOCUMENT_BYTES;

/// Command-line interface.
#[derive(Debug, Parser)]
#[command(name = "subconv", about = "Proxy subscription converter", version)]
pub struct Cli {
    /// Port to listen on (the PORT environment variable overrides this).
    #[arg(short, long, default_value_t = 8000)]
    pub port: u16,

    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// Cap on the upstream document size in bytes
    /// (MAX_DOCUMENT_BYTES overrides this).
    #[arg(long, default_value_t = DEFAULT_MAX_DOCUMENT_BYTES)]
    pub max_document_bytes: usize,

    /// Resolve proxy hostnames to IP literals before rendering.
    #[arg(long)]
    pub resolve: bool,

    /// DNS server for hostname resolution, as IP[:port]
    /// (DNS_SERVER overrides this).
    #[arg(long, default_value = DEFAULT_DNS_SERVER)]
    pub dns_server: String,

    /// Inbound request budget in seconds.
    #[arg(long, default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Outbound fetch budget in seconds.
    #[arg(long, default_value_t = 20)]
    pub upstream_timeout_secs: u64,
}

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Listen address, `bind:port`.
    pub listen: String,

    /// Cap on the upstream document size in bytes.
    pub max_document_bytes: usize,

    /// Whether proxy hostnames are resolved to IP literals.
    pub resolve: bool,

    /// DNS server queried in resolving mode.
    pub dns_server: SocketAddr,

    /// Inbound request budget.
    pub request_timeout: Duration,

    /// Outbound fetch budget.
    pub upstream_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8000".to_owned(),
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            resolve: false,
            dns_server: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 53),
            request_timeout: Duration::from_secs(30),
            upstream_timeout: Duration::from_secs(20),
        }
    }
}

impl Settings {
    /// Resolves flags plus environment overrides into validated settings,
    /// reporting every problem at once.
    pub fn from_cli(cli: Cli) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let mut port = cli.port;
        if let Some(raw) = env_override("PORT") {
            match raw.parse::<u16>() {
                Ok(value) => port = value,
                Err(_) => errors.push(ValidationError::InvalidPort(raw)),
            }
        }

        let mut max_document_bytes = cli.max_document_bytes;
        if let Some(raw) = env_override("MAX_DOCUMENT_BYTES") {
            match raw.parse::<usize>() {
                Ok(value) => max_document_bytes = value,
                Err(_) => errors.push(ValidationError::InvalidMaxDocumentBytes(raw)),
            }
        }

        let raw_dns = env_override("DNS_SERVER").unwrap_or(cli.dns_server);
        let dns_server = match parse_dns_server(&raw_dns) {
            Some(addr) => addr,
            None => {
                errors.push(ValidationError::InvalidDnsServer(raw_dns));
                Settings::default().dns_server
            }
        };

        let settings = Self {
            listen: format!("{}:{}", cli.bind, port),
            max_document_bytes,
            resolve: cli.resolve,
            dns_server,
            request_timeout: Duration::from_secs(cli.request_timeout_secs),
            upstream_timeout: Duration::from_secs(cli.upstream_timeout_secs),
        };

        validation::collect(&settings, &mut errors);
        if errors.is_empty() {
            Ok(settings)
        } else {
            Err(errors)
        }
    }
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
