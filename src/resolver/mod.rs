//! Host resolution capability.
//!
//! # Responsibilities
//! - Pass IP literals through unchanged, bracketing IPv6 for authority use
//! - Look hostnames up through a configurable DNS server, bounded in time
//! - Select one address: first IPv4 in result order, else the last IPv6
//!
//! The lookup itself sits behind [`LookupHost`] so the pipeline never talks
//! to a real network in tests; [`DnsResolver`] is the production
//! implementation over hickory.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use thiserror::Error;

/// Upper bound on a single hostname lookup.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// DNS server used when no override is configured.
pub const DEFAULT_DNS_SERVER: &str = "8.8.8.8:53";

/// Failure of one host resolution.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// The DNS query itself failed.
    #[error("lookup failed: {0}")]
    Lookup(String),

    /// The query did not finish within [`LOOKUP_TIMEOUT`].
    #[error("lookup timed out")]
    TimedOut,

    /// The query succeeded but returned no usable address.
    #[error("no addresses found")]
    NoAddresses,
}

/// Minimal DNS capability consumed by the pipeline.
#[async_trait]
pub trait LookupHost: Send + Sync {
    async fn lookup_ips(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError>;
}

/// Turns a record's server field into a connectable literal.
pub async fn resolve_host(lookup: &dyn LookupHost, host: &str) -> Result<String, ResolveError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(literal(ip));
    }
    let addrs = tokio::time::timeout(LOOKUP_TIMEOUT, lookup.lookup_ips(host))
        .await
        .map_err(|_| ResolveError::TimedOut)??;
    select_address(&addrs)
        .map(literal)
        .ok_or(ResolveError::NoAddresses)
}

fn literal(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => format!("[{v6}]"),
    }
}

/// First IPv4 in result order wins; an IPv6-only result set yields the last
/// IPv6 seen.
fn select_address(addrs: &[IpAddr]) -> Option<IpAddr> {
    let mut last_v6 = None;
    for addr in addrs {
        match addr {
            IpAddr::V4(_) => return Some(*addr),
            IpAddr::V6(_) => last_v6 = Some(*addr),
        }
    }
    last_v6
}

/// Production resolver querying a single configured DNS server.
pub struct DnsResolver {
    inner: TokioAsyncResolver,
}

impl DnsResolver {
    /// Builds a resolver querying `server` over UDP with TCP fallback.
    pub fn new(server: SocketAddr) -> Self {
        let servers = NameServerConfigGroup::from_ips_clear(&[server.ip()], server.port(), true);
        let config = ResolverConfig::from_parts(None, Vec::new(), servers);
        Self {
            inner: TokioAsyncResolver::tokio(config, ResolverOpts::default()),
        }
    }
}

#[async_trait]
impl LookupHost for DnsResolver {
    async fn lookup_ips(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        let response = self
            .inner
            .lookup_ip(host)
            .await
            .map_err(|err| ResolveError::Lookup(err.to_string()))?;
        Ok(response.iter().collect())
    }
}

/// Parses a DNS server override: an IP literal with an optional port,
/// defaulting to 53. Hostnames are rejected — the resolver cannot bootstrap
/// through itself.
pub fn parse_dns_server(raw: &str) -> Option<SocketAddr> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(addr) = raw.parse::<SocketAddr>() {
        return Some(addr);
    }
    raw.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, 53))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    struct StaticLookup(Vec<IpAddr>);

    #[async_trait]
    impl LookupHost for StaticLookup {
        async fn lookup_ips(&self, _host: &str) -> Result<Vec<IpAddr>, ResolveError> {
            Ok(self.0.clone())
        }
    }

    struct NeverAnswers;

    #[async_trait]
    impl LookupHost for NeverAnswers {
        async fn lookup_ips(&self, _host: &str) -> Result<Vec<IpAddr>, ResolveError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!("lookup should have timed out first")
        }
    }

    struct RefusesLiterals;

    #[async_trait]
    impl LookupHost for RefusesLiterals {
        async fn lookup_ips(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
            panic!("literal {host} must not reach the lookup capability")
        }
    }

    fn v4(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(192, 0, 2, last))
    }

    fn v6(last: u16) -> IpAddr {
        IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, last))
    }

    #[tokio::test]
    async fn ip_literals_pass_through() {
        let lookup = RefusesLiterals;
        assert_eq!(
            resolve_host(&lookup, "192.0.2.7").await.unwrap(),
            "192.0.2.7"
        );
        assert_eq!(
            resolve_host(&lookup, "2001:db8::1").await.unwrap(),
            "[2001:db8::1]"
        );
    }

    #[tokio::test]
    async fn prefers_the_first_ipv4_result() {
        let lookup = StaticLookup(vec![v6(1), v4(10), v4(20), v6(2)]);
        assert_eq!(
            resolve_host(&lookup, "proxy.example").await.unwrap(),
            "192.0.2.10"
        );
    }

    #[tokio::test]
    async fn falls_back_to_the_last_ipv6() {
        let lookup = StaticLookup(vec![v6(1), v6(2), v6(3)]);
        assert_eq!(
            resolve_host(&lookup, "proxy.example").await.unwrap(),
            "[2001:db8::3]"
        );
    }

    #[tokio::test]
    async fn empty_result_set_is_an_error() {
        let lookup = StaticLookup(Vec::new());
        assert!(matches!(
            resolve_host(&lookup, "proxy.example").await.unwrap_err(),
            ResolveError::NoAddresses
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_lookups_time_out() {
        let err = resolve_host(&NeverAnswers, "proxy.example")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::TimedOut));
    }

    #[test]
    fn dns_server_override_parsing() {
        assert_eq!(
            parse_dns_server("8.8.8.8:53"),
            Some("8.8.8.8:53".parse().unwrap())
        );
        assert_eq!(
            parse_dns_server("1.1.1.1"),
            Some("1.1.1.1:53".parse().unwrap())
        );
        assert_eq!(
            parse_dns_server("[2001:4860:4860::8888]:5353"),
            Some("[2001:4860:4860::8888]:5353".parse().unwrap())
        );
        assert_eq!(
            parse_dns_server("2001:4860:4860::8888"),
            Some("[2001:4860:4860::8888]:53".parse().unwrap())
        );
        assert_eq!(parse_dns_server("dns.google"), None);
        assert_eq!(parse_dns_server("   "), None);
    }
}
