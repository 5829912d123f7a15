//! Public IP detection.

use crate::error::{DdnsError, Result};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Longest echo payload we repeat back in a format error.
const MAX_EXCERPT_CHARS: usize = 100;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A public IPv4 address, validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedAddress(Ipv4Addr);

impl ResolvedAddress {
    /// Accept `ip` only if it is a public IPv4 address.
    pub fn new(ip: IpAddr) -> Result<Self> {
        match ip {
            IpAddr::V4(v4) if is_public_ipv4(&v4) => Ok(Self(v4)),
            other => Err(DdnsError::Validation(other.to_string())),
        }
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.0
    }
}

impl fmt::Display for ResolvedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Global unicast and outside of 10/8, 172.16/12 and 192.168/16.
pub fn is_public_ipv4(ip: &Ipv4Addr) -> bool {
    !(ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_multicast()
        || ip.is_broadcast()
        || ip.is_private())
}

/// Parse the body returned by an echo server.
pub fn parse_echo_response(body: &str) -> Result<ResolvedAddress> {
    let text = body.trim();
    let ip: IpAddr = text.parse().map_err(|_| DdnsError::Format {
        excerpt: shorten(text, MAX_EXCERPT_CHARS),
    })?;
    ResolvedAddress::new(ip)
}

fn shorten(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Looks up the caller's public IPv4 address through an echo server.
pub struct IpDetector {
    client: reqwest::Client,
}

impl IpDetector {
    /// Create a detector whose HTTP client only ever connects over IPv4.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .local_address(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client })
    }

    /// Query `echo_server` once and validate its answer.
    pub async fn resolve(&self, echo_server: &str) -> Result<ResolvedAddress> {
        let response = self
            .client
            .get(echo_server)
            .send()
            .await
            .map_err(|e| DdnsError::Network(format!("error querying {}: {}", echo_server, e)))?;

        if !response.status().is_success() {
            return Err(DdnsError::Network(format!(
                "HTTP {} from {}",
                response.status(),
                echo_server
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DdnsError::Network(format!("error querying {}: {}", echo_server, e)))?;

        let address = parse_echo_response(&body)?;
        tracing::debug!("Echo server {} reported {}", echo_server, address);
        Ok(address)
    }
}
