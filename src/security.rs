use anyhow::{Result, anyhow};
use http::HeaderMap;
use ipnet::IpNet;
use serde::Deserialize;
use std::{collections::HashMap, hash::BuildHasher, net::IpAddr};

/// Case-insensitive access to a request's header fields.
pub trait HeaderLookup {
    /// Value of `name`, or `None` when absent or not representable as text.
    fn header(&self, name: &str) -> Option<&str>;
}

impl HeaderLookup for HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|value| value.to_str().ok())
    }
}

/// An exact key wins; otherwise the case-insensitive match that sorts first,
/// so the result does not depend on hash order.
impl<S: BuildHasher> HeaderLookup for HashMap<String, String, S> {
    fn header(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.get(name) {
            return Some(value.as_str());
        }
        self.iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, value)| value.as_str())
    }
}

/// A proxy header consulted when recovering the client address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForwardingHeader {
    pub name: String,
    /// Value is a comma-separated chain, client first (`X-Forwarded-For`).
    #[serde(default)]
    pub list: bool,
}

impl ForwardingHeader {
    #[must_use]
    pub fn single(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            list: false,
        }
    }

    #[must_use]
    pub fn list(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            list: true,
        }
    }

    /// Client address carried by this header's raw `value`, if any.
    #[must_use]
    pub fn candidate(&self, value: &str) -> Option<String> {
        if self.list {
            parse_original_client_ip(value)
        } else {
            Some(value.trim().to_string()).filter(|ip| !ip.is_empty())
        }
    }
}

/// `X-Forwarded-For`, then `X-Real-IP`.
#[must_use]
pub fn default_forwarding_headers() -> Vec<ForwardingHeader> {
    vec![
        ForwardingHeader::list("x-forwarded-for"),
        ForwardingHeader::single("x-real-ip"),
    ]
}

/// Parses the original client IP from X-Forwarded-For header
/// Format: "client, proxy1, proxy2, ..." - returns the leftmost (original client) IP
#[must_use]
pub fn parse_original_client_ip(xff_header: &str) -> Option<String> {
    xff_header
        .split(',')
        .next()
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

/// Recovers the originating client address of a request.
///
/// Headers are tried in `priority` order and the first non-empty candidate
/// wins; otherwise the direct connection address is returned, trimmed. The
/// result is not validated and may be empty.
#[must_use]
pub fn extract_client_address<H: HeaderLookup + ?Sized>(
    headers: &H,
    priority: &[ForwardingHeader],
    direct_address: &str,
) -> String {
    priority
        .iter()
        .find_map(|forwarding| {
            headers
                .header(&forwarding.name)
                .and_then(|value| forwarding.candidate(value))
        })
        .unwrap_or_else(|| direct_address.trim().to_string())
}

/// Peers whose forwarding headers are trusted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyAllowlist {
    networks: Vec<IpNet>,
}

impl ProxyAllowlist {
    /// Parses entries that are either a single IP address or a CIDR subnet.
    pub fn parse<T: AsRef<str>>(entries: &[T]) -> Result<Self> {
        let networks = entries
            .iter()
            .map(|entry| parse_allowlist_entry(entry.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { networks })
    }

    #[must_use]
    pub fn contains(&self, ip: IpAddr) -> bool {
        self.networks.iter().any(|net| net.contains(&ip))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

fn parse_allowlist_entry(entry: &str) -> Result<IpNet> {
    let entry = entry.trim();
    // Try parsing as individual IP address first
    if let Ok(ip) = entry.parse::<IpAddr>() {
        let host_prefix = if ip.is_ipv4() { 32 } else { 128 };
        return IpNet::new(ip, host_prefix)
            .map_err(|e| anyhow!("Invalid host prefix for {entry}: {e}"));
    }
    entry
        .parse::<IpNet>()
        .map_err(|_| anyhow!("Invalid IP address or CIDR in allowed_proxy_ips: {entry}"))
}

/// Checks if a proxy IP address is allowed based on the configured allowlist
/// Returns true if no allowlist is configured (allow all) or if IP matches any entry
#[must_use]
pub fn is_proxy_ip_allowed(proxy_ip: IpAddr, allowed: Option<&ProxyAllowlist>) -> bool {
    allowed.is_none_or(|allowlist| allowlist.contains(proxy_ip))
}
