use std::{fmt, net::Ipv6Addr};
use tracing::warn;

use crate::address::AddressKind;

pub const IPV4_LOOPBACK: &str = "127.0.0.1";

/// Whether a validated address designates the local host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locality {
    Local,
    NotLocal,
}

impl Locality {
    #[must_use]
    pub fn is_local(self) -> bool {
        matches!(self, Self::Local)
    }
}

impl fmt::Display for Locality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::NotLocal => "not-local",
        })
    }
}

/// Classifies a token already validated as `kind`.
///
/// IPv4 is local only for the literal `127.0.0.1`. IPv6 is local for any
/// spelling of `::1`, including `0:0:0:0:0:0:0:1`. An `Invalid` kind is a
/// caller bug; it is logged and answered with `NotLocal`.
#[must_use]
pub fn is_local(token: &str, kind: AddressKind) -> Locality {
    let local = match kind {
        AddressKind::Ipv4 => token == IPV4_LOOPBACK,
        AddressKind::Ipv6 => token
            .parse::<Ipv6Addr>()
            .is_ok_and(|addr| addr == Ipv6Addr::LOCALHOST),
        AddressKind::Invalid => {
            warn!(token = %token, "Locality requested for an invalid address");
            false
        }
    };

    if local {
        Locality::Local
    } else {
        Locality::NotLocal
    }
}
