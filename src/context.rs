use anyhow::Result;
use std::net::IpAddr;
use tracing::debug;

use crate::address::{AddressKind, validate};
use crate::config::Config;
use crate::geo::{GeoLocator, Location};
use crate::locality::{Locality, is_local};
use crate::security::{
    ForwardingHeader, HeaderLookup, ProxyAllowlist, extract_client_address, is_proxy_ip_allowed,
};

/// Per-request view of where the client is, computed once by
/// [`TimezoneResolver::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    client_address: String,
    kind: AddressKind,
    locality: Option<Locality>,
    location: Option<Location>,
    timezone: String,
}

impl RequestContext {
    #[must_use]
    pub fn client_address(&self) -> &str {
        &self.client_address
    }

    #[must_use]
    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    /// `None` when the client address was not a valid address.
    #[must_use]
    pub fn locality(&self) -> Option<Locality> {
        self.locality
    }

    #[must_use]
    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// The located zone, or the configured default.
    #[must_use]
    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    #[must_use]
    pub fn is_geolocated(&self) -> bool {
        self.location.is_some()
    }
}

pub struct TimezoneResolver<G> {
    headers: Vec<ForwardingHeader>,
    allowed_proxies: Option<ProxyAllowlist>,
    default_timezone: String,
    locator: G,
}

impl<G: GeoLocator> TimezoneResolver<G> {
    pub fn new(config: &Config, locator: G) -> Result<Self> {
        Ok(Self {
            headers: config.proxy.headers.clone(),
            allowed_proxies: config.proxy.allowlist()?,
            default_timezone: config.geo.default_timezone.clone(),
            locator,
        })
    }

    #[must_use]
    pub fn locator(&self) -> &G {
        &self.locator
    }

    /// Runs extract, validate, classify and, for public addresses, locate.
    ///
    /// Forwarding headers are only read when `direct_address` is an allowed
    /// proxy. Never fails: anything unusable yields the default timezone.
    #[tracing::instrument(skip(self, headers))]
    pub fn resolve<H: HeaderLookup + ?Sized>(
        &self,
        headers: &H,
        direct_address: &str,
    ) -> RequestContext {
        let client_address = if self.trusts(direct_address) {
            extract_client_address(headers, &self.headers, direct_address)
        } else {
            debug!("Ignoring forwarding headers from untrusted peer");
            direct_address.trim().to_string()
        };

        let kind = validate(&client_address);
        if !kind.is_valid() {
            debug!(client_addr = %client_address, "No usable client address");
            return self.context(client_address, kind, None, None);
        }

        let locality = is_local(&client_address, kind);
        if locality.is_local() {
            debug!(client_addr = %client_address, %kind, "Local client, skipping geolocation");
            return self.context(client_address, kind, Some(locality), None);
        }

        // Dual-stack listeners report IPv4 peers as `::ffff:a.b.c.d`.
        let location = match client_address.parse::<IpAddr>() {
            Ok(ip) => self.locator.locate(ip.to_canonical()),
            Err(_) => {
                // Accepted by the validator but not by std, e.g. zero-padded octets.
                debug!(client_addr = %client_address, %kind, "Address not understood by lookup");
                None
            }
        };

        match &location {
            Some(found) => {
                debug!(
                    client_addr = %client_address,
                    %kind,
                    timezone = %found.timezone,
                    "Client located"
                );
            }
            None => {
                debug!(client_addr = %client_address, %kind, "Client not found in geolocation data");
            }
        }

        self.context(client_address, kind, Some(locality), location)
    }

    fn trusts(&self, direct_address: &str) -> bool {
        match direct_address.trim().parse::<IpAddr>() {
            Ok(peer) => {
                is_proxy_ip_allowed(peer.to_canonical(), self.allowed_proxies.as_ref())
            }
            Err(_) => self.allowed_proxies.is_none(),
        }
    }

    fn context(
        &self,
        client_address: String,
        kind: AddressKind,
        locality: Option<Locality>,
        location: Option<Location>,
    ) -> RequestContext {
        let timezone = location
            .as_ref()
            .map_or_else(|| self.default_timezone.clone(), |found| found.timezone.clone());
        RequestContext {
            client_address,
            kind,
            locality,
            location,
            timezone,
        }
    }
}
