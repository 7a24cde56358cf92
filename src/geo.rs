//! Geolocation lookup.
//!
//! The resolver only talks to [`GeoLocator`]; [`StaticGeoTable`] is the
//! bundled implementation, driven by `[[geo.regions]]` in the configuration.

use anyhow::{Result, anyhow};
use ipnet::IpNet;
use std::{net::IpAddr, sync::Arc};

use crate::config::GeoConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    /// IANA zone name, e.g. `Europe/Oslo`.
    pub timezone: String,
    pub country_code: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Location {
    #[must_use]
    pub fn new(timezone: impl Into<String>) -> Self {
        Self {
            timezone: timezone.into(),
            country_code: None,
            region: None,
            city: None,
            latitude: None,
            longitude: None,
        }
    }
}

/// Looks up where a public address is.
pub trait GeoLocator {
    fn locate(&self, ip: IpAddr) -> Option<Location>;
}

impl<T: GeoLocator + ?Sized> GeoLocator for &T {
    fn locate(&self, ip: IpAddr) -> Option<Location> {
        (**self).locate(ip)
    }
}

impl<T: GeoLocator + ?Sized> GeoLocator for Arc<T> {
    fn locate(&self, ip: IpAddr) -> Option<Location> {
        (**self).locate(ip)
    }
}

/// Fixed table of networks; the most specific containing network wins.
#[derive(Debug, Clone, Default)]
pub struct StaticGeoTable {
    entries: Vec<(IpNet, Location)>,
}

impl StaticGeoTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &GeoConfig) -> Result<Self> {
        let mut table = Self::new();
        for region in &config.regions {
            let network = region.network.trim().parse::<IpNet>().map_err(|_| {
                anyhow!("Invalid CIDR network in geo.regions: {}", region.network)
            })?;
            if region.timezone.trim().is_empty() {
                return Err(anyhow!("Empty timezone for network {network}"));
            }
            table.insert(
                network,
                Location {
                    country_code: region.country_code.clone(),
                    region: region.region.clone(),
                    city: region.city.clone(),
                    latitude: region.latitude,
                    longitude: region.longitude,
                    ..Location::new(region.timezone.trim())
                },
            );
        }
        Ok(table)
    }

    pub fn insert(&mut self, network: IpNet, location: Location) {
        self.entries.push((network.trunc(), location));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl GeoLocator for StaticGeoTable {
    fn locate(&self, ip: IpAddr) -> Option<Location> {
        self.entries
            .iter()
            .filter(|(network, _)| network.contains(&ip))
            // Equal prefixes keep the earliest entry.
            .rev()
            .max_by_key(|(network, _)| network.prefix_len())
            .map(|(_, location)| location.clone())
    }
}
