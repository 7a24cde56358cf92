use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::geo::StaticGeoTable;
use crate::security::{ForwardingHeader, ProxyAllowlist, default_forwarding_headers};

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_TIMEZONE: &str = "UTC";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub geo: GeoConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProxyConfig {
    /// Forwarding headers in priority order.
    #[serde(default = "default_forwarding_headers")]
    pub headers: Vec<ForwardingHeader>,
    pub allowed_proxy_ips: Option<Vec<String>>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            headers: default_forwarding_headers(),
            allowed_proxy_ips: None,
        }
    }
}

impl ProxyConfig {
    /// `None` when every peer may set forwarding headers.
    pub fn allowlist(&self) -> Result<Option<ProxyAllowlist>> {
        self.allowed_proxy_ips
            .as_deref()
            .map(ProxyAllowlist::parse)
            .transpose()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeoConfig {
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
    #[serde(default)]
    pub regions: Vec<RegionConfig>,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            default_timezone: default_timezone(),
            regions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionConfig {
    /// CIDR network, e.g. `93.180.0.0/16`.
    pub network: String,
    pub timezone: String,
    pub country_code: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

impl Config {
    /// Normalizes header names and checks every entry that is parsed later.
    fn validate(mut self) -> Result<Self> {
        for header in &mut self.proxy.headers {
            let name = header.name.trim().to_ascii_lowercase();
            if name.is_empty() {
                return Err(anyhow!("Empty header name in proxy.headers"));
            }
            http::HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("Invalid header name in proxy.headers: {name}"))?;
            header.name = name;
        }

        if self.geo.default_timezone.trim().is_empty() {
            return Err(anyhow!("geo.default_timezone must not be empty"));
        }

        self.proxy
            .allowlist()
            .context("Invalid proxy.allowed_proxy_ips")?;
        StaticGeoTable::from_config(&self.geo).context("Invalid geo.regions")?;

        Ok(self)
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config =
        toml::from_str(content).context("Failed to parse configuration as valid TOML")?;
    config.validate()
}

pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Invalid configuration in {}", path.display()))
}
