//! Client Timezone Resolution
//!
//! Recovers a client's address from proxy forwarding headers, validates it as IPv4 or IPv6,
//! skips loopback clients and looks up the timezone of everyone else.

pub mod address;
pub mod config;
pub mod context;
pub mod geo;
pub mod locality;
pub mod security;

// Re-export commonly used types and functions
pub use address::{AddressKind, Ipv6Shape, ipv6_shapes, is_valid, validate};
pub use config::{Config, GeoConfig, ProxyConfig, RegionConfig, load_config, parse_config};
pub use context::{RequestContext, TimezoneResolver};
pub use geo::{GeoLocator, Location, StaticGeoTable};
pub use locality::{Locality, is_local};
pub use security::{
    ForwardingHeader, HeaderLookup, ProxyAllowlist, extract_client_address, is_proxy_ip_allowed,
    parse_original_client_ip,
};
