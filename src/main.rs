use anyhow::{Result, bail};
use http::HeaderMap;
use ip_timezone::{
    StaticGeoTable, TimezoneResolver,
    config::{DEFAULT_CONFIG_FILE, load_config},
};
use std::env;
use tracing::info;

const CONFIG_ENV: &str = "IP_TIMEZONE_CONFIG";

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let addresses: Vec<String> = env::args().skip(1).collect();
    if addresses.is_empty() {
        bail!("Usage: ip-timezone <address>...");
    }

    let config_file = env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
    let config = load_config(&config_file)?;
    let table = StaticGeoTable::from_config(&config.geo)?;
    info!(
        config_file = %config_file,
        forwarding_headers = config.proxy.headers.len(),
        regions = table.len(),
        default_timezone = %config.geo.default_timezone,
        "Configuration loaded"
    );

    let resolver = TimezoneResolver::new(&config, table)?;
    let no_headers = HeaderMap::new();

    for address in &addresses {
        let context = resolver.resolve(&no_headers, address);
        let locality = context
            .locality()
            .map_or_else(|| "-".to_string(), |locality| locality.to_string());
        println!(
            "{} {} {} {}",
            context.client_address(),
            context.kind(),
            locality,
            context.timezone()
        );
    }

    Ok(())
}
