// src/endpoint.rs

use crate::config::Config;

/// WS-Management service path on the target.
pub const WSMAN_PATH: &str = "/wsman";

/// Build `<scheme>://<host>:<port>/wsman` from the configuration.
///
/// No reachability checks happen here; a missing host yields an empty host
/// segment and the failure surfaces at connect time.
pub fn endpoint_url(config: &Config) -> String {
    let scheme = if config.use_https { "https" } else { "http" };
    let host = config.host.as_deref().unwrap_or_default();
    format!("{scheme}://{host}:{}{WSMAN_PATH}", config.port)
}
