use serde::Deserialize;
use std::net::SocketAddr;

/// Main configuration structure
///
/// Every field has a default, so an empty config file (or no file at all)
/// yields a runnable local setup. Environment variables override file values,
/// see `loader::load`.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Address and port to listen on
    /// Example: "0.0.0.0:8082" or "127.0.0.1:8082"
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    /// Base URL of the core (bulk RNG) service
    #[serde(default = "default_core_url")]
    pub core_url: String,
    /// Base URL of the VRF service
    #[serde(default = "default_vrf_url")]
    pub vrf_url: String,
    /// API key external callers must present (header `X-API-Key` or
    /// query `api_key`)
    #[serde(default = "default_public_api_key")]
    pub public_api_key: String,
    /// Credential sent to the upstream services
    /// If not set, the public API key is reused
    #[serde(default)]
    pub internal_api_key: Option<String>,
    /// Version string reported by `/v1/meta`
    #[serde(default = "default_gateway_version")]
    pub gateway_version: String,
    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Config {
    /// Credential used against the upstream services.
    pub fn internal_api_key(&self) -> &str {
        self.internal_api_key
            .as_deref()
            .unwrap_or(&self.public_api_key)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            core_url: default_core_url(),
            vrf_url: default_vrf_url(),
            public_api_key: default_public_api_key(),
            internal_api_key: None,
            gateway_version: default_gateway_version(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8082))
}

fn default_core_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_vrf_url() -> String {
    "http://127.0.0.1:8081".to_string()
}

fn default_public_api_key() -> String {
    "demo".to_string()
}

fn default_gateway_version() -> String {
    format!("v{}", env!("CARGO_PKG_VERSION"))
}

/// Rate limiting configuration
///
/// Each route family consumes a named scope; scopes are independent token
/// buckets even for the same client.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RateLimitConfig {
    /// Scope consumed by the bulk-random route
    #[serde(default = "default_scope_default")]
    pub default: ScopeConfig,
    /// Scope consumed by the VRF passthrough route
    #[serde(default = "default_scope_vrf")]
    pub vrf: ScopeConfig,
    /// How often stale buckets are swept from memory, in seconds
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            default: default_scope_default(),
            vrf: default_scope_vrf(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
        }
    }
}

/// One named rate-limit policy: `capacity` admissions per `window_seconds`
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct ScopeConfig {
    pub capacity: u32,
    pub window_seconds: f64,
}

fn default_scope_default() -> ScopeConfig {
    ScopeConfig { capacity: 60, window_seconds: 60.0 }
}

fn default_scope_vrf() -> ScopeConfig {
    ScopeConfig { capacity: 30, window_seconds: 60.0 }
}

fn default_sweep_interval_seconds() -> u64 {
    300
}
