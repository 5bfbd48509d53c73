use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::error::{GatewayError, Result};

/// Load configuration: optional TOML file, then environment overrides.
///
/// Recognized environment variables: `RANDGATE_LISTEN`, `CORE_URL`,
/// `VRF_URL`, `PUBLIC_API_KEY`, `INTERNAL_API_KEY`, `GATEWAY_VERSION`.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let mut cfg = match path {
        Some(p) => load_from_path(p)?,
        None => Config::default(),
    };

    apply_env_overrides(&mut cfg)?;
    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<Config> {
    let txt = fs::read_to_string(p)
        .map_err(|e| GatewayError::Config(format!("Failed to read config file: {e}")))?;
    let cfg: Config = toml::from_str(&txt)
        .map_err(|e| GatewayError::Config(format!("Failed to parse config: {e}")))?;

    Ok(cfg)
}

fn apply_env_overrides(cfg: &mut Config) -> Result<()> {
    if let Ok(listen) = std::env::var("RANDGATE_LISTEN") {
        cfg.listen = listen
            .parse()
            .map_err(|e| GatewayError::Config(format!("Invalid RANDGATE_LISTEN '{listen}': {e}")))?;
    }
    if let Ok(core_url) = std::env::var("CORE_URL") {
        cfg.core_url = core_url;
    }
    if let Ok(vrf_url) = std::env::var("VRF_URL") {
        cfg.vrf_url = vrf_url;
    }
    if let Ok(key) = std::env::var("PUBLIC_API_KEY") {
        cfg.public_api_key = key;
    }
    if let Ok(key) = std::env::var("INTERNAL_API_KEY") {
        cfg.internal_api_key = Some(key);
    }
    if let Ok(version) = std::env::var("GATEWAY_VERSION") {
        cfg.gateway_version = version;
    }

    Ok(())
}

fn validate_config(cfg: &Config) -> Result<()> {
    for (name, value) in [("core_url", &cfg.core_url), ("vrf_url", &cfg.vrf_url)] {
        let parsed = value
            .parse::<url::Url>()
            .map_err(|e| GatewayError::Config(format!("Invalid {name} '{value}': {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(GatewayError::Config(format!(
                "Invalid {name} '{value}': expected an http(s) URL"
            )));
        }
    }

    for (name, scope) in [("default", &cfg.rate_limit.default), ("vrf", &cfg.rate_limit.vrf)] {
        if scope.capacity == 0 {
            return Err(GatewayError::Config(format!(
                "Rate limit scope '{name}' must have capacity >= 1"
            )));
        }
        if scope.window_seconds <= 0.0 {
            return Err(GatewayError::Config(format!(
                "Rate limit scope '{name}' must have a positive window"
            )));
        }
    }

    if cfg.rate_limit.sweep_interval_seconds == 0 {
        return Err(GatewayError::Config(
            "sweep_interval_seconds must be >= 1".to_string(),
        ));
    }

    Ok(())
}
