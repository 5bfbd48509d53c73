use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::security::{RateLimiter, RateScope};
use crate::upstream::UpstreamClient;

/// Named scopes built once from configuration.
pub struct Scopes {
    pub default: RateScope,
    pub vrf: RateScope,
}

/// Shared state for all in-flight requests.
///
/// The rate limiter's bucket map is the only mutable piece; everything else
/// is immutable after construction.
pub struct GatewayContext {
    pub config: Config,
    pub limiter: RateLimiter,
    pub scopes: Scopes,
    pub upstream: UpstreamClient,
}

impl GatewayContext {
    pub fn new(config: Config) -> Result<Self> {
        let upstream = UpstreamClient::new(
            config.core_url.clone(),
            config.vrf_url.clone(),
            config.internal_api_key().to_string(),
        )?;
        let scopes = Scopes {
            default: RateScope::from_config("default", &config.rate_limit.default),
            vrf: RateScope::from_config("vrf", &config.rate_limit.vrf),
        };

        Ok(Self { config, limiter: RateLimiter::new(), scopes, upstream })
    }

    /// Grace period for the stale-bucket sweep: one full window past expiry
    /// of the longest-lived scope.
    pub fn sweep_grace(&self) -> Duration {
        self.scopes.default.window.max(self.scopes.vrf.window)
    }
}
