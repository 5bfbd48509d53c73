use bytes::Bytes;
use http::StatusCode;
use std::time::Duration;
use thiserror::Error;

use crate::error::{GatewayError, Result};

/// Timeout for core random fetches
const CORE_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for VRF sample fetches made by the fallback pipeline
const VRF_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout when serving the VRF-only passthrough route
const VRF_PASSTHROUGH_TIMEOUT: Duration = Duration::from_secs(15);

/// A completed upstream HTTP exchange.
///
/// Non-200 statuses are returned here, not as errors; only transport
/// failures become [`UpstreamError`].
#[derive(Debug, Clone)]
pub struct HttpOutcome {
    pub status: StatusCode,
    pub body: Bytes,
    pub content_type: Option<String>,
}

/// Transport failure talking to an upstream.
///
/// Connection refused, timeout, DNS failure and malformed responses are all
/// one class: callers only ever treat them as "upstream unavailable".
#[derive(Debug, Error)]
#[error("upstream transport failure: {0}")]
pub struct UpstreamError(String);

/// Client for the core RNG service and the VRF service.
pub struct UpstreamClient {
    core_url: String,
    vrf_url: String,
    internal_api_key: String,
    http: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(
        core_url: impl Into<String>,
        vrf_url: impl Into<String>,
        internal_api_key: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| GatewayError::Http(format!("Failed to build upstream client: {e}")))?;

        Ok(Self {
            core_url: core_url.into(),
            vrf_url: vrf_url.into(),
            internal_api_key: internal_api_key.into(),
            http,
        })
    }

    /// Fetch `n` random bytes from the core service.
    ///
    /// Always requests `fmt=hex` regardless of what the external caller
    /// asked for; the gateway re-encodes to json/raw itself so upstream
    /// parsing stays uniform.
    pub async fn fetch_core_random(&self, n: usize) -> std::result::Result<HttpOutcome, UpstreamError> {
        let url = format!("{}/random", self.core_url);
        self.get(&url, &[("n", n.to_string()), ("fmt", "hex".to_string())], CORE_TIMEOUT)
            .await
    }

    /// Fetch one signed 32-bit sample from the VRF service.
    pub async fn fetch_vrf_sample(&self, sig: &str) -> std::result::Result<HttpOutcome, UpstreamError> {
        let url = format!("{}/random_dual", self.vrf_url);
        self.get(&url, &[("sig", sig.to_string())], VRF_TIMEOUT).await
    }

    /// Fetch a VRF response for verbatim relay on the VRF-only route.
    ///
    /// Same endpoint as [`fetch_vrf_sample`](Self::fetch_vrf_sample) with a
    /// wider timeout budget; the body and content type pass through the
    /// gateway untouched, signature metadata included.
    pub async fn fetch_vrf_passthrough(
        &self,
        sig: &str,
    ) -> std::result::Result<HttpOutcome, UpstreamError> {
        let url = format!("{}/random_dual", self.vrf_url);
        self.get(&url, &[("sig", sig.to_string())], VRF_PASSTHROUGH_TIMEOUT)
            .await
    }

    async fn get(
        &self,
        url: &str,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> std::result::Result<HttpOutcome, UpstreamError> {
        let resp = self
            .http
            .get(url)
            .query(params)
            .header("X-API-Key", &self.internal_api_key)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| UpstreamError(e.to_string()))?;

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = resp
            .bytes()
            .await
            .map_err(|e| UpstreamError(e.to_string()))?;

        Ok(HttpOutcome { status, body, content_type })
    }
}
