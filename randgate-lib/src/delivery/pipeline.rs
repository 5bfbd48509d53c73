use http::StatusCode;
use thiserror::Error;
use tracing::{debug, warn};

use crate::delivery::types::{RandomRequest, RandomResult, Source, VrfSample};
use crate::upstream::UpstreamClient;

/// Bytes contributed by one VRF sample
const VRF_SAMPLE_BYTES: usize = 4;

/// Both upstreams are exhausted for this request.
///
/// Rendered as HTTP 503 with a plain-text body; a partial byte buffer is
/// never returned in its place.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("core is unavailable and the VRF fallback could not supply the requested bytes; retry once core is restored")]
pub struct DeliveryUnavailable;

/// Deliver `req.n` random bytes, falling back from core to VRF.
///
/// Core returning 200 ends the request: the trimmed body is the hex string
/// of exactly the length core reported (core is trusted to honor `n`; the
/// gateway does not re-validate). Any other outcome, non-200 and transport
/// failure alike, triggers the VRF fallback.
pub async fn get_random(
    client: &UpstreamClient,
    req: &RandomRequest,
) -> Result<RandomResult, DeliveryUnavailable> {
    match client.fetch_core_random(req.n).await {
        Ok(outcome) if outcome.status == StatusCode::OK => {
            let bytes_hex = String::from_utf8_lossy(&outcome.body).trim().to_string();
            let byte_count = bytes_hex.len() / 2;
            return Ok(RandomResult { bytes_hex, source: Source::Core, byte_count });
        }
        Ok(outcome) => {
            debug!(status = %outcome.status, "core returned non-200, falling back to vrf");
        }
        Err(err) => {
            debug!(%err, "core unreachable, falling back to vrf");
        }
    }

    vrf_fallback(client, req.n).await
}

/// Accumulate `ceil(n / 4)` sequential VRF samples and truncate to `n`.
///
/// Samples are fetched one at a time, each awaited before the next begins,
/// so byte order is deterministic given deterministic upstream responses.
/// Any failed call aborts the whole request.
async fn vrf_fallback(
    client: &UpstreamClient,
    n: usize,
) -> Result<RandomResult, DeliveryUnavailable> {
    let blocks = n.div_ceil(VRF_SAMPLE_BYTES);
    let mut accumulator = Vec::with_capacity(blocks * VRF_SAMPLE_BYTES);

    while accumulator.len() < n {
        let outcome = client.fetch_vrf_sample("ecdsa").await.map_err(|err| {
            warn!(%err, accumulated = accumulator.len(), "vrf unreachable mid-accumulation");
            DeliveryUnavailable
        })?;
        if outcome.status != StatusCode::OK {
            warn!(status = %outcome.status, accumulated = accumulator.len(), "vrf returned non-200 mid-accumulation");
            return Err(DeliveryUnavailable);
        }

        let sample: VrfSample = serde_json::from_slice(&outcome.body).map_err(|err| {
            warn!(%err, "vrf returned a malformed sample");
            DeliveryUnavailable
        })?;
        accumulator.extend_from_slice(&sample.to_be_bytes());
    }

    // The last sample's tail is what gets cut, never leading bytes
    accumulator.truncate(n);

    Ok(RandomResult {
        bytes_hex: hex::encode(&accumulator),
        source: Source::VrfFallback,
        byte_count: n,
    })
}
