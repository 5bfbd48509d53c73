pub mod rate_limit;

mod api_key;

pub use api_key::api_key_matches;
pub use rate_limit::{RateLimitExceeded, RateLimiter, RateScope};

use std::net::SocketAddr;

/// Sentinel used when the caller's network address is unavailable.
///
/// All such callers share a single rate-limit bucket.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Derive the rate-limit client identity from the caller's network address.
///
/// Only the IP is used, never the API key: two credential holders behind the
/// same proxy deliberately share a bucket.
pub fn client_key(peer: Option<SocketAddr>) -> String {
    match peer {
        Some(addr) => addr.ip().to_string(),
        None => UNKNOWN_CLIENT.to_string(),
    }
}
