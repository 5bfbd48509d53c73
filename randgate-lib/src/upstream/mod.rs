//! Bounded-timeout HTTP client for the two upstream randomness services.
//!
//! Stateless beyond the two base URLs and the shared internal credential.
//! Retry and fallback policy live in the delivery pipeline, never here.

mod client;

pub use client::{HttpOutcome, UpstreamClient, UpstreamError};
