//! Fallback-aware random-byte delivery.
//!
//! Core is authoritative and fast; the VRF service is a narrow-bandwidth,
//! signed source used only to avoid total unavailability. The pipeline calls
//! core once, and on any failure expands repeated 4-byte VRF samples into a
//! byte stream of the exact requested length.

mod pipeline;
mod types;

pub use pipeline::{get_random, DeliveryUnavailable};
pub use types::{
    OutputFormat, RandomRequest, RandomResult, Source, VrfSample, DEFAULT_BYTES, MAX_BYTES,
    MIN_BYTES,
};
