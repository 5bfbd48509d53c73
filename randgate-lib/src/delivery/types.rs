use serde::Deserialize;
use std::str::FromStr;

/// Smallest number of bytes a caller may request
pub const MIN_BYTES: usize = 1;
/// Largest number of bytes a caller may request
pub const MAX_BYTES: usize = 4096;
/// Bytes served when the caller does not specify `n`
pub const DEFAULT_BYTES: usize = 32;

/// Response encoding requested by the external caller.
///
/// Hex text is the wire form even for `Raw`; the gateway never emits true
/// binary octets on this path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Hex,
    Json,
    Raw,
}

impl FromStr for OutputFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hex" => Ok(OutputFormat::Hex),
            "json" => Ok(OutputFormat::Json),
            "raw" => Ok(OutputFormat::Raw),
            _ => Err(()),
        }
    }
}

/// A validated request for random bytes.
#[derive(Debug, Clone, Copy)]
pub struct RandomRequest {
    /// Number of bytes requested, within [`MIN_BYTES`]..=[`MAX_BYTES`]
    pub n: usize,
    pub format: OutputFormat,
}

impl RandomRequest {
    /// Returns `None` when `n` is outside the allowed range.
    pub fn new(n: usize, format: OutputFormat) -> Option<Self> {
        (MIN_BYTES..=MAX_BYTES)
            .contains(&n)
            .then_some(Self { n, format })
    }
}

/// Provenance of delivered bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Served straight from the core service
    Core,
    /// Expanded from sequential VRF samples after core failed
    VrfFallback,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Core => "core",
            Source::VrfFallback => "vrf_fallback",
        }
    }
}

/// Delivered bytes plus provenance.
///
/// `byte_count` equals the requested length under fallback (truncated to
/// fit) and the upstream-reported length when the source is core.
#[derive(Debug, Clone)]
pub struct RandomResult {
    pub bytes_hex: String,
    pub source: Source,
    pub byte_count: usize,
}

/// One call's worth of randomness from the VRF upstream.
///
/// Only the 32-bit value matters to the pipeline; signature metadata is
/// opaque and only relayed by the passthrough route.
#[derive(Debug, Deserialize)]
pub struct VrfSample {
    #[serde(default)]
    pub random: u64,
}

impl VrfSample {
    /// Low 32 bits of the sample, big-endian.
    pub fn to_be_bytes(&self) -> [u8; 4] {
        ((self.random & 0xFFFF_FFFF) as u32).to_be_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("HEX".parse::<OutputFormat>(), Ok(OutputFormat::Hex));
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("Raw".parse::<OutputFormat>(), Ok(OutputFormat::Raw));
        assert!("binary".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn request_rejects_out_of_range_lengths() {
        assert!(RandomRequest::new(0, OutputFormat::Hex).is_none());
        assert!(RandomRequest::new(4097, OutputFormat::Hex).is_none());
        assert!(RandomRequest::new(1, OutputFormat::Hex).is_some());
        assert!(RandomRequest::new(4096, OutputFormat::Hex).is_some());
    }

    #[test]
    fn vrf_sample_masks_to_low_32_bits() {
        let sample = VrfSample { random: 0x1_DEAD_BEEF };
        assert_eq!(sample.to_be_bytes(), [0xDE, 0xAD, 0xBE, 0xEF]);
    }
}
