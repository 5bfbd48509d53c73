//! Local ECDSA signature verification.
//!
//! Recovers the secp256k1 public key from a prehashed message and an
//! `(r, s, v)` signature, derives the keccak-based address, and compares it
//! with the expected signer. A structurally valid but wrong signature is a
//! `match: false` report, not an error.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use thiserror::Error;

/// Inbound body of `POST /v1/verify`.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    /// 32-byte message hash, 64 hex characters, optional 0x prefix
    pub msg_hash: String,
    /// Signature r scalar, 64 hex characters
    pub r: String,
    /// Signature s scalar, 64 hex characters
    pub s: String,
    /// Recovery id: 0/1 or 27/28
    pub v: i64,
    /// Address the signature is claimed to come from
    pub expected_signer: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct VerifyResponse {
    pub ok: bool,
    #[serde(rename = "match")]
    pub matches: bool,
    /// Checksummed address recovered from the signature
    pub recovered: String,
    /// Checksummed form of the expected signer
    pub expected: String,
    /// Recovery id after normalization to 0/1
    pub v_used: u8,
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("{0} must be 64 hex characters (0x prefix optional)")]
    MalformedHex(&'static str),

    #[error("v must be 0/1 or 27/28")]
    MalformedRecoveryId,

    #[error("expected_signer must be a 20-byte hex address")]
    MalformedAddress,

    #[error("signature recovery failed: {0}")]
    Recovery(String),
}

/// Run the whole verification: normalize fields, recover, compare.
pub fn verify(req: &VerifyRequest) -> Result<VerifyResponse, VerifyError> {
    let msg_hash = clean_hex32(&req.msg_hash, "msg_hash")?;
    let r = clean_hex32(&req.r, "r")?;
    let s = clean_hex32(&req.s, "s")?;
    let v = normalize_v(req.v)?;
    let expected = checksum_address(&parse_address(&req.expected_signer)?);

    let signature = Signature::from_scalars(r, s)
        .map_err(|e| VerifyError::Recovery(e.to_string()))?;
    let recovery_id =
        RecoveryId::from_byte(v).ok_or(VerifyError::MalformedRecoveryId)?;
    let key = VerifyingKey::recover_from_prehash(&msg_hash, &signature, recovery_id)
        .map_err(|e| VerifyError::Recovery(e.to_string()))?;

    let recovered = recovered_address(&key);

    Ok(VerifyResponse {
        ok: true,
        matches: recovered == expected,
        recovered,
        expected,
        v_used: v,
    })
}

/// EIP-55 checksummed address for a secp256k1 public key.
pub fn recovered_address(key: &VerifyingKey) -> String {
    let point = key.to_encoded_point(false);
    // Uncompressed point: tag byte then 64 bytes of coordinates
    let digest = Keccak256::digest(&point.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&digest[12..]);
    checksum_address(&address)
}

fn clean_hex32(s: &str, field: &'static str) -> Result<[u8; 32], VerifyError> {
    let h = s.trim().strip_prefix("0x").unwrap_or(s.trim()).to_ascii_lowercase();
    let mut out = [0u8; 32];
    if h.len() != 64 || hex::decode_to_slice(&h, &mut out).is_err() {
        return Err(VerifyError::MalformedHex(field));
    }
    Ok(out)
}

/// Normalize v to {0, 1}; Ethereum wallets commonly send 27/28.
fn normalize_v(v: i64) -> Result<u8, VerifyError> {
    let v = if v == 27 || v == 28 { v - 27 } else { v };
    match v {
        0 | 1 => Ok(v as u8),
        _ => Err(VerifyError::MalformedRecoveryId),
    }
}

fn parse_address(s: &str) -> Result<[u8; 20], VerifyError> {
    let h = s.trim().strip_prefix("0x").unwrap_or(s.trim()).to_ascii_lowercase();
    let mut out = [0u8; 20];
    if h.len() != 40 || hex::decode_to_slice(&h, &mut out).is_err() {
        return Err(VerifyError::MalformedAddress);
    }
    Ok(out)
}

/// EIP-55 mixed-case checksum encoding.
fn checksum_address(address: &[u8; 20]) -> String {
    let lower = hex::encode(address);
    let digest = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, ch) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            digest[i / 2] >> 4
        } else {
            digest[i / 2] & 0x0F
        };
        if ch.is_ascii_alphabetic() && nibble >= 8 {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_matches_eip55_reference_vector() {
        let mut address = [0u8; 20];
        hex::decode_to_slice("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed", &mut address)
            .expect("valid hex");
        assert_eq!(
            checksum_address(&address),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
    }

    #[test]
    fn v_normalization() {
        assert_eq!(normalize_v(0).ok(), Some(0));
        assert_eq!(normalize_v(1).ok(), Some(1));
        assert_eq!(normalize_v(27).ok(), Some(0));
        assert_eq!(normalize_v(28).ok(), Some(1));
        assert!(normalize_v(2).is_err());
        assert!(normalize_v(-1).is_err());
    }

    #[test]
    fn hex_fields_must_be_exactly_64_chars() {
        assert!(clean_hex32(&"a".repeat(64), "r").is_ok());
        assert!(clean_hex32(&format!("0x{}", "a".repeat(64)), "r").is_ok());
        assert!(clean_hex32(&"a".repeat(63), "r").is_err());
        assert!(clean_hex32(&"g".repeat(64), "r").is_err());
    }
}
