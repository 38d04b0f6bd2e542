//! Hex and fixed-width byte encodings for the boundary between the core
//! crates and JSON-RPC/on-chain consumers.
//!
//! Nothing in here is cryptography; it is purely format plumbing. Every
//! function is infallible to encode (the core's value types are always
//! canonical) and fallible to decode (the input is untrusted wire data).

use curve25519_dalek::edwards::CompressedEdwardsY;
use curve25519_dalek::scalar::Scalar;
use num_bigint::BigUint;

/// The byte width of the VDF's RSA-2048 group elements on the wire.
pub const VDF_MODULUS_BYTES: usize = 256;

/// Errors decoding untrusted hex/byte input from the wire.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The string was not valid hex (with or without a `0x` prefix).
    #[error("invalid hex encoding: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// The decoded byte length did not match what the field requires.
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Required byte length.
        expected: usize,
        /// Bytes actually present.
        actual: usize,
    },

    /// The bytes decoded but do not represent a canonical curve point.
    #[error("bytes do not decompress to a valid curve point")]
    InvalidPoint,
}

fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x").unwrap_or(s)
}

/// Encode 32 raw bytes (a compressed point or a scalar) as `0x`-prefixed
/// hex, per the on-chain consumer encoding (`spec.md` §6.3).
pub fn encode_bytes32(bytes: &[u8; 32]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode an arbitrary-length `0x`-prefixed (or bare) hex string, for
/// variable-length fields like a signing message or a VDF challenge input.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, WireError> {
    Ok(hex::decode(strip_0x(s))?)
}

/// Decode a `0x`-prefixed (or bare) 32-byte hex string.
pub fn decode_bytes32(s: &str) -> Result<[u8; 32], WireError> {
    let decoded = hex::decode(strip_0x(s))?;
    let len = decoded.len();
    decoded
        .try_into()
        .map_err(|_| WireError::InvalidLength { expected: 32, actual: len })
}

/// Encode a compressed Ed25519 point (`R` or a public key) for the wire.
pub fn encode_point(point: &CompressedEdwardsY) -> String {
    encode_bytes32(point.as_bytes())
}

/// Decode a compressed Ed25519 point from the wire, rejecting bytes that
/// do not decompress to a valid curve point.
pub fn decode_point(s: &str) -> Result<CompressedEdwardsY, WireError> {
    let bytes = decode_bytes32(s)?;
    let point = CompressedEdwardsY(bytes);
    if point.decompress().is_none() {
        return Err(WireError::InvalidPoint);
    }
    Ok(point)
}

/// Encode a scalar (`z`, a signature share) for the wire.
pub fn encode_scalar(scalar: &Scalar) -> String {
    encode_bytes32(scalar.as_bytes())
}

/// Decode a scalar from the wire. Curve25519 scalars do not reject
/// non-canonical encodings by construction here (`Scalar::from_bytes_mod_order`
/// always succeeds); callers that need strict canonicality should compare
/// against the re-encoded form.
pub fn decode_scalar(s: &str) -> Result<Scalar, WireError> {
    let bytes = decode_bytes32(s)?;
    Ok(Scalar::from_bytes_mod_order(bytes))
}

/// Encode a VDF-group big integer (`y` or `π`) as a fixed 256-byte
/// (2048-bit) big-endian hex string, zero-padded on the left.
pub fn encode_vdf_element(value: &BigUint) -> String {
    let raw = value.to_bytes_be();
    let mut padded = vec![0u8; VDF_MODULUS_BYTES];
    let start = VDF_MODULUS_BYTES.saturating_sub(raw.len());
    padded[start..].copy_from_slice(&raw[raw.len().saturating_sub(VDF_MODULUS_BYTES)..]);
    format!("0x{}", hex::encode(padded))
}

/// Decode a 256-byte big-endian VDF group element from the wire.
pub fn decode_vdf_element(s: &str) -> Result<BigUint, WireError> {
    let decoded = hex::decode(strip_0x(s))?;
    if decoded.len() != VDF_MODULUS_BYTES {
        return Err(WireError::InvalidLength {
            expected: VDF_MODULUS_BYTES,
            actual: decoded.len(),
        });
    }
    Ok(BigUint::from_bytes_be(&decoded))
}

/// Solidity-friendly wire form of a [`FrostSignature`](../../txguard_crypto/signature/struct.FrostSignature.html).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct FrostSignatureWire {
    /// Group commitment `R`, 0x-prefixed 32-byte hex.
    pub r: String,
    /// Response scalar `z`, 0x-prefixed 32-byte hex.
    pub z: String,
    /// Group public key `Y`, 0x-prefixed 32-byte hex.
    pub group_public_key: String,
}

/// Wire form of a VDF proof: `{output, proof, iterations}` per
/// `spec.md` §6.3.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct VdfProofWire {
    /// `y`, the VDF output, as a 256-byte hex string.
    pub output: String,
    /// `π`, the Wesolowski proof, as a 256-byte hex string.
    pub proof: String,
    /// Iteration count `T` this proof was computed for.
    pub iterations: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes32_roundtrip() {
        let bytes = [7u8; 32];
        let encoded = encode_bytes32(&bytes);
        assert!(encoded.starts_with("0x"));
        assert_eq!(
            decode_bytes32(&encoded).expect("just-encoded bytes decode cleanly"),
            bytes
        );
    }

    #[test]
    fn test_decode_bytes32_rejects_wrong_length() {
        let err = decode_bytes32("0xabcd").unwrap_err();
        assert!(matches!(err, WireError::InvalidLength { .. }));
    }

    #[test]
    fn test_vdf_element_roundtrip_pads_small_values() {
        let value = BigUint::from(42u32);
        let encoded = encode_vdf_element(&value);
        let decoded = decode_vdf_element(&encoded).expect("just-encoded element decodes cleanly");
        assert_eq!(decoded, value);
        // 0x + 256 bytes * 2 hex chars
        assert_eq!(encoded.len(), 2 + VDF_MODULUS_BYTES * 2);
    }

    #[test]
    fn test_decode_point_rejects_invalid_point() {
        // All-0xFF bytes do not decompress to a valid Edwards point.
        let bad = format!("0x{}", hex::encode([0xFFu8; 32]));
        assert!(matches!(decode_point(&bad), Err(WireError::InvalidPoint)));
    }
}
