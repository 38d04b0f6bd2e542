//! Shared FROST transcript math.
//!
//! Both the [`crate::participant::Participant`] (round 2) and the
//! Coordinator in `txguard-coordinator` (aggregation) must derive the
//! same binding factors, group commitment, and challenge from a
//! canonicalized commitment list. Centralizing that math here is the
//! difference between one correct implementation and two that can drift
//! apart.
//!
//! ## Hash function and framing
//!
//! The core specification fixes `H` as SHA-512, taking the first 32
//! bytes of the digest as a big-endian integer reduced modulo the curve
//! order, but leaves the exact message framing as an implementation
//! choice ("implementations MUST fix the message framing"). This crate
//! resolves it the way the teacher crate resolves the same ambiguity for
//! its own domain-separated hashing
//! (`ochra_crypto::blake3::encode_multi_field`): every field passed to
//! [`hash_to_scalar`] is prefixed with its own 4-byte big-endian length,
//! so a change in one field's length can never be confused with a
//! different split of the same bytes.

use std::collections::BTreeMap;

use curve25519_dalek::constants::ED25519_BASEPOINT_TABLE;
use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::Identity;
use sha2::{Digest, Sha512};

use crate::participant::FrostCommitment;
use crate::{FrostError, Result};

/// Hash arbitrary length-framed byte fields to a scalar mod the curve
/// order `q`, per the core spec's `H`: SHA-512, first 32 bytes,
/// big-endian, reduced mod `q`.
pub fn hash_to_scalar(fields: &[&[u8]]) -> Scalar {
    let mut hasher = Sha512::new();
    for field in fields {
        hasher.update((field.len() as u32).to_be_bytes());
        hasher.update(field);
    }
    let digest = hasher.finalize();

    let mut be32 = [0u8; 32];
    be32.copy_from_slice(&digest[..32]);
    be32.reverse(); // from_bytes_mod_order wants little-endian; the spec's integer is big-endian.
    Scalar::from_bytes_mod_order(be32)
}

/// Canonicalize a raw commitment list into a map keyed by guardian id,
/// which both sorts by ascending id (the spec's canonicalization rule)
/// and rejects a guardian id appearing twice.
pub fn canonicalize_commitments(
    commitments: &[FrostCommitment],
) -> Result<BTreeMap<u16, FrostCommitment>> {
    let mut map = BTreeMap::new();
    for commitment in commitments {
        if map
            .insert(commitment.guardian_id, commitment.clone())
            .is_some()
        {
            return Err(FrostError::DuplicateParticipant);
        }
    }
    Ok(map)
}

/// The fixed-width commitment transcript `D_0 || E_0 || D_1 || E_1 || …`
/// in ascending guardian-id order, used as one length-framed field of the
/// binding-factor hash.
fn commitment_transcript(commitments: &BTreeMap<u16, FrostCommitment>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(commitments.len() * 64);
    for commitment in commitments.values() {
        buf.extend_from_slice(commitment.hiding_nonce.as_bytes());
        buf.extend_from_slice(commitment.binding_nonce.as_bytes());
    }
    buf
}

/// Compute the per-guardian binding factor `ρ_j = H(j ‖ m ‖ transcript)`
/// for every guardian in a canonicalized commitment list.
///
/// The guardian id is encoded as a single byte, per the spec's documented
/// limit of `n ≤ 255` participants (see `DKGConfig::new`).
pub fn binding_factors(
    message: &[u8],
    commitments: &BTreeMap<u16, FrostCommitment>,
) -> BTreeMap<u16, Scalar> {
    let transcript = commitment_transcript(commitments);
    commitments
        .keys()
        .map(|&guardian_id| {
            let id_byte = [guardian_id as u8];
            let rho = hash_to_scalar(&[&id_byte, message, &transcript]);
            (guardian_id, rho)
        })
        .collect()
}

/// Compute the group commitment `R = Σ_j (D_j + ρ_j · E_j)`.
pub fn group_commitment(
    commitments: &BTreeMap<u16, FrostCommitment>,
    binding_factors: &BTreeMap<u16, Scalar>,
) -> Result<EdwardsPoint> {
    let mut r = EdwardsPoint::identity();
    for (guardian_id, commitment) in commitments {
        let rho = binding_factors
            .get(guardian_id)
            .expect("binding factor computed for every commitment");
        let hiding = commitment
            .hiding_nonce
            .decompress()
            .ok_or_else(|| FrostError::Decode("hiding nonce commitment".to_string()))?;
        let binding = commitment
            .binding_nonce
            .decompress()
            .ok_or_else(|| FrostError::Decode("binding nonce commitment".to_string()))?;
        r += hiding + binding * rho;
    }
    Ok(r)
}

/// Compute the Schnorr challenge `c = H(R ‖ Y ‖ m)`.
pub fn challenge(r: &CompressedEdwardsY, group_public_key: &CompressedEdwardsY, message: &[u8]) -> Scalar {
    hash_to_scalar(&[r.as_bytes(), group_public_key.as_bytes(), message])
}

/// Compute the Lagrange coefficient `λ_i = Π_{j≠i} x_j / (x_j − x_i)` at
/// evaluation point 0, where `x_k = k + 1` (the dealer never evaluates
/// the sharing polynomial at zero, which would leak the secret).
///
/// Fails with [`FrostError::DuplicateParticipant`] if two entries of
/// `all_ids` collide, which would otherwise make the denominator zero.
pub fn lagrange_coefficient(my_id: u16, all_ids: &[u16]) -> Result<Scalar> {
    let my_x = Scalar::from(u64::from(my_id) + 1);
    let mut numerator = Scalar::ONE;
    let mut denominator = Scalar::ONE;

    for &other_id in all_ids {
        if other_id == my_id {
            continue;
        }
        let other_x = Scalar::from(u64::from(other_id) + 1);
        if other_x == my_x {
            return Err(FrostError::DuplicateParticipant);
        }
        numerator *= other_x;
        denominator *= other_x - my_x;
    }

    Ok(numerator * denominator.invert())
}

/// Multiply the Ed25519 basepoint by a scalar. A thin wrapper so callers
/// never need to import `ED25519_BASEPOINT_TABLE` directly.
pub fn base_point_mul(scalar: &Scalar) -> EdwardsPoint {
    ED25519_BASEPOINT_TABLE * scalar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_to_scalar_is_deterministic() {
        let a = hash_to_scalar(&[b"hello", b"world"]);
        let b = hash_to_scalar(&[b"hello", b"world"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_to_scalar_framing_is_unambiguous() {
        // Without length framing, ("ab", "c") and ("a", "bc") would collide.
        let a = hash_to_scalar(&[b"ab", b"c"]);
        let b = hash_to_scalar(&[b"a", b"bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_canonicalize_rejects_duplicate_guardian_id() {
        let c0 = FrostCommitment {
            guardian_id: 0,
            hiding_nonce: CompressedEdwardsY(base_point_mul(&Scalar::from(1u64)).compress().to_bytes()),
            binding_nonce: CompressedEdwardsY(base_point_mul(&Scalar::from(2u64)).compress().to_bytes()),
        };
        let c1 = c0.clone();
        let result = canonicalize_commitments(&[c0, c1]);
        assert!(matches!(result, Err(FrostError::DuplicateParticipant)));
    }

    #[test]
    fn test_lagrange_at_trivial_set() {
        // With a single participant {0}, lambda_0 is the empty product = 1.
        let lambda = lagrange_coefficient(0, &[0]).expect("lagrange");
        assert_eq!(lambda, Scalar::ONE);
    }

    #[test]
    fn test_lagrange_detects_duplicate_ids() {
        let result = lagrange_coefficient(0, &[0, 1, 1, 2]);
        assert!(matches!(result, Err(FrostError::DuplicateParticipant)));
    }
}
