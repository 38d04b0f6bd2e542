//! Per-guardian nonce lifecycle and FROST round 2 (signature shares).
//!
//! A [`Participant`] holds one guardian's long-lived secret share plus a
//! short-lived table of per-session nonce pairs. Nonces are single-use:
//! [`Participant::generate_signature_share`] consumes (and zeroizes) the
//! stored nonce pair for a session the moment it produces a share, the
//! same way the teacher's `ed25519::SigningKey` zeroizes its secret bytes
//! on drop rather than leaving them to be swept up later.

use std::collections::HashMap;

use curve25519_dalek::edwards::CompressedEdwardsY;
use curve25519_dalek::scalar::Scalar;
use rand_core::OsRng;
use zeroize::Zeroize;

use crate::transcript;
use crate::{FrostError, Result, SessionId};

/// A guardian's round-1 commitment: the compressed hiding and binding
/// nonce commitments `(D_i, E_i)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrostCommitment {
    /// Guardian id this commitment belongs to.
    pub guardian_id: u16,
    /// Hiding nonce commitment `D_i = d_i · G`.
    pub hiding_nonce: CompressedEdwardsY,
    /// Binding nonce commitment `E_i = e_i · G`.
    pub binding_nonce: CompressedEdwardsY,
}

/// A guardian's round-2 output: its signature share `z_i`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureShare {
    /// Guardian id this share was produced by.
    pub guardian_id: u16,
    /// The scalar share `z_i = d_i + (e_i · ρ_i) + (λ_i · s_i · c)`.
    pub z_share: Scalar,
}

/// One session's hiding/binding nonce pair. Zeroized on drop.
struct NonceStore {
    hiding_nonce: Scalar,
    binding_nonce: Scalar,
}

impl Drop for NonceStore {
    fn drop(&mut self) {
        self.hiding_nonce.zeroize();
        self.binding_nonce.zeroize();
    }
}

/// A single guardian's FROST signing state.
///
/// Holds the long-lived secret share produced by the DKG dealer, plus a
/// table of outstanding per-session nonces. One `Participant` handles any
/// number of concurrent signing sessions, each with its own nonce pair.
pub struct Participant {
    id: u16,
    threshold: u16,
    secret_share: Scalar,
    group_public_key: CompressedEdwardsY,
    nonces: HashMap<SessionId, NonceStore>,
}

impl std::fmt::Debug for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Participant")
            .field("id", &self.id)
            .field("threshold", &self.threshold)
            .field("group_public_key", &hex::encode(self.group_public_key.as_bytes()))
            .field("open_sessions", &self.nonces.len())
            .finish_non_exhaustive()
    }
}

impl Participant {
    /// Construct a participant from its DKG-issued secret share.
    pub fn new(
        id: u16,
        threshold: u16,
        secret_share: Scalar,
        group_public_key: CompressedEdwardsY,
    ) -> Self {
        Self {
            id,
            threshold,
            secret_share,
            group_public_key,
            nonces: HashMap::new(),
        }
    }

    /// This guardian's id.
    pub fn id(&self) -> u16 {
        self.id
    }

    /// Round 1: generate a fresh hiding/binding nonce pair for `session_id`
    /// and return the commitment to broadcast to the coordinator.
    ///
    /// Fails with [`FrostError::NonceCollision`] if this participant
    /// already holds uncommitted nonces for the session (each session must
    /// start exactly one commitment round).
    pub fn generate_commitment(&mut self, session_id: SessionId) -> Result<FrostCommitment> {
        if self.nonces.contains_key(&session_id) {
            return Err(FrostError::NonceCollision);
        }

        let mut rng = OsRng;
        let hiding_nonce = Scalar::random(&mut rng);
        let binding_nonce = Scalar::random(&mut rng);
        let hiding_point = transcript::base_point_mul(&hiding_nonce).compress();
        let binding_point = transcript::base_point_mul(&binding_nonce).compress();

        self.nonces.insert(
            session_id,
            NonceStore {
                hiding_nonce,
                binding_nonce,
            },
        );

        Ok(FrostCommitment {
            guardian_id: self.id,
            hiding_nonce: hiding_point,
            binding_nonce: binding_point,
        })
    }

    /// Round 2: produce this guardian's signature share over `message`,
    /// given the full canonical commitment list collected by the
    /// coordinator.
    ///
    /// Preconditions, checked in order:
    /// - `session_id` has a stored nonce pair ([`FrostError::NonceMissing`]).
    /// - this guardian's id appears in `commitments`
    ///   ([`FrostError::NonceMissing`]).
    /// - `commitments` has at least `threshold` entries
    ///   ([`FrostError::InvalidCommitmentCount`]).
    ///
    /// On success the stored nonce pair for `session_id` is consumed and
    /// zeroized; a second call for the same session always fails.
    pub fn generate_signature_share(
        &mut self,
        session_id: SessionId,
        message: &[u8],
        commitments: &[FrostCommitment],
    ) -> Result<SignatureShare> {
        if !self.nonces.contains_key(&session_id) {
            return Err(FrostError::NonceMissing);
        }

        let canonical = transcript::canonicalize_commitments(commitments)?;
        if !canonical.contains_key(&self.id) {
            return Err(FrostError::NonceMissing);
        }
        if canonical.len() < self.threshold as usize {
            return Err(FrostError::InvalidCommitmentCount {
                required: self.threshold as usize,
                actual: canonical.len(),
            });
        }

        let binding = transcript::binding_factors(message, &canonical);
        let group_r = transcript::group_commitment(&canonical, &binding)?.compress();
        let challenge = transcript::challenge(&group_r, &self.group_public_key, message);
        let all_ids: Vec<u16> = canonical.keys().copied().collect();
        let lambda = transcript::lagrange_coefficient(self.id, &all_ids)?;
        let rho_i = binding[&self.id];

        let nonce_store = self
            .nonces
            .remove(&session_id)
            .expect("presence checked above");

        let z_share =
            nonce_store.hiding_nonce + nonce_store.binding_nonce * rho_i + lambda * self.secret_share * challenge;

        Ok(SignatureShare {
            guardian_id: self.id,
            z_share,
        })
    }

    /// Discard any stored nonces for `session_id` without producing a
    /// share, e.g. when a session times out or is aborted.
    pub fn clear_nonces(&mut self, session_id: SessionId) {
        self.nonces.remove(&session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dkg::{self, DkgConfig};

    #[test]
    fn test_nonce_collision_rejected() {
        let output = dkg::deal(&DkgConfig::new(2, 3).expect("2-of-3 is a valid config"))
            .expect("dealing never fails for a valid config");
        let share = &output.guardian_shares[0];
        let mut participant = Participant::new(
            share.participant_id,
            2,
            share.secret_share,
            output.group_public_key,
        );
        let session = [7u8; 16];
        participant
            .generate_commitment(session)
            .expect("first commitment for a fresh session always succeeds");
        let err = participant.generate_commitment(session).unwrap_err();
        assert!(matches!(err, FrostError::NonceCollision));
    }

    #[test]
    fn test_share_without_commitment_fails() {
        let output = dkg::deal(&DkgConfig::new(2, 3).expect("2-of-3 is a valid config"))
            .expect("dealing never fails for a valid config");
        let share = &output.guardian_shares[0];
        let mut participant = Participant::new(
            share.participant_id,
            2,
            share.secret_share,
            output.group_public_key,
        );
        let err = participant
            .generate_signature_share([1u8; 16], b"msg", &[])
            .unwrap_err();
        assert!(matches!(err, FrostError::NonceMissing));
    }

    #[test]
    fn test_nonce_consumed_after_share() {
        let output = dkg::deal(&DkgConfig::new(2, 3).expect("2-of-3 is a valid config"))
            .expect("dealing never fails for a valid config");
        let mut participants: Vec<Participant> = output
            .guardian_shares
            .iter()
            .map(|s| Participant::new(s.participant_id, 2, s.secret_share, output.group_public_key))
            .collect();

        let session = [3u8; 16];
        let commitments: Vec<FrostCommitment> = participants
            .iter_mut()
            .take(2)
            .map(|p| p.generate_commitment(session).expect("first commitment always succeeds"))
            .collect();

        let message = b"withdraw 1 eth";
        let first = participants[0]
            .generate_signature_share(session, message, &commitments)
            .expect("threshold commitments are present");
        assert_eq!(first.guardian_id, participants[0].id());

        let err = participants[0]
            .generate_signature_share(session, message, &commitments)
            .unwrap_err();
        assert!(matches!(err, FrostError::NonceMissing));
    }
}
