//! Trusted-dealer DKG with Feldman VSS.
//!
//! The core specification deliberately does not require a distributed
//! key-generation protocol (no guardian-to-guardian round trip); a single
//! dealer samples the sharing polynomial, distributes shares out of band,
//! and publishes the VSS commitments so any guardian can later verify
//! its own share without trusting the dealer further. This mirrors the
//! teacher's `ochra_guardian::dkg` module's shape (an `initiate`-then-
//! `verify` split) while replacing guardian-heartbeat bookkeeping with the
//! Feldman VSS math the core spec actually requires.

use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::Identity;
use rand_core::OsRng;
use zeroize::Zeroize;

use crate::transcript;
use crate::{FrostError, Result, MAX_PARTICIPANTS};

/// Threshold `t` and total participant count `n` for a DKG ceremony.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DkgConfig {
    /// Minimum number of guardians required to produce a signature.
    pub threshold: u16,
    /// Total number of guardian shares to issue.
    pub total_participants: u16,
}

impl DkgConfig {
    /// Validate a `(t, n)` pair: `1 ≤ t ≤ n` and `n` fits the one-byte
    /// guardian-id encoding used throughout the transcript math.
    pub fn new(threshold: u16, total_participants: u16) -> Result<Self> {
        if threshold == 0 {
            return Err(FrostError::Config("threshold must be at least 1".to_string()));
        }
        if total_participants == 0 {
            return Err(FrostError::Config(
                "total_participants must be at least 1".to_string(),
            ));
        }
        if threshold > total_participants {
            return Err(FrostError::Config(
                "threshold cannot exceed total_participants".to_string(),
            ));
        }
        if total_participants as usize > MAX_PARTICIPANTS {
            return Err(FrostError::Config(format!(
                "total_participants exceeds the one-byte guardian-id limit of {MAX_PARTICIPANTS}"
            )));
        }
        Ok(Self {
            threshold,
            total_participants,
        })
    }
}

/// One guardian's long-lived secret share and its derived public key.
///
/// The secret scalar is zeroized on drop; `Debug` intentionally omits it.
pub struct GuardianKeyShare {
    /// Guardian id, `0..total_participants`.
    pub participant_id: u16,
    /// Secret share `s_i = f(x_i)` where `x_i = participant_id + 1`.
    pub secret_share: Scalar,
    /// Public key `s_i · G`, derivable by anyone from the VSS commitments.
    pub public_key: CompressedEdwardsY,
}

impl std::fmt::Debug for GuardianKeyShare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardianKeyShare")
            .field("participant_id", &self.participant_id)
            .field("public_key", &hex::encode(self.public_key.as_bytes()))
            .finish_non_exhaustive()
    }
}

impl Drop for GuardianKeyShare {
    fn drop(&mut self) {
        self.secret_share.zeroize();
    }
}

/// Output of a DKG ceremony: the group's public key, every guardian's
/// share, and the VSS commitments needed to verify them.
#[derive(Debug)]
pub struct DkgOutput {
    /// The group's public key `Y = a_0 · G`.
    pub group_public_key: CompressedEdwardsY,
    /// One [`GuardianKeyShare`] per participant, ids `0..n`.
    pub guardian_shares: Vec<GuardianKeyShare>,
    /// Feldman VSS commitments `A_0..A_{t-1}` to the sharing polynomial's
    /// coefficients, published so any guardian can verify its own share.
    pub vss_commitments: Vec<CompressedEdwardsY>,
}

/// Run a trusted-dealer DKG: sample a degree-`(t-1)` polynomial, evaluate
/// it at `x_i = i + 1` for each of the `n` guardians, and publish Feldman
/// VSS commitments to the polynomial's coefficients.
pub fn deal(config: &DkgConfig) -> Result<DkgOutput> {
    let mut rng = OsRng;
    let degree = config.threshold as usize;

    let coefficients: Vec<Scalar> = (0..degree).map(|_| Scalar::random(&mut rng)).collect();
    let vss_commitments: Vec<CompressedEdwardsY> = coefficients
        .iter()
        .map(|a| transcript::base_point_mul(a).compress())
        .collect();
    let group_public_key = vss_commitments[0];

    let guardian_shares = (0..config.total_participants)
        .map(|participant_id| {
            let x = Scalar::from(u64::from(participant_id) + 1);
            let secret_share = evaluate_polynomial(&coefficients, x);
            let public_key = transcript::base_point_mul(&secret_share).compress();
            GuardianKeyShare {
                participant_id,
                secret_share,
                public_key,
            }
        })
        .collect();

    Ok(DkgOutput {
        group_public_key,
        guardian_shares,
        vss_commitments,
    })
}

/// Verify that `share` is consistent with the published VSS commitments:
/// `s_i · G == Σ_k A_k · x_i^k`.
pub fn verify_share(share: &GuardianKeyShare, vss_commitments: &[CompressedEdwardsY]) -> bool {
    let x = Scalar::from(u64::from(share.participant_id) + 1);
    let mut expected = EdwardsPoint::identity();
    let mut x_power = Scalar::ONE;

    for commitment in vss_commitments {
        let Some(point) = commitment.decompress() else {
            return false;
        };
        expected += point * x_power;
        x_power *= x;
    }

    expected.compress() == share.public_key
}

fn evaluate_polynomial(coefficients: &[Scalar], x: Scalar) -> Scalar {
    let mut result = Scalar::ZERO;
    let mut x_power = Scalar::ONE;
    for coefficient in coefficients {
        result += coefficient * x_power;
        x_power *= x;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_rejects_zero_threshold() {
        assert!(matches!(DkgConfig::new(0, 3), Err(FrostError::Config(_))));
    }

    #[test]
    fn test_config_rejects_threshold_above_total() {
        assert!(matches!(DkgConfig::new(4, 3), Err(FrostError::Config(_))));
    }

    #[test]
    fn test_config_rejects_too_many_participants() {
        assert!(matches!(
            DkgConfig::new(2, 256),
            Err(FrostError::Config(_))
        ));
    }

    #[test]
    fn test_deal_produces_verifiable_shares() {
        let config = DkgConfig::new(3, 5).expect("3-of-5 is a valid config");
        let output = deal(&config).expect("dealing never fails for a valid config");

        assert_eq!(output.guardian_shares.len(), 5);
        assert_eq!(output.vss_commitments.len(), 3);
        for share in &output.guardian_shares {
            assert!(verify_share(share, &output.vss_commitments));
        }
    }

    #[test]
    fn test_tampered_share_fails_verification() {
        let config = DkgConfig::new(2, 3).expect("2-of-3 is a valid config");
        let output = deal(&config).expect("dealing never fails for a valid config");
        let mut tampered = output
            .guardian_shares
            .into_iter()
            .next()
            .expect("deal produced at least one share");
        tampered.secret_share += Scalar::ONE;
        assert!(!verify_share(&tampered, &output.vss_commitments));
    }

    #[test]
    fn test_lagrange_reconstruction_recovers_group_key() {
        let config = DkgConfig::new(2, 3).expect("2-of-3 is a valid config");
        let output = deal(&config).expect("dealing never fails for a valid config");
        let ids: Vec<u16> = output
            .guardian_shares
            .iter()
            .take(2)
            .map(|s| s.participant_id)
            .collect();

        let mut reconstructed = Scalar::ZERO;
        for share in output.guardian_shares.iter().take(2) {
            let lambda = transcript::lagrange_coefficient(share.participant_id, &ids)
                .expect("two distinct ids have a well-defined Lagrange coefficient");
            reconstructed += lambda * share.secret_share;
        }

        assert_eq!(
            transcript::base_point_mul(&reconstructed).compress(),
            output.group_public_key
        );
    }
}
