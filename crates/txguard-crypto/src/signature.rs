//! The aggregated FROST signature and its Schnorr-style verifier.

use curve25519_dalek::edwards::CompressedEdwardsY;
use curve25519_dalek::scalar::Scalar;

use crate::transcript;

/// An aggregated FROST signature `(R, z)` over the group public key `Y`.
///
/// Aggregation itself (summing the individual [`crate::participant::SignatureShare`]s)
/// is the Coordinator's job in `txguard-coordinator`, since only the
/// Coordinator sees every share; this type just carries the result and
/// knows how to verify itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrostSignature {
    /// Group commitment `R`.
    pub r: CompressedEdwardsY,
    /// Aggregated response scalar `z = Σ_i z_i`.
    pub z: Scalar,
    /// Group public key `Y` this signature verifies against.
    pub group_public_key: CompressedEdwardsY,
}

impl FrostSignature {
    /// Verify the Schnorr equation `z · G == R + c · Y` where
    /// `c = H(R ‖ Y ‖ message)`.
    ///
    /// Returns `false` (never panics) on malformed curve points, so
    /// callers can treat this as a plain boolean predicate over
    /// untrusted wire input.
    pub fn verify(&self, message: &[u8]) -> bool {
        let Some(r_point) = self.r.decompress() else {
            return false;
        };
        let Some(y_point) = self.group_public_key.decompress() else {
            return false;
        };

        let c = transcript::challenge(&self.r, &self.group_public_key, message);
        let lhs = transcript::base_point_mul(&self.z);
        let rhs = r_point + y_point * c;

        lhs == rhs
    }
}
