//! Value types for the VDF engine: challenges, proofs, and job snapshots.

use std::time::{Duration, SystemTime};

use num_bigint::BigUint;

/// A request to compute a VDF proof.
#[derive(Clone, Debug)]
pub struct VdfChallenge {
    /// Opaque input bytes (e.g. a transaction hash) the delay is bound to.
    pub input: Vec<u8>,
    /// When the challenge was created.
    pub timestamp: SystemTime,
    /// Number of sequential squarings `T`.
    pub iterations: u64,
    /// Whether this challenge was raised by the flagging pipeline
    /// (informational only; does not change prover/verifier behavior).
    pub flagged: bool,
}

/// A completed Wesolowski proof: `{y, π, T, computeTime}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VdfProof {
    /// Output `y = x^{2^T} mod N`.
    pub output: BigUint,
    /// Proof `π = x^{⌊2^T / ℓ⌋} mod N`.
    pub proof: BigUint,
    /// Iteration count this proof was computed for.
    pub iterations: u64,
    /// Wall-clock time the computation took. `None` for the bypass sentinel.
    pub compute_time: Option<Duration>,
}

impl VdfProof {
    /// The bypass artifact `{y=0, π=ε, T=0}` accepted by the verifier as
    /// an explicit, non-cryptographic sentinel (`spec.md` §4.E.2, §6).
    pub fn zero_proof() -> Self {
        Self {
            output: BigUint::from(0u32),
            proof: BigUint::from(0u32),
            iterations: 0,
            compute_time: None,
        }
    }
}

/// Outcome of [`crate::wesolowski::verify`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VdfVerification {
    /// Whether the proof was accepted.
    pub valid: bool,
    /// Human-readable reason, e.g. `"bypass"` or `"invalid proof"`.
    pub message: String,
}

/// A job's lifecycle status. Transitions are monotone except that
/// `Computing -> Bypassed` may occur at any cooperative yield point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VdfJobState {
    /// Scheduled but not yet picked up by a worker.
    Pending,
    /// Actively squaring.
    Computing,
    /// Completed with a valid proof.
    Ready,
    /// The prover failed internally.
    Failed,
    /// Bypassed before completion; carries the zero-proof sentinel.
    Bypassed,
}

/// A stable, owned snapshot of a job's progress.
#[derive(Clone, Debug)]
pub struct VdfJobStatus {
    /// Current lifecycle state.
    pub status: VdfJobState,
    /// Progress in `[0, 100]`.
    pub progress: u8,
    /// Estimated remaining time, if a rate estimate is available.
    pub estimated_time_left: Option<Duration>,
    /// The proof, once `status` is `Ready` or `Bypassed`.
    pub proof: Option<VdfProof>,
    /// The failure reason, once `status` is `Failed`.
    pub error: Option<String>,
}
