//! # txguard-crypto
//!
//! FROST Ed25519 threshold-signature primitives for the guardian pipeline.
//!
//! This crate implements the trust root described in the guardian
//! execution pipeline's core specification: a trusted-dealer DKG with
//! Feldman VSS, and the per-guardian half of two-round FROST signing.
//! The Coordinator state machine that orchestrates a signing session
//! across guardians lives in `txguard-coordinator`; it depends on the
//! transcript math exposed here so both sides of the protocol compute
//! binding factors, group commitments, and Lagrange coefficients the
//! same way.
//!
//! ## Modules
//!
//! - [`dkg`] — Trusted-dealer DKG and Feldman VSS share verification.
//! - [`transcript`] — Shared FROST transcript math (hash-to-scalar,
//!   binding factors, group commitment, Lagrange coefficients).
//! - [`participant`] — Per-guardian nonce lifecycle and signature shares.
//! - [`signature`] — The aggregated FROST signature type and its
//!   Schnorr-style verification predicate.

pub mod dkg;
pub mod participant;
pub mod signature;
pub mod transcript;

/// Maximum number of participants supported by the one-byte guardian-id
/// encoding used in the binding-factor transcript (see
/// [`transcript::binding_factors`]).
pub const MAX_PARTICIPANTS: usize = 255;

/// Opaque session identifier shared by a [`participant::Participant`] and
/// the Coordinator across a signing or DKG session's lifetime.
pub type SessionId = [u8; 16];

/// Error types for FROST cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum FrostError {
    /// Invalid `(t, n)` DKG configuration.
    #[error("invalid DKG configuration: {0}")]
    Config(String),

    /// A Participant already holds nonces for this session.
    #[error("nonce collision: commitments already generated for this session")]
    NonceCollision,

    /// A Participant was asked to sign for a session it never committed to,
    /// or whose nonces were already consumed or cleared.
    #[error("no stored nonces for this session")]
    NonceMissing,

    /// Two participant ids evaluate to the same Lagrange interpolation
    /// point, making the denominator zero.
    #[error("duplicate participant id in signer set")]
    DuplicateParticipant,

    /// Fewer commitments were supplied than the threshold requires.
    #[error("insufficient commitments: need at least {required}, got {actual}")]
    InvalidCommitmentCount {
        /// Minimum commitments required.
        required: usize,
        /// Commitments actually supplied.
        actual: usize,
    },

    /// A point or scalar failed to decode from its canonical bytes.
    #[error("failed to decode curve point or scalar: {0}")]
    Decode(String),
}

/// Convenience result type for FROST cryptographic operations.
pub type Result<T> = std::result::Result<T, FrostError>;
