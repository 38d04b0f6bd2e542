//! # txguard-vdf
//!
//! Wesolowski Verifiable Delay Function engine: prover, verifier, and a
//! cooperative job manager that schedules long sequential squarings
//! alongside guardian bypass requests.
//!
//! ## Modules
//!
//! - [`params`] — the fixed RSA-2048 group modulus.
//! - [`types`] — challenge, proof, and job-status value types.
//! - [`wesolowski`] — the prover and verifier functions.
//! - [`job`] — [`job::JobManager`], the async-facing scheduler.

pub mod job;
pub mod params;
pub mod types;
pub mod wesolowski;

/// Errors for the VDF engine.
#[derive(Debug, thiserror::Error)]
pub enum VdfError {
    /// Invalid configuration (e.g. mock proofs requested without `dev_mode`).
    #[error("invalid VDF configuration: {0}")]
    Config(String),

    /// The prover failed internally.
    #[error("VDF computation failed: {0}")]
    Computation(String),

    /// The verifier could not parse or reconstruct a proof.
    #[error("VDF verification failed: {0}")]
    Verification(String),
}

/// Convenience result type for the VDF engine.
pub type Result<T> = std::result::Result<T, VdfError>;
