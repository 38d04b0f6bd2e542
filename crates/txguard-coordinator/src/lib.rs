//! The FROST Coordinator: a per-session state machine that collects
//! commitments and signature shares from guardians, aggregates, and
//! verifies before handing back a signature.
//!
//! Grounded on the teacher's `ochra_frost::roast::RoastSession` (a
//! `SessionState` enum driving `receive_share` through collection phases)
//! and `ochra_frost::dkg::DkgCeremony` (round-gated state transitions with
//! `tracing` progress logging at each step). Sessions are independent of
//! each other: the coordinator takes a short read lock to find a
//! session's `Arc<Mutex<_>>`, then serializes all mutation of that one
//! session through its own mutex, so unrelated sessions never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, SystemTime};

use rand_core::RngCore;
use txguard_crypto::participant::{FrostCommitment, SignatureShare};
use txguard_crypto::signature::FrostSignature;
use txguard_crypto::transcript;
use txguard_crypto::{FrostError, SessionId};

/// Errors returned by [`Coordinator`] operations.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// No session exists for the given id.
    #[error("unknown session")]
    UnknownSession,

    /// The requested operation is not valid for the session's current phase.
    #[error("operation not valid in the session's current phase")]
    WrongPhase,

    /// `getCommitmentList` called before the session reached `signature`.
    #[error("commitment list not readable before the signature phase")]
    PrematureRead,

    /// A guardian re-submitted a commitment or share it already sent.
    #[error("duplicate submission for this guardian in this session")]
    DuplicateSubmission,

    /// A guardian submitted a signature share without a prior commitment.
    #[error("guardian submitted a share without a prior commitment in this session")]
    MissingCommitment,

    /// `commitment.guardian_id`/`share.guardian_id` did not match the
    /// claimed submitter.
    #[error("submitted guardian id does not match the claimed identity")]
    IdentityMismatch,

    /// The aggregated signature failed self-verification. Terminal: the
    /// session transitions to `failed` and is never retried automatically.
    #[error("aggregated signature failed verification")]
    AggregationFailure,

    /// `cleanupSession` called on a session that has not reached a
    /// terminal state.
    #[error("session is not in a terminal state")]
    SessionNotTerminal,

    /// The underlying FROST transcript math failed (e.g. a duplicate
    /// participant id slipped through canonicalization).
    #[error("FROST transcript error: {0}")]
    Crypto(#[from] FrostError),
}

type Result<T> = std::result::Result<T, CoordinatorError>;

/// A session's lifecycle phase, per the core specification's state
/// machine: `commitment -> signature -> {complete | failed}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    /// Collecting round-1 commitments; not yet at threshold.
    Commitment,
    /// At or above threshold commitments; collecting round-2 shares.
    Signature,
    /// Aggregated and self-verified successfully. Terminal.
    Complete,
    /// Aggregation failed self-verification. Terminal.
    Failed,
}

impl SessionStatus {
    fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Complete | SessionStatus::Failed)
    }
}

struct SigningSession {
    proposal_id: String,
    message: Vec<u8>,
    status: SessionStatus,
    commitments: HashMap<u16, FrostCommitment>,
    shares: HashMap<u16, SignatureShare>,
    created_at: SystemTime,
}

/// A stable, owned snapshot of a session's progress. Never a reference
/// into the coordinator's internal map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigningSessionStatus {
    /// Current lifecycle phase.
    pub status: SessionStatus,
    /// Number of commitments received so far.
    pub commitments_received: usize,
    /// Number of signature shares received so far.
    pub shares_received: usize,
    /// The `t` required to advance past `commitment` / complete the session.
    pub threshold_required: u16,
}

/// The Coordinator: orchestrates FROST signing sessions for one guardian
/// group keyed by its group public key and threshold.
pub struct Coordinator {
    group_public_key: curve25519_dalek::edwards::CompressedEdwardsY,
    threshold: u16,
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<SigningSession>>>>,
}

impl Coordinator {
    /// Construct a coordinator for a guardian group with the given group
    /// public key `Y` and signing threshold `t`.
    pub fn new(group_public_key: curve25519_dalek::edwards::CompressedEdwardsY, threshold: u16) -> Self {
        Self {
            group_public_key,
            threshold,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    fn find_session(&self, session_id: &SessionId) -> Result<Arc<Mutex<SigningSession>>> {
        self.sessions
            .read()
            .expect("sessions lock poisoned")
            .get(session_id)
            .cloned()
            .ok_or(CoordinatorError::UnknownSession)
    }

    /// Start a new session for `proposal_id` signing `message`, returning
    /// a fresh random 16-byte session id in the `commitment` phase.
    pub fn start_session(&self, proposal_id: String, message: Vec<u8>) -> SessionId {
        let mut session_id = [0u8; 16];
        rand_core::OsRng.fill_bytes(&mut session_id);

        let session = SigningSession {
            proposal_id,
            message,
            status: SessionStatus::Commitment,
            commitments: HashMap::new(),
            shares: HashMap::new(),
            created_at: SystemTime::now(),
        };

        self.sessions
            .write()
            .expect("sessions lock poisoned")
            .insert(session_id, Arc::new(Mutex::new(session)));

        tracing::info!(session_id = %hex::encode(session_id), "signing session started");
        session_id
    }

    /// Submit guardian `guardian_id`'s round-1 commitment. Once the
    /// threshold is met, atomically transitions the session to `signature`.
    pub fn submit_commitment(
        &self,
        session_id: SessionId,
        guardian_id: u16,
        commitment: FrostCommitment,
    ) -> Result<()> {
        let session_arc = self.find_session(&session_id)?;
        let mut session = session_arc.lock().expect("session mutex poisoned");

        if session.status != SessionStatus::Commitment {
            return Err(CoordinatorError::WrongPhase);
        }
        if commitment.guardian_id != guardian_id {
            return Err(CoordinatorError::IdentityMismatch);
        }
        if session.commitments.contains_key(&guardian_id) {
            return Err(CoordinatorError::DuplicateSubmission);
        }

        session.commitments.insert(guardian_id, commitment);
        tracing::debug!(
            session_id = %hex::encode(session_id),
            guardian_id,
            received = session.commitments.len(),
            "commitment received"
        );

        if session.commitments.len() >= self.threshold as usize {
            session.status = SessionStatus::Signature;
            tracing::info!(session_id = %hex::encode(session_id), "session reached threshold commitments, advancing to signature phase");
        }

        Ok(())
    }

    /// Return a stable snapshot of the canonicalized commitment list, only
    /// once the session has left the `commitment` phase.
    pub fn get_commitment_list(&self, session_id: SessionId) -> Result<Vec<FrostCommitment>> {
        let session_arc = self.find_session(&session_id)?;
        let session = session_arc.lock().expect("session mutex poisoned");

        if session.status == SessionStatus::Commitment {
            return Err(CoordinatorError::PrematureRead);
        }

        let mut commitments: Vec<FrostCommitment> = session.commitments.values().cloned().collect();
        commitments.sort_by_key(|c| c.guardian_id);
        Ok(commitments)
    }

    /// Submit guardian `guardian_id`'s round-2 signature share. The
    /// guardian must have previously submitted a commitment in this
    /// session.
    pub fn submit_signature_share(
        &self,
        session_id: SessionId,
        guardian_id: u16,
        share: SignatureShare,
    ) -> Result<()> {
        let session_arc = self.find_session(&session_id)?;
        let mut session = session_arc.lock().expect("session mutex poisoned");

        if session.status != SessionStatus::Signature {
            return Err(CoordinatorError::WrongPhase);
        }
        if share.guardian_id != guardian_id {
            return Err(CoordinatorError::IdentityMismatch);
        }
        if !session.commitments.contains_key(&guardian_id) {
            return Err(CoordinatorError::MissingCommitment);
        }
        if session.shares.contains_key(&guardian_id) {
            return Err(CoordinatorError::DuplicateSubmission);
        }

        session.shares.insert(guardian_id, share);
        tracing::debug!(
            session_id = %hex::encode(session_id),
            guardian_id,
            received = session.shares.len(),
            "signature share received"
        );

        Ok(())
    }

    /// Aggregate all received shares into a [`FrostSignature`], verifying
    /// it against the session's message and the group public key before
    /// returning it. On verification failure the session transitions to
    /// `failed` and is never retried automatically.
    pub fn aggregate_signature(&self, session_id: SessionId) -> Result<FrostSignature> {
        let session_arc = self.find_session(&session_id)?;
        let mut session = session_arc.lock().expect("session mutex poisoned");

        if session.status != SessionStatus::Signature {
            return Err(CoordinatorError::WrongPhase);
        }
        if session.shares.len() < self.threshold as usize {
            return Err(CoordinatorError::WrongPhase);
        }

        let commitments: Vec<FrostCommitment> = session.commitments.values().cloned().collect();
        let canonical = transcript::canonicalize_commitments(&commitments)?;
        let binding = transcript::binding_factors(&session.message, &canonical);
        let group_r = transcript::group_commitment(&canonical, &binding)?.compress();

        let z: curve25519_dalek::scalar::Scalar = session.shares.values().map(|s| s.z_share).sum();

        let signature = FrostSignature {
            r: group_r,
            z,
            group_public_key: self.group_public_key,
        };

        if !signature.verify(&session.message) {
            session.status = SessionStatus::Failed;
            tracing::error!(session_id = %hex::encode(session_id), "aggregated signature failed self-verification");
            return Err(CoordinatorError::AggregationFailure);
        }

        session.status = SessionStatus::Complete;
        tracing::info!(session_id = %hex::encode(session_id), "session complete, signature aggregated and verified");
        Ok(signature)
    }

    /// Return a stable snapshot of a session's progress, or `None` if the
    /// session does not exist.
    pub fn get_session_status(&self, session_id: SessionId) -> Option<SigningSessionStatus> {
        let session_arc = self.find_session(&session_id).ok()?;
        let session = session_arc.lock().expect("session mutex poisoned");
        Some(SigningSessionStatus {
            status: session.status,
            commitments_received: session.commitments.len(),
            shares_received: session.shares.len(),
            threshold_required: self.threshold,
        })
    }

    /// Remove a session, only if it has reached a terminal state.
    pub fn cleanup_session(&self, session_id: SessionId) -> Result<()> {
        let session_arc = self.find_session(&session_id)?;
        {
            let session = session_arc.lock().expect("session mutex poisoned");
            if !session.status.is_terminal() {
                return Err(CoordinatorError::SessionNotTerminal);
            }
        }
        self.sessions
            .write()
            .expect("sessions lock poisoned")
            .remove(&session_id);
        tracing::debug!(session_id = %hex::encode(session_id), "session cleaned up");
        Ok(())
    }

    /// Return the `proposalId` and message for `session_id`, if it exists.
    pub fn session_proposal(&self, session_id: SessionId) -> Option<(String, Vec<u8>)> {
        let session_arc = self.find_session(&session_id).ok()?;
        let session = session_arc.lock().expect("session mutex poisoned");
        Some((session.proposal_id.clone(), session.message.clone()))
    }

    /// Spawn a background task that periodically removes terminal
    /// sessions older than `max_age`. Opt-in: `cleanup_session` remains
    /// the normative way to release a session; this sweeper only ever
    /// touches sessions already in `Complete`/`Failed`, per the core
    /// spec's requirement that any sweeper "MUST only remove terminal
    /// sessions".
    pub fn spawn_terminal_sweeper(
        self: &Arc<Self>,
        sweep_interval: Duration,
        max_age: Duration,
    ) -> tokio::task::JoinHandle<()> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep_interval);
            loop {
                interval.tick().await;
                coordinator.sweep_terminal_sessions(max_age);
            }
        })
    }

    fn sweep_terminal_sessions(&self, max_age: Duration) {
        let stale: Vec<SessionId> = {
            let sessions = self.sessions.read().expect("sessions lock poisoned");
            sessions
                .iter()
                .filter_map(|(id, session_arc)| {
                    let session = session_arc.lock().expect("session mutex poisoned");
                    let old_enough = session
                        .created_at
                        .elapsed()
                        .map(|age| age >= max_age)
                        .unwrap_or(false);
                    (session.status.is_terminal() && old_enough).then_some(*id)
                })
                .collect()
        };

        if stale.is_empty() {
            return;
        }
        let mut sessions = self.sessions.write().expect("sessions lock poisoned");
        for id in &stale {
            sessions.remove(id);
        }
        tracing::debug!(count = stale.len(), "terminal sweeper removed stale sessions");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txguard_crypto::dkg::{self, DkgConfig};
    use txguard_crypto::participant::Participant;

    fn build_group(t: u16, n: u16) -> (Coordinator, Vec<Participant>) {
        let config = DkgConfig::new(t, n).expect("caller passes a valid (t, n) pair");
        let output = dkg::deal(&config).expect("dealing never fails for a valid config");
        let participants = output
            .guardian_shares
            .iter()
            .map(|s| Participant::new(s.participant_id, t, s.secret_share, output.group_public_key))
            .collect();
        (Coordinator::new(output.group_public_key, t), participants)
    }

    #[test]
    fn test_full_session_lifecycle() {
        let (coordinator, mut participants) = build_group(2, 3);
        let message = b"move funds".to_vec();
        let session_id = coordinator.start_session("proposal-1".to_string(), message.clone());

        assert!(matches!(
            coordinator.get_commitment_list(session_id),
            Err(CoordinatorError::PrematureRead)
        ));

        for participant in participants.iter_mut().take(2) {
            let commitment = participant
                .generate_commitment(session_id)
                .expect("first commitment for a fresh session always succeeds");
            coordinator
                .submit_commitment(session_id, participant.id(), commitment)
                .expect("a fresh guardian commitment is always accepted");
        }

        let status = coordinator
            .get_session_status(session_id)
            .expect("session was just started");
        assert_eq!(status.status, SessionStatus::Signature);

        let commitments = coordinator
            .get_commitment_list(session_id)
            .expect("threshold commitments were just submitted");
        for participant in participants.iter_mut().take(2) {
            let share = participant
                .generate_signature_share(session_id, &message, &commitments)
                .expect("threshold commitments are present");
            coordinator
                .submit_signature_share(session_id, participant.id(), share)
                .expect("a fresh guardian signature share is always accepted");
        }

        let signature = coordinator
            .aggregate_signature(session_id)
            .expect("threshold signature shares were just submitted");
        assert!(signature.verify(&message));

        let status = coordinator
            .get_session_status(session_id)
            .expect("session was just completed");
        assert_eq!(status.status, SessionStatus::Complete);

        coordinator
            .cleanup_session(session_id)
            .expect("a complete session is always cleanable");
        assert!(coordinator.get_session_status(session_id).is_none());
    }

    #[test]
    fn test_duplicate_commitment_rejected() {
        let (coordinator, mut participants) = build_group(2, 3);
        let session_id = coordinator.start_session("p".to_string(), b"m".to_vec());
        let commitment = participants[0]
            .generate_commitment(session_id)
            .expect("first commitment for a fresh session always succeeds");
        coordinator
            .submit_commitment(session_id, 0, commitment.clone())
            .expect("a fresh guardian commitment is always accepted");
        let err = coordinator
            .submit_commitment(session_id, 0, commitment)
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::DuplicateSubmission));
    }

    #[test]
    fn test_identity_mismatch_rejected() {
        let (coordinator, mut participants) = build_group(2, 3);
        let session_id = coordinator.start_session("p".to_string(), b"m".to_vec());
        let commitment = participants[0]
            .generate_commitment(session_id)
            .expect("first commitment for a fresh session always succeeds");
        let err = coordinator
            .submit_commitment(session_id, 1, commitment)
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::IdentityMismatch));
    }

    #[test]
    fn test_cleanup_before_terminal_rejected() {
        let (coordinator, _participants) = build_group(2, 3);
        let session_id = coordinator.start_session("p".to_string(), b"m".to_vec());
        let err = coordinator.cleanup_session(session_id).unwrap_err();
        assert!(matches!(err, CoordinatorError::SessionNotTerminal));
    }

    #[tokio::test]
    async fn test_terminal_sweeper_only_removes_complete_sessions() {
        let (coordinator, _participants) = build_group(2, 3);
        let coordinator = Arc::new(coordinator);
        let live_session = coordinator.start_session("p".to_string(), b"m".to_vec());

        coordinator.sweep_terminal_sessions(Duration::from_secs(0));
        assert!(coordinator.get_session_status(live_session).is_some());
    }
}
