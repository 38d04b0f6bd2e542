//! Line-delimited JSON-RPC 2.0 over a Unix domain socket.
//!
//! One process per guardian node; each connection is handled on its own
//! task, reading newline-delimited JSON requests and writing
//! newline-delimited JSON responses, following the shape of the
//! teacher's `ochra_daemon::rpc::RpcServer` (`BufReader::read_line` loop,
//! a single `dispatch_request` match, standard JSON-RPC error codes plus
//! a handful of application-specific ones).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

use txguard_coordinator::Coordinator;
use txguard_crypto::participant::{FrostCommitment, SignatureShare};
use txguard_types::wire::{self, FrostSignatureWire, VdfProofWire};
use txguard_vdf::job::JobManager;
use txguard_vdf::types::{VdfChallenge, VdfJobState};

use crate::DaemonError;

// Standard JSON-RPC 2.0 error codes.
const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const INTERNAL_ERROR: i64 = -32603;

// Application-specific error codes.
const CODE_UNKNOWN_SESSION: i64 = -32010;
const CODE_WRONG_PHASE: i64 = -32011;
const CODE_CRYPTO: i64 = -32012;
const CODE_VDF: i64 = -32013;

#[derive(Debug, Deserialize)]
struct RpcRequest {
    #[allow(dead_code)]
    jsonrpc: Option<String>,
    id: Value,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct RpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl RpcResponse {
    fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn err(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Shared state handed to every connection: the Coordinator and
/// JobManager for this guardian node.
pub struct DaemonState {
    pub coordinator: Arc<Coordinator>,
    pub job_manager: Arc<JobManager>,
}

/// The JSON-RPC server: accepts connections on a Unix domain socket and
/// dispatches each request to [`DaemonState`].
pub struct RpcServer {
    listener: UnixListener,
    state: Arc<DaemonState>,
}

impl RpcServer {
    /// Bind a new server to `socket_path`, removing a stale socket file
    /// left behind by a previous unclean shutdown.
    pub fn bind(socket_path: &std::path::Path, state: Arc<DaemonState>) -> Result<Self, DaemonError> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)?;
        }
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let listener = UnixListener::bind(socket_path)?;
        Ok(Self { listener, state })
    }

    /// Accept connections until `shutdown` resolves.
    pub async fn serve(self, mut shutdown: tokio::sync::oneshot::Receiver<()>) -> Result<(), DaemonError> {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, _addr) = accepted?;
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(err) = handle_connection(stream, state).await {
                            tracing::warn!(%err, "RPC connection ended with an error");
                        }
                    });
                }
                _ = &mut shutdown => {
                    tracing::info!("RPC server shutting down");
                    return Ok(());
                }
            }
        }
    }
}

async fn handle_connection(stream: UnixStream, state: Arc<DaemonState>) -> Result<(), DaemonError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(request) => {
                let id = request.id.clone();
                let method = request.method.clone();
                match dispatch_request(&state, request) {
                    Ok(result) => RpcResponse::ok(id, result),
                    Err(err) => RpcResponse::err(id, error_code(&err), err.to_string()),
                }
                .tap_log(&method)
            }
            Err(err) => RpcResponse::err(Value::Null, PARSE_ERROR, format!("parse error: {err}")),
        };

        let mut payload = serde_json::to_vec(&response).map_err(|e| DaemonError::Config(e.to_string()))?;
        payload.push(b'\n');
        writer.write_all(&payload).await?;
    }

    Ok(())
}

trait TapLog {
    fn tap_log(self, method: &str) -> Self;
}

impl TapLog for RpcResponse {
    fn tap_log(self, method: &str) -> Self {
        if let Some(err) = &self.error {
            tracing::warn!(method, code = err.code, message = %err.message, "RPC call failed");
        } else {
            tracing::debug!(method, "RPC call succeeded");
        }
        self
    }
}

fn error_code(err: &DaemonError) -> i64 {
    match err {
        DaemonError::InvalidParams(_) => INVALID_PARAMS,
        DaemonError::UnknownMethod(_) => METHOD_NOT_FOUND,
        DaemonError::Coordinator(txguard_coordinator::CoordinatorError::UnknownSession) => CODE_UNKNOWN_SESSION,
        DaemonError::Coordinator(txguard_coordinator::CoordinatorError::WrongPhase)
        | DaemonError::Coordinator(txguard_coordinator::CoordinatorError::PrematureRead) => CODE_WRONG_PHASE,
        DaemonError::Coordinator(_) => CODE_CRYPTO,
        DaemonError::Vdf(_) => CODE_VDF,
        DaemonError::Wire(_) => INVALID_PARAMS,
        DaemonError::Io(_) | DaemonError::Config(_) => INTERNAL_ERROR,
    }
}

fn params_of<T: for<'de> Deserialize<'de>>(params: Value) -> Result<T, DaemonError> {
    serde_json::from_value(params).map_err(|e| DaemonError::InvalidParams(e.to_string()))
}

fn dispatch_request(state: &DaemonState, request: RpcRequest) -> Result<Value, DaemonError> {
    match request.method.as_str() {
        "start_session" => start_session(state, request.params),
        "get_commitment_list" => get_commitment_list(state, request.params),
        "submit_commitment" => submit_commitment(state, request.params),
        "submit_signature_share" => submit_signature_share(state, request.params),
        "aggregate_signature" => aggregate_signature(state, request.params),
        "get_session_status" => get_session_status(state, request.params),
        "cleanup_session" => cleanup_session(state, request.params),
        "vdf_request" => vdf_request(state, request.params),
        "vdf_status" => vdf_status(state, request.params),
        "vdf_bypass" => vdf_bypass(state, request.params),
        other => Err(DaemonError::UnknownMethod(other.to_string())),
    }
}

#[derive(Deserialize)]
struct StartSessionParams {
    proposal_id: String,
    message: String,
}

fn start_session(state: &DaemonState, params: Value) -> Result<Value, DaemonError> {
    let params: StartSessionParams = params_of(params)?;
    let message = wire::decode_hex(&params.message)?;
    let session_id = state.coordinator.start_session(params.proposal_id, message);
    Ok(json!({ "session_id": hex::encode(session_id) }))
}

fn decode_session_id(s: &str) -> Result<[u8; 16], DaemonError> {
    let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
        .map_err(|e| DaemonError::InvalidParams(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| DaemonError::InvalidParams("session_id must be 16 bytes".to_string()))
}

#[derive(Deserialize)]
struct SessionIdParams {
    session_id: String,
}

fn get_commitment_list(state: &DaemonState, params: Value) -> Result<Value, DaemonError> {
    let params: SessionIdParams = params_of(params)?;
    let session_id = decode_session_id(&params.session_id)?;
    let commitments = state.coordinator.get_commitment_list(session_id)?;
    let wire_commitments: Vec<Value> = commitments
        .iter()
        .map(|c| {
            json!({
                "guardian_id": c.guardian_id,
                "hiding_nonce": wire::encode_point(&c.hiding_nonce),
                "binding_nonce": wire::encode_point(&c.binding_nonce),
            })
        })
        .collect();
    Ok(json!({ "commitments": wire_commitments }))
}

#[derive(Deserialize)]
struct SubmitCommitmentParams {
    session_id: String,
    guardian_id: u16,
    hiding_nonce: String,
    binding_nonce: String,
}

fn submit_commitment(state: &DaemonState, params: Value) -> Result<Value, DaemonError> {
    let params: SubmitCommitmentParams = params_of(params)?;
    let session_id = decode_session_id(&params.session_id)?;
    let commitment = FrostCommitment {
        guardian_id: params.guardian_id,
        hiding_nonce: wire::decode_point(&params.hiding_nonce)?,
        binding_nonce: wire::decode_point(&params.binding_nonce)?,
    };
    state
        .coordinator
        .submit_commitment(session_id, params.guardian_id, commitment)?;
    Ok(json!({ "accepted": true }))
}

#[derive(Deserialize)]
struct SubmitShareParams {
    session_id: String,
    guardian_id: u16,
    z_share: String,
}

fn submit_signature_share(state: &DaemonState, params: Value) -> Result<Value, DaemonError> {
    let params: SubmitShareParams = params_of(params)?;
    let session_id = decode_session_id(&params.session_id)?;
    let share = SignatureShare {
        guardian_id: params.guardian_id,
        z_share: wire::decode_scalar(&params.z_share)?,
    };
    state
        .coordinator
        .submit_signature_share(session_id, params.guardian_id, share)?;
    Ok(json!({ "accepted": true }))
}

fn aggregate_signature(state: &DaemonState, params: Value) -> Result<Value, DaemonError> {
    let params: SessionIdParams = params_of(params)?;
    let session_id = decode_session_id(&params.session_id)?;
    let signature = state.coordinator.aggregate_signature(session_id)?;
    let wire_signature = FrostSignatureWire {
        r: wire::encode_point(&signature.r),
        z: wire::encode_scalar(&signature.z),
        group_public_key: wire::encode_point(&signature.group_public_key),
    };
    Ok(serde_json::to_value(wire_signature).expect("wire signature always serializes"))
}

fn get_session_status(state: &DaemonState, params: Value) -> Result<Value, DaemonError> {
    let params: SessionIdParams = params_of(params)?;
    let session_id = decode_session_id(&params.session_id)?;
    match state.coordinator.get_session_status(session_id) {
        Some(status) => Ok(json!({
            "status": format!("{:?}", status.status).to_lowercase(),
            "commitments_received": status.commitments_received,
            "shares_received": status.shares_received,
            "threshold_required": status.threshold_required,
        })),
        None => Err(DaemonError::Coordinator(
            txguard_coordinator::CoordinatorError::UnknownSession,
        )),
    }
}

fn cleanup_session(state: &DaemonState, params: Value) -> Result<Value, DaemonError> {
    let params: SessionIdParams = params_of(params)?;
    let session_id = decode_session_id(&params.session_id)?;
    state.coordinator.cleanup_session(session_id)?;
    Ok(json!({ "removed": true }))
}

#[derive(Deserialize)]
struct VdfRequestParams {
    input: String,
    iterations: u64,
    #[serde(default)]
    flagged: bool,
}

fn vdf_request(state: &DaemonState, params: Value) -> Result<Value, DaemonError> {
    let params: VdfRequestParams = params_of(params)?;
    let input = wire::decode_hex(&params.input)?;
    let challenge = VdfChallenge {
        input,
        timestamp: std::time::SystemTime::now(),
        iterations: params.iterations,
        flagged: params.flagged,
    };
    let job_id = state.job_manager.create_job(challenge);
    Ok(json!({ "job_id": job_id.to_string() }))
}

#[derive(Deserialize)]
struct JobIdParams {
    job_id: String,
}

fn parse_job_id(s: &str) -> Result<uuid::Uuid, DaemonError> {
    uuid::Uuid::parse_str(s).map_err(|e| DaemonError::InvalidParams(e.to_string()))
}

fn vdf_status(state: &DaemonState, params: Value) -> Result<Value, DaemonError> {
    let params: JobIdParams = params_of(params)?;
    let job_id = parse_job_id(&params.job_id)?;
    match state.job_manager.get_status(job_id) {
        Some(status) => {
            let state_name = match status.status {
                VdfJobState::Pending => "pending",
                VdfJobState::Computing => "computing",
                VdfJobState::Ready => "ready",
                VdfJobState::Failed => "failed",
                VdfJobState::Bypassed => "bypassed",
            };
            Ok(json!({
                "status": state_name,
                "progress": status.progress,
                "estimated_time_left_ms": status.estimated_time_left.map(|d| d.as_millis() as u64),
                "proof": status.proof.map(|p| VdfProofWire {
                    output: wire::encode_vdf_element(&p.output),
                    proof: wire::encode_vdf_element(&p.proof),
                    iterations: p.iterations,
                }),
                "error": status.error,
            }))
        }
        None => Err(DaemonError::InvalidParams("unknown job_id".to_string())),
    }
}

fn vdf_bypass(state: &DaemonState, params: Value) -> Result<Value, DaemonError> {
    let params: JobIdParams = params_of(params)?;
    let job_id = parse_job_id(&params.job_id)?;
    let bypassed = state.job_manager.bypass_job(job_id);
    Ok(json!(bypassed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use txguard_crypto::dkg::{self, DkgConfig};

    fn test_state() -> Arc<DaemonState> {
        let config = DkgConfig::new(2, 3).expect("2-of-3 is a valid config");
        let output = dkg::deal(&config).expect("dealing never fails for a valid config");
        Arc::new(DaemonState {
            coordinator: Arc::new(Coordinator::new(output.group_public_key, 2)),
            job_manager: Arc::new(JobManager::new(&txguard_vdf::params::MODULUS, true)),
        })
    }

    #[test]
    fn test_unknown_method_returns_not_found_code() {
        let state = test_state();
        let err = dispatch_request(
            &state,
            RpcRequest {
                jsonrpc: None,
                id: json!(1),
                method: "does_not_exist".to_string(),
                params: json!({}),
            },
        )
        .unwrap_err();
        assert_eq!(error_code(&err), METHOD_NOT_FOUND);
    }

    #[test]
    fn test_start_session_round_trip() {
        let state = test_state();
        let result = start_session(
            &state,
            json!({ "proposal_id": "p-1", "message": "0x74657374" }),
        )
        .expect("starting a session with valid params always succeeds");
        assert!(
            result["session_id"]
                .as_str()
                .expect("session_id is always a string")
                .len()
                == 32
        );
    }

    #[test]
    fn test_unknown_session_status_maps_to_app_code() {
        let state = test_state();
        let err = get_session_status(&state, json!({ "session_id": "00".repeat(16) })).unwrap_err();
        assert_eq!(error_code(&err), CODE_UNKNOWN_SESSION);
    }
}
