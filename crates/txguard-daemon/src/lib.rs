//! # txguard-daemon
//!
//! The guardian node's ambient service shell: configuration, structured
//! logging, and a JSON-RPC 2.0 façade over a Unix domain socket wrapping
//! [`txguard_coordinator::Coordinator`] and [`txguard_vdf::job::JobManager`].
//!
//! `spec.md` §6 sketches an HTTP mapping and explicitly calls it
//! non-normative, "retained for compatibility with the existing guardian
//! node". This daemon instead follows the teacher's own daemon shape —
//! line-delimited JSON-RPC 2.0 over a Unix socket
//! (`ochra_daemon::rpc::RpcServer`) — since that is the adapter the
//! corpus actually ships, not a web framework absent from its stack.

pub mod config;
pub mod rpc;

/// Errors surfaced by the daemon shell, on top of the typed errors the
/// core crates already define.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    /// Filesystem or socket I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unreadable configuration.
    #[error("invalid daemon configuration: {0}")]
    Config(String),

    /// A Coordinator operation failed.
    #[error(transparent)]
    Coordinator(#[from] txguard_coordinator::CoordinatorError),

    /// A VDF operation failed.
    #[error(transparent)]
    Vdf(#[from] txguard_vdf::VdfError),

    /// Hex/wire decoding of untrusted RPC input failed.
    #[error(transparent)]
    Wire(#[from] txguard_types::wire::WireError),

    /// The RPC request's `params` did not match what the method expects.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// No handler is registered for the requested method.
    #[error("unknown method: {0}")]
    UnknownMethod(String),
}
