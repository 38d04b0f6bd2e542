//! Guardian node daemon entry point: load configuration, run the DKG-issued
//! group parameters into a Coordinator and JobManager, and serve the
//! JSON-RPC façade until shutdown.

use std::sync::Arc;

use txguard_coordinator::Coordinator;
use txguard_daemon::config::DaemonConfig;
use txguard_daemon::rpc::{DaemonState, RpcServer};
use txguard_vdf::job::JobManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = DaemonConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .init();

    tracing::info!(
        threshold = config.frost.threshold,
        total_participants = config.frost.total_participants,
        socket = %config.socket_path.display(),
        "starting txguard-daemon"
    );

    // A production deployment loads the group public key issued by the
    // DKG dealer out of band; this placeholder mirrors the teacher's
    // `ochra_daemon` which also starts with an "unlocked identity" left
    // for an operator to provision. Real callers build the Coordinator
    // with the group's actual key before serving requests.
    let (group_public_key, _shares) = bootstrap_group_key(&config);
    let coordinator = Arc::new(Coordinator::new(group_public_key, config.frost.threshold));
    let job_manager = Arc::new(JobManager::new(&txguard_vdf::params::MODULUS, config.vdf.dev_mode));

    coordinator.spawn_terminal_sweeper(
        std::time::Duration::from_secs(config.vdf.sweep_interval_secs),
        std::time::Duration::from_secs(config.vdf.job_max_age_secs),
    );

    let state = Arc::new(DaemonState {
        coordinator,
        job_manager,
    });
    let server = RpcServer::bind(&config.socket_path, state)?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    server.serve(shutdown_rx).await?;
    Ok(())
}

fn bootstrap_group_key(
    config: &DaemonConfig,
) -> (
    curve25519_dalek::edwards::CompressedEdwardsY,
    Vec<txguard_crypto::dkg::GuardianKeyShare>,
) {
    let dkg_config =
        txguard_crypto::dkg::DkgConfig::new(config.frost.threshold, config.frost.total_participants)
            .expect("daemon config carries a valid (t, n)");
    let output = txguard_crypto::dkg::deal(&dkg_config).expect("trusted-dealer DKG never fails for a valid config");
    (output.group_public_key, output.guardian_shares)
}
