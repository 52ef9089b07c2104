//! `peerwatchd run`: wire the monitors to the cluster and wait for Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use peerwatch_core::{MonitorLoop, RestartMonitor};
use peerwatch_kube::{KubeOrchestrator, KubeconfigSource};

use crate::settings::RunArgs;

pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = args.monitor.load()?;
    if config.local_id != args.monitor.node_name.trim() {
        info!(
            node_name = %args.monitor.node_name,
            local = %config.local_id,
            "local node name resolved to peer id"
        );
    }
    if !config.local_is_configured() {
        warn!(
            local = %config.local_id,
            "local node is not in the peer table; it will probe every peer but never evict"
        );
    }
    for peer in config.monitored_peers() {
        info!(peer = %peer.id, address = %peer.address, node = %peer.node_name, "monitoring peer");
    }

    let probe = args.monitor.probe()?;
    let source = KubeconfigSource::select(
        args.kube.read_k8s_config_file,
        args.kube.k8s_config_file.clone(),
    );
    let client = peerwatch_kube::connect(&source).await?;
    let orchestrator = Arc::new(KubeOrchestrator::new(client));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let restart = RestartMonitor::new(
        orchestrator.clone(),
        config.namespace.clone(),
        &args.restart.monitor_pods,
    )
    .with_max_restarts(args.restart.max_restarts);
    let restart_handle = if restart.is_enabled() {
        let interval = Duration::from_secs(args.restart.restart_interval.max(1));
        Some(tokio::spawn(restart.run(interval, shutdown_rx.clone())))
    } else {
        info!("no pods watched for restarts; restart monitor disabled");
        None
    };

    let monitor = MonitorLoop::new(config, probe, orchestrator);
    let mut monitor_handle = tokio::spawn(monitor.run(shutdown_rx));

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("shutdown signal received");
        }
        joined = &mut monitor_handle => {
            joined?;
            anyhow::bail!("peer monitor stopped unexpectedly");
        }
    }

    let _ = shutdown_tx.send(true);
    monitor_handle.await?;
    if let Some(handle) = restart_handle {
        handle.await?;
    }

    info!("peerwatchd stopped");
    Ok(())
}
