//! Monitor loop — the single control flow driving probes and evictions.
//!
//! Each cycle runs strictly in order:
//!
//! ```text
//! CLEAR_VIEW -> PROBE_PEERS -> UPDATE_TRACKER -> EVALUATE_EVICTIONS -> REPORT -> SLEEP
//! ```
//!
//! Peers are probed one at a time in configuration order, and evictions are
//! evaluated in the same order. The loop owns the tracker and the
//! connectivity view outright; nothing else mutates them.

use indexmap::IndexMap;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::authority::EvictionAuthority;
use crate::collaborators::{ClusterOrchestrator, ProbeClient};
use crate::config::MonitorConfig;
use crate::error::EvictionError;
use crate::eviction::{EvictionReport, evict_peer};
use crate::tracker::{PeerHealthTracker, Transition};
use crate::types::{ConnectivityView, PeerId, PeerRuntimeState};

/// Observable result of one cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// 1-based cycle counter.
    pub cycle: u64,
    /// Per-peer state after the cycle, in configuration order.
    pub peers: Vec<(PeerId, PeerRuntimeState)>,
    /// Peers reachable during this cycle, in probe order.
    pub connected: Vec<PeerId>,
    /// Whether the local node was allowed to evict anything this cycle.
    pub can_act: bool,
    /// Eviction attempts made this cycle.
    pub evictions: Vec<(PeerId, Result<EvictionReport, EvictionError>)>,
}

impl CycleReport {
    pub fn state(&self, peer: &str) -> Option<&PeerRuntimeState> {
        self.peers.iter().find(|(id, _)| id == peer).map(|(_, s)| s)
    }

    /// Total delete calls issued during the cycle.
    pub fn delete_calls(&self) -> usize {
        self.evictions
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok())
            .map(EvictionReport::delete_calls)
            .sum()
    }

    fn log(&self) {
        let states: IndexMap<&PeerId, &PeerRuntimeState> =
            self.peers.iter().map(|(id, s)| (id, s)).collect();
        let states = serde_json::to_string(&states).unwrap_or_default();

        info!(
            cycle = self.cycle,
            connected = %self.connected.join(", "),
            can_act = self.can_act,
            states = %states,
            "monitor cycle complete"
        );
    }
}

/// Drives probing, failure tracking and eviction for the local node.
pub struct MonitorLoop<P, O> {
    config: MonitorConfig,
    tracker: PeerHealthTracker,
    view: ConnectivityView,
    authority: EvictionAuthority,
    probe: P,
    orchestrator: O,
    cycle: u64,
}

impl<P, O> MonitorLoop<P, O>
where
    P: ProbeClient,
    O: ClusterOrchestrator,
{
    /// Create a monitor for a validated configuration.
    pub fn new(config: MonitorConfig, probe: P, orchestrator: O) -> Self {
        let tracker = PeerHealthTracker::new(config.monitored_peers().map(|p| p.id.clone()));
        let authority = EvictionAuthority::new(config.graph.clone());
        Self {
            config,
            tracker,
            view: ConnectivityView::new(),
            authority,
            probe,
            orchestrator,
            cycle: 0,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn tracker(&self) -> &PeerHealthTracker {
        &self.tracker
    }

    /// Connectivity observed by the most recent cycle.
    pub fn connectivity(&self) -> &ConnectivityView {
        &self.view
    }

    /// Run a single cycle, without the trailing sleep.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.cycle += 1;
        let local = self.config.local_id.as_str();
        let threshold = self.config.eviction_threshold;

        self.view.clear();

        for peer in self.config.monitored_peers() {
            let outcome = self.probe.probe(&peer.address, &self.config.probe).await;
            if outcome.reachable {
                self.view.insert(&peer.id);
            }

            match self.tracker.record_probe(&peer.id, outcome.reachable) {
                Some(Transition::Recovered) => {
                    info!(peer = %peer.id, address = %peer.address, "peer reconnected");
                }
                Some(Transition::Healthy) => {
                    debug!(peer = %peer.id, address = %peer.address, "probe successful");
                }
                Some(Transition::Failed {
                    consecutive_failures,
                }) => {
                    warn!(
                        peer = %peer.id,
                        address = %peer.address,
                        failures = consecutive_failures,
                        threshold,
                        "peer failed health check"
                    );
                }
                None => {}
            }

            if let Some(rtt) = outcome.rtt {
                debug!(
                    peer = %peer.id,
                    min_ms = rtt.min_ms,
                    avg_ms = rtt.avg_ms,
                    max_ms = rtt.max_ms,
                    "probe round-trip"
                );
            }
        }

        let mut evictions = Vec::new();
        for peer in self.config.monitored_peers() {
            if !self.tracker.is_eligible(&peer.id, threshold)
                || !self.authority.is_authorized(local, &peer.id, &self.view)
            {
                continue;
            }

            error!(
                peer = %peer.id,
                local = %local,
                threshold,
                "peer exceeded maximum failures; evicting its workloads"
            );

            let result = evict_peer(
                &self.orchestrator,
                &mut self.tracker,
                peer,
                &self.config.namespace,
            )
            .await;
            log_eviction(&peer.id, &result);
            evictions.push((peer.id.clone(), result));
        }

        let report = CycleReport {
            cycle: self.cycle,
            peers: self.tracker.snapshot(),
            connected: self.view.iter().cloned().collect(),
            can_act: self.authority.can_act_at_all(local, &self.view),
            evictions,
        };
        report.log();
        report
    }

    /// Run cycles until `shutdown` flips or its sender is dropped.
    ///
    /// The signal is only observed during the sleep between cycles, so a
    /// cycle in progress always completes.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            local = %self.config.local_id,
            namespace = %self.config.namespace,
            interval_secs = self.config.cycle_interval.as_secs_f64(),
            threshold = self.config.eviction_threshold,
            peers = self.tracker.len(),
            "peer monitor started"
        );

        loop {
            self.run_cycle().await;

            tokio::select! {
                _ = tokio::time::sleep(self.config.cycle_interval) => {}
                _ = shutdown.changed() => {
                    info!("peer monitor shutting down");
                    break;
                }
            }
        }
    }
}

fn log_eviction(peer: &str, result: &Result<EvictionReport, EvictionError>) {
    match result {
        Ok(EvictionReport::AlreadyHandled) => {
            info!(%peer, "workloads already deleted during this outage; waiting for reconnection");
        }
        Ok(EvictionReport::NoWorkloads { node_name }) => {
            info!(%peer, node = %node_name, "no workloads found on node");
        }
        Ok(EvictionReport::Attempted {
            node_name,
            deleted,
            failed,
        }) => {
            for name in deleted {
                info!(%peer, node = %node_name, workload = %name, "deleted workload");
            }
            for (name, e) in failed {
                error!(%peer, node = %node_name, workload = %name, error = %e, "failed to delete workload");
            }
            warn!(
                %peer,
                node = %node_name,
                deleted = deleted.len(),
                failed = failed.len(),
                "peer marked down; workloads will not be deleted again until it reconnects"
            );
        }
        Err(e) => {
            error!(%peer, error = %e, "eviction attempt failed");
        }
    }
}
