//! Domain types shared by the tracker, the authority and the monitor loop.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Identifier of a configured peer (e.g. `node-2`).
pub type PeerId = String;

/// Static description of one monitored peer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeerSpec {
    pub id: PeerId,
    /// Address handed to the probe client (IP, hostname or `host:port`).
    pub address: String,
    /// Name of the cluster node whose workloads belong to this peer.
    pub node_name: String,
}

/// Per-peer runtime state, created at startup and kept for the process lifetime.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeerRuntimeState {
    pub consecutive_failures: u32,
    pub is_down: bool,
    pub evicted_this_outage: bool,
}

/// Peers confirmed reachable during the current cycle only.
///
/// Insertion order is preserved so reports list peers in probe order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectivityView {
    reachable: Vec<PeerId>,
}

impl ConnectivityView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.reachable.clear();
    }

    /// Record a peer as reachable. Inserting the same peer twice is a no-op.
    pub fn insert(&mut self, peer: &str) {
        if !self.contains(peer) {
            self.reachable.push(peer.to_string());
        }
    }

    pub fn contains(&self, peer: &str) -> bool {
        self.reachable.iter().any(|p| p == peer)
    }

    pub fn is_empty(&self) -> bool {
        self.reachable.is_empty()
    }

    pub fn len(&self) -> usize {
        self.reachable.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerId> {
        self.reachable.iter()
    }
}

impl<S: AsRef<str>> FromIterator<S> for ConnectivityView {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut view = ConnectivityView::new();
        for peer in iter {
            view.insert(peer.as_ref());
        }
        view
    }
}

/// Options passed to every reachability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOptions {
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Number of echo attempts per probe.
    pub attempts: u32,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            attempts: 2,
        }
    }
}

/// Round-trip statistics in milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RttStats {
    pub min_ms: f64,
    pub avg_ms: f64,
    pub max_ms: f64,
}

impl RttStats {
    /// Summarize a set of samples. Returns `None` for an empty slice.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let min_ms = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max_ms = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg_ms = samples.iter().sum::<f64>() / samples.len() as f64;
        Some(Self {
            min_ms,
            avg_ms,
            max_ms,
        })
    }
}

/// Result of a single reachability probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeOutcome {
    pub reachable: bool,
    pub rtt: Option<RttStats>,
}

impl ProbeOutcome {
    pub fn reachable(rtt: Option<RttStats>) -> Self {
        Self {
            reachable: true,
            rtt,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            rtt: None,
        }
    }
}

/// A workload (pod) as seen by the cluster orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Workload {
    pub name: String,
    /// Node the workload is scheduled on, if any.
    pub node_name: Option<String>,
    /// Highest restart count among the workload's containers.
    pub restart_count: u32,
}

impl Workload {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_name: None,
            restart_count: 0,
        }
    }
}
