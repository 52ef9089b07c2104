//! Monitor configuration: the peer table, the authorization graph and the
//! cycle parameters.
//!
//! The peer table comes either from a TOML file:
//!
//! ```toml
//! [[peers]]
//! id = "node-1"
//! address = "10.0.0.11"
//! node_name = "worker-a"
//!
//! [authorization]
//! "node-1" = ["node-2", "node-3"]
//! ```
//!
//! or from the `WORKER{1,2,3}_IP` / `WORKER{1,2,3}_NAME` environment
//! variables, which map to peers `node-1` to `node-3`.
//!
//! The local identity is matched against peer ids first, then against the
//! legacy `worker-<n>` keys, then against node names, so a deployment that
//! sets `NODE_NAME=worker-1` still resolves to `node-1`.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::authority::AuthorizationGraph;
use crate::error::{ConfigError, ConfigResult};
use crate::types::{PeerId, PeerSpec, ProbeOptions};

pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_EVICTION_THRESHOLD: u32 = 3;
pub const DEFAULT_NAMESPACE: &str = "default";

/// Number of peers in the environment-variable layout.
const LEGACY_PEER_COUNT: usize = 3;

/// Prefix of the local identities used by the environment-variable layout.
const LEGACY_LOCAL_PREFIX: &str = "worker-";

/// Peers plus the graph deciding who may evict whom.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerTable {
    pub peers: Vec<PeerSpec>,
    pub graph: AuthorizationGraph,
}

#[derive(Debug, Deserialize)]
struct PeerFile {
    #[serde(default)]
    peers: Vec<PeerEntry>,
    authorization: Option<AuthorizationGraph>,
}

#[derive(Debug, Deserialize)]
struct PeerEntry {
    id: PeerId,
    #[serde(default)]
    address: String,
    node_name: Option<String>,
}

impl From<PeerEntry> for PeerSpec {
    fn from(entry: PeerEntry) -> Self {
        let node_name = entry
            .node_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| entry.id.clone());
        PeerSpec {
            id: entry.id,
            address: entry.address.trim().to_string(),
            node_name,
        }
    }
}

impl PeerTable {
    /// Load the peer table from a TOML file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse a peer table. Without an `[authorization]` table the reference
    /// three-node graph is used.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let file: PeerFile = toml::from_str(content)?;
        Ok(Self {
            peers: file.peers.into_iter().map(PeerSpec::from).collect(),
            graph: file
                .authorization
                .unwrap_or_else(AuthorizationGraph::reference),
        })
    }

    /// Build the three-peer table from `WORKER{n}_IP` / `WORKER{n}_NAME`.
    ///
    /// `lookup` resolves a variable name; pass `|k| std::env::var(k).ok()`
    /// in production. Missing addresses are left blank and rejected later
    /// by [`MonitorConfig::validate`].
    pub fn from_legacy_env<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let peers = (1..=LEGACY_PEER_COUNT)
            .map(|n| {
                PeerSpec::from(PeerEntry {
                    id: format!("node-{n}"),
                    address: lookup(&format!("WORKER{n}_IP")).unwrap_or_default(),
                    node_name: lookup(&format!("WORKER{n}_NAME")),
                })
            })
            .collect();

        Self {
            peers,
            graph: AuthorizationGraph::reference(),
        }
    }
}

/// Everything the monitor loop needs, validated once before the first cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Identity of the node this process runs on.
    pub local_id: PeerId,
    /// Namespace scope for workload queries.
    pub namespace: String,
    pub cycle_interval: Duration,
    pub eviction_threshold: u32,
    pub probe: ProbeOptions,
    /// All configured peers, possibly including the local node.
    pub peers: Vec<PeerSpec>,
    pub graph: AuthorizationGraph,
}

impl MonitorConfig {
    /// Configuration with default cycle parameters for `local_id`, resolved
    /// against the peer table.
    pub fn new(local_id: impl Into<PeerId>, table: PeerTable) -> Self {
        Self {
            local_id: resolve_local(&table.peers, local_id.into()),
            namespace: DEFAULT_NAMESPACE.to_string(),
            cycle_interval: DEFAULT_CYCLE_INTERVAL,
            eviction_threshold: DEFAULT_EVICTION_THRESHOLD,
            probe: ProbeOptions::default(),
            peers: table.peers,
            graph: table.graph,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_cycle_interval(mut self, interval: Duration) -> Self {
        self.cycle_interval = interval;
        self
    }

    pub fn with_eviction_threshold(mut self, threshold: u32) -> Self {
        self.eviction_threshold = threshold;
        self
    }

    pub fn with_probe(mut self, probe: ProbeOptions) -> Self {
        self.probe = probe;
        self
    }

    /// Reject configurations the monitor cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.peers.is_empty() {
            return Err(ConfigError::NoPeers);
        }

        let mut seen = HashSet::new();
        for peer in &self.peers {
            if !seen.insert(peer.id.as_str()) {
                return Err(ConfigError::DuplicatePeer(peer.id.clone()));
            }
            if peer.address.trim().is_empty() {
                return Err(ConfigError::MissingAddress(peer.id.clone()));
            }
        }

        if self.eviction_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if self.cycle_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.probe.attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if self.probe.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }

        for node in self.graph.nodes() {
            if node != &self.local_id && !seen.contains(node.as_str()) {
                return Err(ConfigError::UnknownGraphPeer(node.clone()));
            }
        }

        Ok(())
    }

    /// Whether the local id appears in the peer table.
    pub fn local_is_configured(&self) -> bool {
        self.peers.iter().any(|p| p.id == self.local_id)
    }

    /// Peers to probe: every configured peer except the local node, in
    /// configuration order.
    pub fn monitored_peers(&self) -> impl Iterator<Item = &PeerSpec> {
        self.peers.iter().filter(move |p| p.id != self.local_id)
    }
}

/// Map a local identity onto a configured peer id: an exact id match wins,
/// then `worker-<n>` for peer `node-<n>`, then a unique node name match.
/// Anything else is returned unchanged.
fn resolve_local(peers: &[PeerSpec], local: PeerId) -> PeerId {
    if peers.iter().any(|p| p.id == local) {
        return local;
    }

    if let Some(n) = local.strip_prefix(LEGACY_LOCAL_PREFIX) {
        let legacy = format!("node-{n}");
        if peers.iter().any(|p| p.id == legacy) {
            return legacy;
        }
    }

    let mut by_node = peers.iter().filter(|p| p.node_name == local);
    match (by_node.next(), by_node.next()) {
        (Some(peer), None) => peer.id.clone(),
        _ => local,
    }
}
