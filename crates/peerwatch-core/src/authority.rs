//! Eviction authorization.
//!
//! Which node may evict which peer's workloads is a static directed graph
//! loaded with the configuration. A node additionally refuses to act while
//! it cannot reach any peer at all (self-isolation guard): a partitioned
//! node must not declare the rest of the cluster dead.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::{ConnectivityView, PeerId};

/// Directed graph over peer ids. An edge `A -> B` means "A may evict B's
/// workloads".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorizationGraph {
    edges: BTreeMap<PeerId, BTreeSet<PeerId>>,
}

impl AuthorizationGraph {
    /// An empty graph: nobody may evict anybody.
    pub fn new() -> Self {
        Self::default()
    }

    /// The three-node reference topology:
    /// `node-1 -> {node-2, node-3}`, `node-2 -> {node-1}`, `node-3 -> {}`.
    pub fn reference() -> Self {
        Self::new()
            .with_edge("node-1", "node-2")
            .with_edge("node-1", "node-3")
            .with_edge("node-2", "node-1")
            .with_node("node-3")
    }

    pub fn with_edge(mut self, from: impl Into<PeerId>, to: impl Into<PeerId>) -> Self {
        self.add_edge(from, to);
        self
    }

    /// Declare a node with no outgoing edges.
    pub fn with_node(mut self, node: impl Into<PeerId>) -> Self {
        self.edges.entry(node.into()).or_default();
        self
    }

    pub fn add_edge(&mut self, from: impl Into<PeerId>, to: impl Into<PeerId>) {
        self.edges.entry(from.into()).or_default().insert(to.into());
    }

    /// Direct successors of `node`; empty for unknown nodes.
    pub fn successors(&self, node: &str) -> impl Iterator<Item = &PeerId> {
        self.edges.get(node).into_iter().flatten()
    }

    pub fn has_outgoing(&self, node: &str) -> bool {
        self.edges.get(node).is_some_and(|s| !s.is_empty())
    }

    /// Whether `target` is a direct successor of `local`.
    pub fn may_evict(&self, local: &str, target: &str) -> bool {
        self.edges.get(local).is_some_and(|s| s.contains(target))
    }

    /// Every id mentioned in the graph, as a source or a target.
    pub fn nodes(&self) -> BTreeSet<&PeerId> {
        self.edges
            .iter()
            .flat_map(|(from, to)| std::iter::once(from).chain(to.iter()))
            .collect()
    }
}

/// Stateless decision function over the authorization graph.
#[derive(Debug, Clone)]
pub struct EvictionAuthority {
    graph: AuthorizationGraph,
}

impl EvictionAuthority {
    pub fn new(graph: AuthorizationGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &AuthorizationGraph {
        &self.graph
    }

    /// Whether `local` may evict anything this cycle: it must see at least
    /// one peer and own at least one outgoing edge.
    pub fn can_act_at_all(&self, local: &str, view: &ConnectivityView) -> bool {
        !view.is_empty() && self.graph.has_outgoing(local)
    }

    pub fn may_evict(&self, local: &str, target: &str) -> bool {
        self.graph.may_evict(local, target)
    }

    pub fn is_authorized(&self, local: &str, target: &str, view: &ConnectivityView) -> bool {
        self.can_act_at_all(local, view) && self.may_evict(local, target)
    }
}

impl Default for EvictionAuthority {
    fn default() -> Self {
        Self::new(AuthorizationGraph::reference())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODES: [&str; 3] = ["node-1", "node-2", "node-3"];

    fn connected(peers: &[&str]) -> ConnectivityView {
        peers.iter().collect()
    }

    #[test]
    fn reference_graph_exhaustive() {
        let authority = EvictionAuthority::default();
        let view = connected(&["node-1", "node-2", "node-3"]);

        let allowed = [("node-1", "node-2"), ("node-1", "node-3"), ("node-2", "node-1")];

        for local in NODES {
            for target in NODES {
                let expected = allowed.contains(&(local, target));
                assert_eq!(
                    authority.is_authorized(local, target, &view),
                    expected,
                    "{local} -> {target}"
                );
            }
        }
    }

    #[test]
    fn empty_view_blocks_every_target() {
        let authority = EvictionAuthority::default();
        let view = ConnectivityView::new();

        for local in NODES {
            assert!(!authority.can_act_at_all(local, &view));
            for target in NODES {
                assert!(!authority.is_authorized(local, target, &view));
            }
        }
    }

    #[test]
    fn single_reachable_peer_is_enough() {
        let authority = EvictionAuthority::default();
        let view = connected(&["node-3"]);
        assert!(authority.can_act_at_all("node-1", &view));
        assert!(authority.is_authorized("node-1", "node-2", &view));
    }

    #[test]
    fn node_without_edges_never_acts() {
        let authority = EvictionAuthority::default();
        let view = connected(&["node-1", "node-2"]);
        assert!(!authority.can_act_at_all("node-3", &view));
        assert!(!authority.is_authorized("node-3", "node-1", &view));
        assert!(!authority.is_authorized("node-3", "node-2", &view));
    }

    #[test]
    fn unknown_local_node_never_acts() {
        let authority = EvictionAuthority::default();
        let view = connected(&["node-1"]);
        assert!(!authority.can_act_at_all("node-7", &view));
        assert!(!authority.may_evict("node-7", "node-1"));
    }

    #[test]
    fn graph_generalizes_beyond_three_nodes() {
        let graph = AuthorizationGraph::new()
            .with_edge("a", "b")
            .with_edge("b", "c")
            .with_edge("c", "d");
        assert!(graph.may_evict("b", "c"));
        assert!(!graph.may_evict("a", "c"));
        assert_eq!(graph.nodes().len(), 4);
        assert_eq!(graph.successors("a").count(), 1);
        assert_eq!(graph.successors("d").count(), 0);
    }

    #[test]
    fn graph_deserializes_from_toml_table() {
        let graph: AuthorizationGraph = toml::from_str(
            r#"
"node-1" = ["node-2", "node-3"]
"node-2" = ["node-1"]
"node-3" = []
"#,
        )
        .unwrap();
        assert_eq!(graph, AuthorizationGraph::reference());
    }
}
