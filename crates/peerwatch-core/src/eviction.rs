//! The eviction protocol run against a peer judged down.
//!
//! 1. List the workloads scheduled on the peer's node.
//! 2. An empty list ends the attempt without touching the tracker: no
//!    workloads does not count as a completed eviction.
//! 3. Otherwise delete every listed workload; individual failures are
//!    collected and do not stop the remaining deletions.
//! 4. Mark the outage handled, whatever the individual delete outcomes.
//!
//! The outcome is returned to the monitor loop, which logs it.

use tracing::debug;

use crate::collaborators::ClusterOrchestrator;
use crate::error::{EvictionError, OrchestratorError};
use crate::tracker::PeerHealthTracker;
use crate::types::PeerSpec;

/// Outcome of one eviction attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvictionReport {
    /// The peer was already evicted during this outage; no API call was made.
    AlreadyHandled,
    /// Nothing was scheduled on the peer's node; the peer stays unmarked.
    NoWorkloads { node_name: String },
    /// Deletion was attempted for every listed workload and the peer is now
    /// marked down and evicted.
    Attempted {
        node_name: String,
        deleted: Vec<String>,
        failed: Vec<(String, OrchestratorError)>,
    },
}

impl EvictionReport {
    /// Number of delete calls issued.
    pub fn delete_calls(&self) -> usize {
        match self {
            EvictionReport::Attempted {
                deleted, failed, ..
            } => deleted.len() + failed.len(),
            _ => 0,
        }
    }
}

/// Run the eviction protocol for `peer`.
///
/// A list failure returns [`EvictionError::ListWorkloads`] and leaves the
/// tracker unchanged, so the next cycle retries.
pub async fn evict_peer<O>(
    orchestrator: &O,
    tracker: &mut PeerHealthTracker,
    peer: &PeerSpec,
    namespace: &str,
) -> Result<EvictionReport, EvictionError>
where
    O: ClusterOrchestrator + ?Sized,
{
    let state = tracker
        .state(&peer.id)
        .ok_or_else(|| EvictionError::UnknownPeer(peer.id.clone()))?;
    if state.evicted_this_outage {
        return Ok(EvictionReport::AlreadyHandled);
    }

    let workloads = orchestrator
        .list_workloads_by_node(namespace, &peer.node_name)
        .await
        .map_err(|source| EvictionError::ListWorkloads {
            peer: peer.id.clone(),
            source,
        })?;

    if workloads.is_empty() {
        return Ok(EvictionReport::NoWorkloads {
            node_name: peer.node_name.clone(),
        });
    }

    debug!(peer = %peer.id, count = workloads.len(), "deleting workloads");

    let mut deleted = Vec::new();
    let mut failed = Vec::new();
    for workload in workloads {
        match orchestrator.delete_workload(&workload.name, namespace).await {
            Ok(()) => deleted.push(workload.name),
            Err(e) => failed.push((workload.name, e)),
        }
    }

    tracker.mark_evicted(&peer.id);

    Ok(EvictionReport::Attempted {
        node_name: peer.node_name.clone(),
        deleted,
        failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockOrchestrator;
    use crate::types::PeerRuntimeState;

    fn peer() -> PeerSpec {
        PeerSpec {
            id: "node-2".to_string(),
            address: "10.0.0.2".to_string(),
            node_name: "worker-b".to_string(),
        }
    }

    fn down_tracker() -> PeerHealthTracker {
        let mut tracker = PeerHealthTracker::new(["node-2", "node-3"]);
        for _ in 0..3 {
            tracker.record_probe("node-2", false);
        }
        tracker
    }

    #[tokio::test]
    async fn deletes_every_workload_on_node() {
        let orch = MockOrchestrator::new()
            .with_workload("pod1", "worker-b")
            .with_workload("pod2", "worker-b")
            .with_workload("pod3", "worker-c");
        let mut tracker = down_tracker();

        let report = evict_peer(&orch, &mut tracker, &peer(), "ns").await.unwrap();

        assert_eq!(
            report,
            EvictionReport::Attempted {
                node_name: "worker-b".to_string(),
                deleted: vec!["pod1".to_string(), "pod2".to_string()],
                failed: vec![],
            }
        );
        assert_eq!(orch.deleted(), vec!["pod1", "pod2"]);
        let state = tracker.state("node-2").unwrap();
        assert!(state.is_down);
        assert!(state.evicted_this_outage);
    }

    #[tokio::test]
    async fn empty_list_leaves_state_untouched() {
        let orch = MockOrchestrator::new().with_workload("pod3", "worker-c");
        let mut tracker = down_tracker();
        let before = *tracker.state("node-2").unwrap();

        let report = evict_peer(&orch, &mut tracker, &peer(), "ns").await.unwrap();

        assert_eq!(
            report,
            EvictionReport::NoWorkloads {
                node_name: "worker-b".to_string()
            }
        );
        assert!(orch.deleted().is_empty());
        assert_eq!(*tracker.state("node-2").unwrap(), before);
        assert!(!before.is_down);
    }

    #[tokio::test]
    async fn delete_failure_does_not_stop_others() {
        let orch = MockOrchestrator::new()
            .with_workload("pod1", "worker-b")
            .with_workload("pod2", "worker-b")
            .failing_delete("pod1");
        let mut tracker = down_tracker();

        let report = evict_peer(&orch, &mut tracker, &peer(), "ns").await.unwrap();

        match &report {
            EvictionReport::Attempted {
                deleted, failed, ..
            } => {
                assert_eq!(deleted, &vec!["pod2".to_string()]);
                assert_eq!(failed.len(), 1);
                assert_eq!(failed[0].0, "pod1");
            }
            other => panic!("unexpected report: {other:?}"),
        }
        assert_eq!(report.delete_calls(), 2);
        assert!(tracker.state("node-2").unwrap().evicted_this_outage);
    }

    #[tokio::test]
    async fn list_failure_is_contained() {
        let orch = MockOrchestrator::new()
            .with_workload("pod1", "worker-b")
            .failing_list();
        let mut tracker = down_tracker();

        let err = evict_peer(&orch, &mut tracker, &peer(), "ns")
            .await
            .unwrap_err();

        assert!(matches!(err, EvictionError::ListWorkloads { ref peer, .. } if peer == "node-2"));
        assert!(orch.deleted().is_empty());
        let state = tracker.state("node-2").unwrap();
        assert!(!state.is_down);
        assert!(!state.evicted_this_outage);
    }

    #[tokio::test]
    async fn already_evicted_peer_makes_no_calls() {
        let orch = MockOrchestrator::new().with_workload("pod1", "worker-b");
        let mut tracker = down_tracker();
        tracker.mark_evicted("node-2");

        let report = evict_peer(&orch, &mut tracker, &peer(), "ns").await.unwrap();

        assert_eq!(report, EvictionReport::AlreadyHandled);
        assert_eq!(orch.list_calls(), 0);
    }

    #[tokio::test]
    async fn unknown_peer_is_an_error() {
        let orch = MockOrchestrator::new();
        let mut tracker = PeerHealthTracker::new(["node-3"]);

        let err = evict_peer(&orch, &mut tracker, &peer(), "ns")
            .await
            .unwrap_err();

        assert_eq!(err, EvictionError::UnknownPeer("node-2".to_string()));
        assert_eq!(*tracker.state("node-3").unwrap(), PeerRuntimeState::default());
    }
}
