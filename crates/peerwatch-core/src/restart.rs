//! Restart monitor — deletes watched workloads that keep crashing.
//!
//! Runs independently of the peer monitor. Every scan lists the workloads
//! in the namespace and deletes each watched workload whose highest
//! container restart count exceeds the limit, so the orchestrator
//! reschedules it from scratch.

use std::collections::HashSet;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use crate::collaborators::ClusterOrchestrator;
use crate::error::OrchestratorError;

pub const DEFAULT_MAX_RESTARTS: u32 = 1;
pub const DEFAULT_RESTART_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Outcome of a single restart scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestartScanReport {
    /// Watched workloads found in the namespace.
    pub inspected: usize,
    pub deleted: Vec<String>,
    pub failed: Vec<(String, OrchestratorError)>,
}

/// Watches a fixed list of workload names for excessive restarts.
pub struct RestartMonitor<O> {
    orchestrator: O,
    namespace: String,
    watched: HashSet<String>,
    max_restarts: u32,
}

impl<O: ClusterOrchestrator> RestartMonitor<O> {
    pub fn new<I, S>(orchestrator: O, namespace: impl Into<String>, watched: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let watched = watched
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self {
            orchestrator,
            namespace: namespace.into(),
            watched,
            max_restarts: DEFAULT_MAX_RESTARTS,
        }
    }

    pub fn with_max_restarts(mut self, max_restarts: u32) -> Self {
        self.max_restarts = max_restarts;
        self
    }

    /// Whether any workload is being watched.
    pub fn is_enabled(&self) -> bool {
        !self.watched.is_empty()
    }

    /// List the namespace once and delete every watched workload over the
    /// restart limit. A list failure aborts the scan; delete failures are
    /// collected in the report.
    pub async fn scan_once(&self) -> Result<RestartScanReport, OrchestratorError> {
        let workloads = self.orchestrator.list_workloads(&self.namespace).await?;
        let mut report = RestartScanReport::default();

        for workload in workloads
            .into_iter()
            .filter(|w| self.watched.contains(&w.name))
        {
            report.inspected += 1;
            if workload.restart_count <= self.max_restarts {
                continue;
            }

            info!(
                workload = %workload.name,
                restarts = workload.restart_count,
                max = self.max_restarts,
                "restart limit exceeded; deleting workload"
            );
            match self
                .orchestrator
                .delete_workload(&workload.name, &self.namespace)
                .await
            {
                Ok(()) => {
                    info!(workload = %workload.name, namespace = %self.namespace, "deleted workload");
                    report.deleted.push(workload.name);
                }
                Err(e) => {
                    error!(workload = %workload.name, error = %e, "failed to delete workload");
                    report.failed.push((workload.name, e));
                }
            }
        }

        Ok(report)
    }

    /// Scan every `interval` until `shutdown` flips.
    pub async fn run(self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut watched: Vec<_> = self.watched.iter().map(String::as_str).collect();
        watched.sort_unstable();
        info!(
            namespace = %self.namespace,
            watched = %watched.join(", "),
            max_restarts = self.max_restarts,
            interval_secs = interval.as_secs(),
            "restart monitor started"
        );

        loop {
            if let Err(e) = self.scan_once().await {
                error!(namespace = %self.namespace, error = %e, "restart scan failed");
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => {
                    info!("restart monitor shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockOrchestrator;

    #[tokio::test]
    async fn below_limit_is_left_alone() {
        let orch = MockOrchestrator::new().with_restarts("pod1", 1);
        let monitor = RestartMonitor::new(orch, "ns", ["pod1"]);

        let report = monitor.scan_once().await.unwrap();

        assert_eq!(report.inspected, 1);
        assert!(report.deleted.is_empty());
        assert!(monitor.orchestrator.deleted().is_empty());
    }

    #[tokio::test]
    async fn over_limit_is_deleted() {
        let orch = MockOrchestrator::new()
            .with_restarts("pod1", 2)
            .with_restarts("pod2", 0);
        let monitor = RestartMonitor::new(orch, "ns", ["pod1", "pod2"]);

        let report = monitor.scan_once().await.unwrap();

        assert_eq!(report.deleted, vec!["pod1"]);
        assert_eq!(monitor.orchestrator.deleted(), vec!["pod1"]);
    }

    #[tokio::test]
    async fn unwatched_workloads_are_ignored() {
        let orch = MockOrchestrator::new().with_restarts("other", 50);
        let monitor = RestartMonitor::new(orch, "ns", ["pod1"]);

        let report = monitor.scan_once().await.unwrap();

        assert_eq!(report.inspected, 0);
        assert!(monitor.orchestrator.deleted().is_empty());
    }

    #[tokio::test]
    async fn custom_limit() {
        let orch = MockOrchestrator::new().with_restarts("pod1", 4);
        let monitor = RestartMonitor::new(orch, "ns", ["pod1"]).with_max_restarts(5);

        assert!(monitor.scan_once().await.unwrap().deleted.is_empty());
    }

    #[tokio::test]
    async fn list_failure_is_returned() {
        let orch = MockOrchestrator::new().with_restarts("pod1", 9).failing_list();
        let monitor = RestartMonitor::new(orch, "ns", ["pod1"]);

        assert!(monitor.scan_once().await.is_err());
        assert!(monitor.orchestrator.deleted().is_empty());
    }

    #[tokio::test]
    async fn delete_failure_is_collected() {
        let orch = MockOrchestrator::new()
            .with_restarts("pod1", 3)
            .with_restarts("pod2", 3)
            .failing_delete("pod1");
        let monitor = RestartMonitor::new(orch, "ns", ["pod1", "pod2"]);

        let report = monitor.scan_once().await.unwrap();

        assert_eq!(report.deleted, vec!["pod2"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "pod1");
    }

    #[test]
    fn blank_names_do_not_enable_monitor() {
        let monitor = RestartMonitor::new(MockOrchestrator::new(), "ns", ["", "  "]);
        assert!(!monitor.is_enabled());

        let monitor = RestartMonitor::new(MockOrchestrator::new(), "ns", [" pod1 "]);
        assert!(monitor.is_enabled());
        assert!(monitor.watched.contains("pod1"));
    }
}
