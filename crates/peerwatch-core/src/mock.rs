//! In-memory collaborators for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::collaborators::{BoxFuture, ClusterOrchestrator, ProbeClient};
use crate::error::OrchestratorError;
use crate::types::{ProbeOptions, ProbeOutcome, Workload};

/// Probe answering from a per-address reachability table. Unknown
/// addresses are unreachable.
#[derive(Default)]
pub(crate) struct MockProbe {
    reachable: Mutex<HashMap<String, bool>>,
    calls: Mutex<Vec<String>>,
}

impl MockProbe {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set(&self, address: &str, reachable: bool) {
        self.reachable
            .lock()
            .unwrap()
            .insert(address.to_string(), reachable);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProbeClient for MockProbe {
    fn probe<'a>(
        &'a self,
        address: &'a str,
        _options: &'a ProbeOptions,
    ) -> BoxFuture<'a, ProbeOutcome> {
        self.calls.lock().unwrap().push(address.to_string());
        let up = self
            .reachable
            .lock()
            .unwrap()
            .get(address)
            .copied()
            .unwrap_or(false);
        Box::pin(async move {
            if up {
                ProbeOutcome::reachable(None)
            } else {
                ProbeOutcome::unreachable()
            }
        })
    }
}

/// Orchestrator over a fixed workload list that records every call.
#[derive(Default)]
pub(crate) struct MockOrchestrator {
    workloads: Vec<Workload>,
    fail_list: bool,
    fail_list_on: HashSet<String>,
    fail_delete: HashSet<String>,
    deleted: Mutex<Vec<String>>,
    list_calls: Mutex<usize>,
}

impl MockOrchestrator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_workload(mut self, name: &str, node: &str) -> Self {
        self.workloads.push(Workload {
            name: name.to_string(),
            node_name: Some(node.to_string()),
            restart_count: 0,
        });
        self
    }

    pub(crate) fn with_restarts(mut self, name: &str, restart_count: u32) -> Self {
        self.workloads.push(Workload {
            name: name.to_string(),
            node_name: None,
            restart_count,
        });
        self
    }

    pub(crate) fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    /// Fail listing only for workloads on `node`.
    pub(crate) fn failing_list_on(mut self, node: &str) -> Self {
        self.fail_list_on.insert(node.to_string());
        self
    }

    pub(crate) fn failing_delete(mut self, name: &str) -> Self {
        self.fail_delete.insert(name.to_string());
        self
    }

    /// Names passed to `delete_workload`, successful or not.
    pub(crate) fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub(crate) fn list_calls(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }

    fn list(&self, node: Option<&str>) -> Result<Vec<Workload>, OrchestratorError> {
        *self.list_calls.lock().unwrap() += 1;
        if self.fail_list || node.is_some_and(|n| self.fail_list_on.contains(n)) {
            return Err(OrchestratorError::Api("connection refused".to_string()));
        }
        Ok(self
            .workloads
            .iter()
            .filter(|w| node.is_none() || w.node_name.as_deref() == node)
            .cloned()
            .collect())
    }
}

impl ClusterOrchestrator for MockOrchestrator {
    fn list_workloads_by_node<'a>(
        &'a self,
        _namespace: &'a str,
        node_name: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Workload>, OrchestratorError>> {
        let result = self.list(Some(node_name));
        Box::pin(async move { result })
    }

    fn list_workloads<'a>(
        &'a self,
        _namespace: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Workload>, OrchestratorError>> {
        let result = self.list(None);
        Box::pin(async move { result })
    }

    fn delete_workload<'a>(
        &'a self,
        name: &'a str,
        _namespace: &'a str,
    ) -> BoxFuture<'a, Result<(), OrchestratorError>> {
        self.deleted.lock().unwrap().push(name.to_string());
        let result = if self.fail_delete.contains(name) {
            Err(OrchestratorError::Api(format!("cannot delete {name}")))
        } else {
            Ok(())
        };
        Box::pin(async move { result })
    }
}
