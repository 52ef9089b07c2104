//! Narrow contracts for the two external collaborators of the monitor.
//!
//! Both traits return boxed futures so implementations can be injected as
//! trait objects or generics and replaced by in-memory doubles in tests.

use std::future::Future;
use std::pin::Pin;

use crate::error::OrchestratorError;
use crate::types::{ProbeOptions, ProbeOutcome, Workload};

/// Boxed `Send` future borrowed for `'a`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Issues reachability probes against peer addresses.
///
/// A probe never fails: transport errors, timeouts and spawn failures are
/// reported as [`ProbeOutcome::unreachable`].
pub trait ProbeClient: Send + Sync {
    fn probe<'a>(&'a self, address: &'a str, options: &'a ProbeOptions)
    -> BoxFuture<'a, ProbeOutcome>;
}

/// Lists and deletes workloads in the cluster.
pub trait ClusterOrchestrator: Send + Sync {
    /// Workloads in `namespace` scheduled on `node_name`.
    fn list_workloads_by_node<'a>(
        &'a self,
        namespace: &'a str,
        node_name: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Workload>, OrchestratorError>>;

    /// Every workload in `namespace`.
    fn list_workloads<'a>(
        &'a self,
        namespace: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Workload>, OrchestratorError>>;

    fn delete_workload<'a>(
        &'a self,
        name: &'a str,
        namespace: &'a str,
    ) -> BoxFuture<'a, Result<(), OrchestratorError>>;
}

impl<T: ProbeClient + ?Sized> ProbeClient for std::sync::Arc<T> {
    fn probe<'a>(
        &'a self,
        address: &'a str,
        options: &'a ProbeOptions,
    ) -> BoxFuture<'a, ProbeOutcome> {
        (**self).probe(address, options)
    }
}

impl<T: ClusterOrchestrator + ?Sized> ClusterOrchestrator for std::sync::Arc<T> {
    fn list_workloads_by_node<'a>(
        &'a self,
        namespace: &'a str,
        node_name: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Workload>, OrchestratorError>> {
        (**self).list_workloads_by_node(namespace, node_name)
    }

    fn list_workloads<'a>(
        &'a self,
        namespace: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Workload>, OrchestratorError>> {
        (**self).list_workloads(namespace)
    }

    fn delete_workload<'a>(
        &'a self,
        name: &'a str,
        namespace: &'a str,
    ) -> BoxFuture<'a, Result<(), OrchestratorError>> {
        (**self).delete_workload(name, namespace)
    }
}
