//! Pod listing and deletion through the Kubernetes API.

use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, DeleteParams, ListParams};
use kube::{Client, ResourceExt};
use tracing::debug;

use peerwatch_core::{BoxFuture, ClusterOrchestrator, OrchestratorError, Workload};

/// [`ClusterOrchestrator`] backed by a `kube::Client`.
#[derive(Clone)]
pub struct KubeOrchestrator {
    client: Client,
}

impl KubeOrchestrator {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn list(
        &self,
        namespace: &str,
        params: &ListParams,
    ) -> Result<Vec<Workload>, OrchestratorError> {
        let pods = self.pods(namespace).list(params).await.map_err(map_error)?;
        Ok(pods.items.iter().filter_map(workload_from_pod).collect())
    }

    async fn delete(&self, name: &str, namespace: &str) -> Result<(), OrchestratorError> {
        self.pods(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map_err(map_error)?;
        debug!(%name, %namespace, "pod delete accepted");
        Ok(())
    }
}

impl ClusterOrchestrator for KubeOrchestrator {
    fn list_workloads_by_node<'a>(
        &'a self,
        namespace: &'a str,
        node_name: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Workload>, OrchestratorError>> {
        Box::pin(async move {
            let params = ListParams::default().fields(&node_selector(node_name));
            self.list(namespace, &params).await
        })
    }

    fn list_workloads<'a>(
        &'a self,
        namespace: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Workload>, OrchestratorError>> {
        Box::pin(async move { self.list(namespace, &ListParams::default()).await })
    }

    fn delete_workload<'a>(
        &'a self,
        name: &'a str,
        namespace: &'a str,
    ) -> BoxFuture<'a, Result<(), OrchestratorError>> {
        Box::pin(self.delete(name, namespace))
    }
}

/// Field selector matching pods bound to `node_name`.
fn node_selector(node_name: &str) -> String {
    format!("spec.nodeName={node_name}")
}

/// Convert a pod into a [`Workload`]. Pods without a name are skipped.
pub fn workload_from_pod(pod: &Pod) -> Option<Workload> {
    let name = pod.metadata.name.clone()?;
    let node_name = pod.spec.as_ref().and_then(|s| s.node_name.clone());
    let restart_count = pod
        .status
        .as_ref()
        .and_then(|s| s.container_statuses.as_ref())
        .into_iter()
        .flatten()
        .map(|c| c.restart_count.max(0) as u32)
        .max()
        .unwrap_or(0);

    debug!(pod = %pod.name_any(), ?node_name, restart_count, "pod listed");

    Some(Workload {
        name,
        node_name,
        restart_count,
    })
}

fn map_error(e: kube::Error) -> OrchestratorError {
    match e {
        kube::Error::Api(resp) if resp.code == 404 => OrchestratorError::NotFound(resp.message),
        other => OrchestratorError::Api(other.to_string()),
    }
}
