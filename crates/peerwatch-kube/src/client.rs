//! Kubernetes client construction.

use std::path::PathBuf;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::{info, warn};

/// Where the API credentials come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KubeconfigSource {
    /// Service account token mounted into the pod.
    InCluster,
    /// An explicit kubeconfig file.
    File(PathBuf),
}

impl KubeconfigSource {
    /// `File(path)` when `read_file` is set and a path is given, otherwise
    /// `InCluster`.
    pub fn select(read_file: bool, path: Option<PathBuf>) -> Self {
        match (read_file, path) {
            (true, Some(path)) => KubeconfigSource::File(path),
            _ => KubeconfigSource::InCluster,
        }
    }

    async fn load(&self) -> anyhow::Result<Config> {
        match self {
            KubeconfigSource::InCluster => Ok(Config::incluster()?),
            KubeconfigSource::File(path) => {
                let kubeconfig = Kubeconfig::read_from(path)?;
                Ok(Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?)
            }
        }
    }
}

/// Build a client from `source`, falling back to the default inference
/// chain (`KUBECONFIG`, `~/.kube/config`, in-cluster) if it fails.
pub async fn connect(source: &KubeconfigSource) -> anyhow::Result<Client> {
    let config = match source.load().await {
        Ok(config) => {
            info!(?source, "kubernetes config loaded");
            config
        }
        Err(e) => {
            warn!(?source, error = %e, "kubernetes config failed to load; falling back to default");
            Config::infer().await?
        }
    };

    Ok(Client::try_from(config)?)
}
