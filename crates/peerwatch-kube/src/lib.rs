//! peerwatch-kube — the Kubernetes side of peerwatch.
//!
//! [`KubeOrchestrator`] implements [`peerwatch_core::ClusterOrchestrator`]
//! over the core/v1 Pod API, and [`connect`] builds the API client from an
//! explicit kubeconfig file or the in-cluster service account.

pub mod client;
pub mod orchestrator;

pub use client::{KubeconfigSource, connect};
pub use orchestrator::KubeOrchestrator;
