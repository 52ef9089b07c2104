//! peerwatch-core — peer health tracking and guarded workload eviction.
//!
//! Each node of a small, statically configured cluster runs a monitor that
//! probes its peers. When a peer fails enough consecutive probes, and the
//! authorization graph lets the local node act on it, the workloads
//! scheduled on that peer's node are deleted so the orchestrator can
//! reschedule them. Eviction happens at most once per outage.
//!
//! # Architecture
//!
//! ```text
//! MonitorLoop (one cycle at a time)
//!   ├── ProbeClient::probe()            → ProbeOutcome
//!   ├── PeerHealthTracker               (failure counts, down/evicted flags)
//!   ├── EvictionAuthority               (graph + self-isolation guard)
//!   └── evict_peer()                    → ClusterOrchestrator list/delete
//!
//! RestartMonitor (independent loop)
//!   └── ClusterOrchestrator list/delete for crash-looping workloads
//! ```
//!
//! The probe transport and the cluster API live behind the
//! [`ProbeClient`] and [`ClusterOrchestrator`] traits.

pub mod authority;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod eviction;
pub mod monitor;
pub mod restart;
pub mod tracker;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use authority::{AuthorizationGraph, EvictionAuthority};
pub use collaborators::{BoxFuture, ClusterOrchestrator, ProbeClient};
pub use config::{MonitorConfig, PeerTable};
pub use error::{ConfigError, EvictionError, OrchestratorError};
pub use eviction::{EvictionReport, evict_peer};
pub use monitor::{CycleReport, MonitorLoop};
pub use restart::{RestartMonitor, RestartScanReport};
pub use tracker::{PeerHealthTracker, Transition};
pub use types::*;
