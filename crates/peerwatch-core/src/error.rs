//! Error types for peerwatch.

use thiserror::Error;

use crate::types::PeerId;

/// Errors raised while loading or validating configuration. All of them are
/// fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("address for peer {0} not provided")]
    MissingAddress(PeerId),

    #[error("peer {0} is configured more than once")]
    DuplicatePeer(PeerId),

    #[error("no peers configured")]
    NoPeers,

    #[error("eviction threshold must be at least 1")]
    ZeroThreshold,

    #[error("cycle interval must be greater than zero")]
    ZeroInterval,

    #[error("probe attempts must be at least 1")]
    ZeroAttempts,

    #[error("probe timeout must be greater than zero")]
    ZeroTimeout,

    #[error("authorization graph references unknown peer {0}")]
    UnknownGraphPeer(PeerId),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Recoverable failure reported by a cluster orchestrator call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("cluster api error: {0}")]
    Api(String),

    #[error("workload not found: {0}")]
    NotFound(String),
}

/// Errors that abort an eviction attempt for one peer in one cycle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EvictionError {
    #[error("failed to list workloads for peer {peer}: {source}")]
    ListWorkloads {
        peer: PeerId,
        #[source]
        source: OrchestratorError,
    },

    #[error("peer {0} is not configured")]
    UnknownPeer(PeerId),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
