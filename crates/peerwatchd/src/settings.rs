//! Command-line and environment settings.
//!
//! Every flag can also be given through the environment variable named next
//! to it, which is how the daemon is configured when it runs as a pod.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, ValueEnum};

use peerwatch_core::config::{DEFAULT_NAMESPACE, MonitorConfig, PeerTable};
use peerwatch_core::restart::DEFAULT_MAX_RESTARTS;
use peerwatch_core::ProbeOptions;
use peerwatch_probe::tcp::DEFAULT_TCP_PORT;
use peerwatch_probe::{IcmpProbe, Probe, TcpProbe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProbeKind {
    /// ICMP echo through the system `ping` binary.
    Icmp,
    /// TCP connect.
    Tcp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Peer monitor settings.
#[derive(Debug, Clone, Args)]
pub struct MonitorArgs {
    /// Identity of the node this daemon runs on.
    #[arg(long, env = "NODE_NAME")]
    pub node_name: String,

    /// Namespace whose workloads are evicted.
    #[arg(long, env = "NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,

    /// Seconds between monitor cycles.
    #[arg(long, env = "PING_INTERVAL_SECONDS", default_value_t = 3)]
    pub ping_interval: u64,

    /// Consecutive failed probes before a peer's workloads are evicted.
    #[arg(long, env = "EVICTION_THRESHOLD", default_value_t = 3)]
    pub eviction_threshold: u32,

    /// Per-attempt probe timeout in seconds.
    #[arg(long, env = "PROBE_TIMEOUT_SECONDS", default_value_t = 2)]
    pub probe_timeout: u64,

    /// Attempts per probe.
    #[arg(long, env = "PROBE_ATTEMPTS", default_value_t = 2)]
    pub probe_attempts: u32,

    #[arg(long, env = "PROBE_KIND", value_enum, default_value_t = ProbeKind::Icmp)]
    pub probe_kind: ProbeKind,

    /// Port for TCP probes when a peer address has none.
    #[arg(long, env = "PROBE_TCP_PORT", default_value_t = DEFAULT_TCP_PORT)]
    pub probe_tcp_port: u16,

    /// TOML peer table. Without it peers come from WORKER{1,2,3}_IP / _NAME.
    #[arg(long, env = "PEERWATCH_CONFIG")]
    pub config: Option<PathBuf>,
}

impl MonitorArgs {
    /// Resolve the peer table and build a validated monitor configuration.
    pub fn load(&self) -> anyhow::Result<MonitorConfig> {
        let table = match &self.config {
            Some(path) => PeerTable::from_file(path)?,
            None => PeerTable::from_legacy_env(|key| std::env::var(key).ok()),
        };
        let config = self.build(table);
        config.validate()?;
        Ok(config)
    }

    fn build(&self, table: PeerTable) -> MonitorConfig {
        MonitorConfig::new(self.node_name.trim(), table)
            .with_namespace(self.namespace.trim())
            .with_cycle_interval(Duration::from_secs(self.ping_interval))
            .with_eviction_threshold(self.eviction_threshold)
            .with_probe(ProbeOptions {
                timeout: Duration::from_secs(self.probe_timeout),
                attempts: self.probe_attempts,
            })
    }

    pub fn probe(&self) -> anyhow::Result<Probe> {
        Ok(match self.probe_kind {
            ProbeKind::Icmp => Probe::Icmp(IcmpProbe::new()?),
            ProbeKind::Tcp => Probe::Tcp(TcpProbe::new(self.probe_tcp_port)),
        })
    }
}

/// Cluster API credentials.
#[derive(Debug, Clone, Args)]
pub struct KubeArgs {
    /// Load credentials from --k8s-config-file instead of the service account.
    #[arg(long, env = "READ_K8S_CONFIG_FILE")]
    pub read_k8s_config_file: bool,

    #[arg(long, env = "K8S_CONFIG_FILE")]
    pub k8s_config_file: Option<PathBuf>,
}

/// Restart monitor settings.
#[derive(Debug, Clone, Args)]
pub struct RestartArgs {
    /// Workload names watched for excessive restarts (comma-separated).
    #[arg(long, env = "MONITOR_PODS", value_delimiter = ',')]
    pub monitor_pods: Vec<String>,

    /// Restarts tolerated before a watched workload is deleted.
    #[arg(long, env = "MAX_RESTARTS", default_value_t = DEFAULT_MAX_RESTARTS)]
    pub max_restarts: u32,

    /// Seconds between restart scans.
    #[arg(long, env = "RESTART_CHECK_INTERVAL_SECONDS", default_value_t = 30)]
    pub restart_interval: u64,
}

/// Everything `peerwatchd run` needs.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub monitor: MonitorArgs,

    #[command(flatten)]
    pub kube: KubeArgs,

    #[command(flatten)]
    pub restart: RestartArgs,
}
