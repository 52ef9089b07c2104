//! peerwatchd — peer health monitor and guarded workload evictor.
//!
//! `peerwatchd run` probes the configured peers every cycle and deletes the
//! workloads of nodes that stay unreachable, as long as the local node can
//! still see a peer it is authorized to act on behalf of.
//! `peerwatchd validate` resolves the configuration and prints it.

mod daemon;
mod settings;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use settings::{LogFormat, MonitorArgs, RunArgs};

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "info,peerwatch=debug";

#[derive(Parser)]
#[command(name = "peerwatchd", version, about = "Peer health monitor and workload evictor")]
struct Cli {
    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the peer monitor (and the restart monitor when pods are watched).
    Run(RunArgs),
    /// Resolve and validate the configuration, then print it as JSON.
    Validate(MonitorArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Run(args) => daemon::run(args).await,
        Command::Validate(args) => validate(&args),
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }
}

fn validate(args: &MonitorArgs) -> anyhow::Result<()> {
    let config = args.load()?;
    let monitored: Vec<_> = config.monitored_peers().map(|p| p.id.as_str()).collect();

    let resolved = serde_json::json!({
        "local": config.local_id,
        "local_configured": config.local_is_configured(),
        "namespace": config.namespace,
        "cycle_interval_secs": config.cycle_interval.as_secs(),
        "eviction_threshold": config.eviction_threshold,
        "probe": {
            "kind": format!("{:?}", args.probe_kind).to_lowercase(),
            "timeout_secs": config.probe.timeout.as_secs(),
            "attempts": config.probe.attempts,
        },
        "monitored": monitored,
        "peers": config.peers,
        "authorization": config.graph,
    });

    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_name_is_required() {
        // NODE_NAME may leak in from the environment the tests run in.
        if std::env::var_os("NODE_NAME").is_some() {
            return;
        }
        assert!(Cli::try_parse_from(["peerwatchd", "run"]).is_err());
    }

    #[test]
    fn log_format_is_global() {
        let cli = Cli::try_parse_from([
            "peerwatchd",
            "validate",
            "--node-name",
            "node-2",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(matches!(cli.command, Command::Validate(_)));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
