//! ICMP echo probe backed by the system `ping` binary.
//!
//! Runs `ping -c <attempts> -W <timeout> <address>` (iputils syntax). `-W`
//! takes whole seconds, so the timeout is rounded up. A zero exit status means
//! at least one echo reply came back. The whole process is bounded by
//! `wait * attempts + 1s` and killed if it overruns.

use std::process::Stdio;
use std::time::Duration;

use regex::Regex;
use tokio::process::Command;
use tracing::debug;

use peerwatch_core::{BoxFuture, ProbeClient, ProbeOptions, ProbeOutcome, RttStats};

/// Matches the Linux (`rtt ... mdev`) and BSD (`round-trip ... stddev`)
/// summary lines.
const RTT_SUMMARY: &str =
    r"(?:rtt|round-trip) min/avg/max/(?:mdev|stddev) = ([\d.]+)/([\d.]+)/([\d.]+)";

/// Slack on top of the per-attempt timeouts before the process is killed.
const PROCESS_GRACE: Duration = Duration::from_secs(1);

pub struct IcmpProbe {
    program: String,
    summary: Regex,
}

impl IcmpProbe {
    pub fn new() -> Result<Self, regex::Error> {
        Self::with_program("ping")
    }

    /// Use a different executable, e.g. an absolute path to `ping`.
    pub fn with_program(program: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            program: program.into(),
            summary: Regex::new(RTT_SUMMARY)?,
        })
    }

    /// Extract min/avg/max from `ping` output.
    pub fn parse_rtt(&self, output: &str) -> Option<RttStats> {
        let caps = self.summary.captures(output)?;
        Some(RttStats {
            min_ms: caps[1].parse().ok()?,
            avg_ms: caps[2].parse().ok()?,
            max_ms: caps[3].parse().ok()?,
        })
    }

    async fn run(&self, address: &str, options: &ProbeOptions) -> ProbeOutcome {
        let wait = wait_secs(options);
        let mut cmd = Command::new(&self.program);
        cmd.arg("-c")
            .arg(options.attempts.to_string())
            .arg("-W")
            .arg(wait.to_string())
            .arg(address)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(process_deadline(options), cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                debug!(%address, program = %self.program, error = %e, "ping could not be started");
                return ProbeOutcome::unreachable();
            }
            Err(_) => {
                debug!(%address, "ping timed out");
                return ProbeOutcome::unreachable();
            }
        };

        if !output.status.success() {
            debug!(%address, status = %output.status, "ping reported no replies");
            return ProbeOutcome::unreachable();
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        ProbeOutcome::reachable(self.parse_rtt(&stdout))
    }
}

/// Per-reply wait passed to `-W`, in whole seconds, at least 1.
fn wait_secs(options: &ProbeOptions) -> u64 {
    (options.timeout.as_secs_f64().ceil() as u64).max(1)
}

/// Time allowed for the whole `ping` run before it is killed.
fn process_deadline(options: &ProbeOptions) -> Duration {
    Duration::from_secs(wait_secs(options))
        .saturating_mul(options.attempts)
        .saturating_add(PROCESS_GRACE)
}

impl ProbeClient for IcmpProbe {
    fn probe<'a>(
        &'a self,
        address: &'a str,
        options: &'a ProbeOptions,
    ) -> BoxFuture<'a, ProbeOutcome> {
        Box::pin(self.run(address, options))
    }
}
