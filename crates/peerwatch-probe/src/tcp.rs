//! TCP connect probe.
//!
//! Makes `attempts` connection attempts, each bounded by the probe timeout.
//! The peer is reachable if any attempt connects; RTT statistics cover the
//! successful attempts.

use std::net::{IpAddr, SocketAddr};
use std::time::Instant;

use tokio::net::TcpStream;
use tracing::debug;

use peerwatch_core::{BoxFuture, ProbeClient, ProbeOptions, ProbeOutcome, RttStats};

/// Port used for addresses that do not carry one.
pub const DEFAULT_TCP_PORT: u16 = 22;

pub struct TcpProbe {
    default_port: u16,
}

impl TcpProbe {
    pub fn new(default_port: u16) -> Self {
        Self { default_port }
    }

    /// `host:port` to connect to for a configured peer address.
    pub fn target(&self, address: &str) -> String {
        if address.parse::<SocketAddr>().is_ok() {
            return address.to_string();
        }
        if let Ok(ip) = address.parse::<IpAddr>() {
            return SocketAddr::new(ip, self.default_port).to_string();
        }
        if address.contains(':') {
            return address.to_string();
        }
        format!("{address}:{}", self.default_port)
    }

    async fn run(&self, address: &str, options: &ProbeOptions) -> ProbeOutcome {
        let target = self.target(address);
        let mut samples = Vec::new();

        for attempt in 1..=options.attempts {
            let started = Instant::now();
            match tokio::time::timeout(options.timeout, TcpStream::connect(&target)).await {
                Ok(Ok(_stream)) => {
                    samples.push(started.elapsed().as_secs_f64() * 1000.0);
                }
                Ok(Err(e)) => {
                    debug!(%target, attempt, error = %e, "tcp probe connection failed");
                }
                Err(_) => {
                    debug!(%target, attempt, "tcp probe timed out");
                }
            }
        }

        if samples.is_empty() {
            ProbeOutcome::unreachable()
        } else {
            ProbeOutcome::reachable(RttStats::from_samples(&samples))
        }
    }
}

impl Default for TcpProbe {
    fn default() -> Self {
        Self::new(DEFAULT_TCP_PORT)
    }
}

impl ProbeClient for TcpProbe {
    fn probe<'a>(
        &'a self,
        address: &'a str,
        options: &'a ProbeOptions,
    ) -> BoxFuture<'a, ProbeOutcome> {
        Box::pin(self.run(address, options))
    }
}
