//! peerwatch-probe — reachability probes for the peer monitor.
//!
//! Two transports implement [`peerwatch_core::ProbeClient`]:
//!
//! - [`IcmpProbe`] runs the system `ping` binary and parses its RTT summary.
//! - [`TcpProbe`] opens TCP connections, for hosts where ICMP is filtered.
//!
//! Neither ever fails: every error is reported as an unreachable peer.

pub mod icmp;
pub mod tcp;

pub use icmp::IcmpProbe;
pub use tcp::TcpProbe;

use peerwatch_core::{BoxFuture, ProbeClient, ProbeOptions, ProbeOutcome};

/// Probe transport chosen at startup.
pub enum Probe {
    Icmp(IcmpProbe),
    Tcp(TcpProbe),
}

impl ProbeClient for Probe {
    fn probe<'a>(
        &'a self,
        address: &'a str,
        options: &'a ProbeOptions,
    ) -> BoxFuture<'a, ProbeOutcome> {
        match self {
            Probe::Icmp(p) => p.probe(address, options),
            Probe::Tcp(p) => p.probe(address, options),
        }
    }
}
