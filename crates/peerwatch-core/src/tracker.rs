//! Per-peer failure counting and outage flags.
//!
//! The tracker is a plain state machine driven by probe outcomes. It is
//! owned by the monitor loop and never shared, so it carries no locks.
//! The down/evicted flags are only raised by [`PeerHealthTracker::mark_evicted`],
//! which the eviction protocol calls after it has attempted deletions;
//! crossing the threshold alone never raises them.

use indexmap::IndexMap;
use tracing::debug;

use crate::types::{PeerId, PeerRuntimeState};

/// What a recorded probe did to a peer's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Reachable, and the peer was not marked down.
    Healthy,
    /// Reachable after the peer had been marked down; the outage is over.
    Recovered,
    /// Unreachable; carries the new consecutive failure count.
    Failed { consecutive_failures: u32 },
}

/// Failure counters and outage flags for every configured peer, iterated in
/// configuration order.
#[derive(Debug, Clone, Default)]
pub struct PeerHealthTracker {
    peers: IndexMap<PeerId, PeerRuntimeState>,
}

impl PeerHealthTracker {
    /// Create a tracker with a zeroed state for each peer, in the given order.
    pub fn new<I, S>(peers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PeerId>,
    {
        let peers = peers
            .into_iter()
            .map(|id| (id.into(), PeerRuntimeState::default()))
            .collect();
        Self { peers }
    }

    /// Apply one probe outcome. Returns `None` for a peer that is not tracked.
    pub fn record_probe(&mut self, peer: &str, reachable: bool) -> Option<Transition> {
        let state = self.peers.get_mut(peer)?;

        if reachable {
            let was_down = state.is_down;
            state.consecutive_failures = 0;
            state.is_down = false;
            state.evicted_this_outage = false;

            if was_down {
                debug!(%peer, "outage flags cleared");
                Some(Transition::Recovered)
            } else {
                Some(Transition::Healthy)
            }
        } else {
            state.consecutive_failures = state.consecutive_failures.saturating_add(1);
            Some(Transition::Failed {
                consecutive_failures: state.consecutive_failures,
            })
        }
    }

    /// Whether `peer` has failed at least `threshold` consecutive probes and
    /// has not yet been evicted during the current outage.
    pub fn is_eligible(&self, peer: &str, threshold: u32) -> bool {
        self.peers
            .get(peer)
            .is_some_and(|s| s.consecutive_failures >= threshold && !s.evicted_this_outage)
    }

    /// Mark the outage as handled. Both flags are raised together.
    ///
    /// Only the eviction protocol calls this, after attempting deletion.
    pub fn mark_evicted(&mut self, peer: &str) -> bool {
        match self.peers.get_mut(peer) {
            Some(state) => {
                state.is_down = true;
                state.evicted_this_outage = true;
                true
            }
            None => false,
        }
    }

    pub fn state(&self, peer: &str) -> Option<&PeerRuntimeState> {
        self.peers.get(peer)
    }

    pub fn contains(&self, peer: &str) -> bool {
        self.peers.contains_key(peer)
    }

    /// Peers and their state in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = (&PeerId, &PeerRuntimeState)> {
        self.peers.iter()
    }

    /// Owned copy of every peer's state, in configuration order.
    pub fn snapshot(&self) -> Vec<(PeerId, PeerRuntimeState)> {
        self.peers.iter().map(|(id, s)| (id.clone(), *s)).collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
