//! Peer-wait policy hook.
//!
//! `wait_for_peers` has no timeout and no cancellation: a sibling that never arrives
//! blocks every peer. A policy is consulted on each round the barrier is still pending,
//! which is where liveness detection can be added without touching callers.

use std::fmt;
use std::time::Duration;

use tracing::info;

/// Default interval between readiness polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Observer of a pending peer barrier.
pub trait PeerWaitPolicy: fmt::Debug + Send {
    /// Called once per round while fewer than `expected` participants are ready.
    fn on_pending(&mut self, round: u64, ready: usize, expected: usize);

    /// Time to park between rounds.
    fn poll_interval(&self) -> Duration {
        DEFAULT_POLL_INTERVAL
    }
}

/// Waits forever, logging progress every `report_every` rounds.
#[derive(Debug, Clone)]
pub struct BlockIndefinitely {
    report_every: u64,
    interval: Duration,
}

impl BlockIndefinitely {
    /// Creates a policy that logs every `report_every` rounds and polls at `interval`.
    pub const fn new(report_every: u64, interval: Duration) -> Self {
        Self {
            report_every,
            interval,
        }
    }
}

impl Default for BlockIndefinitely {
    fn default() -> Self {
        Self::new(100, DEFAULT_POLL_INTERVAL)
    }
}

impl PeerWaitPolicy for BlockIndefinitely {
    fn on_pending(&mut self, round: u64, ready: usize, expected: usize) {
        if self.report_every != 0 && round % self.report_every == 0 {
            info!(round, ready, expected, "still waiting for peers");
        }
    }

    fn poll_interval(&self) -> Duration {
        self.interval
    }
}
