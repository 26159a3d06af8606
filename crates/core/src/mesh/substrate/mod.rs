//! Shared mesh substrate.
//!
//! The substrate is the medium sibling simulator processes use to negotiate core
//! identifiers and rendezvous before execution. It behaves like a named-lock table keyed
//! by identifier, plus one readiness flag per identifier that stays set for the rest of the
//! session once raised. This module provides:
//! 1. **Contract:** `MeshSubstrate`, the operations the coordinator needs.
//! 2. **Ownership:** `OwnerId`, which tells reservations from different coordinators apart.
//! 3. **Implementations:** `LocalSubstrate` for threads of one process and, on unix,
//!    `DirSubstrate` for processes sharing a directory.

/// In-process substrate.
pub mod local;

/// Shared-directory substrate.
#[cfg(unix)]
pub mod dir;

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::common::SimResult;

use super::coreid::CoreId;
use super::topology::MeshTopology;

pub use local::LocalSubstrate;

#[cfg(unix)]
pub use dir::DirSubstrate;

/// Identity of one reservation holder.
///
/// Unique per coordinator within a process and, through the process id, across
/// processes on one host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId(u64);

impl OwnerId {
    /// Returns an identifier no other call in any live process has returned.
    pub fn unique() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        let seq = NEXT.fetch_add(1, Ordering::Relaxed);
        Self((u64::from(std::process::id()) << 32) | u64::from(seq))
    }

    /// Raw value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 >> 32, self.0 & 0xffff_ffff)
    }
}

/// Operations the Mesh Coordinator requires from the shared substrate.
///
/// Reservation must be atomic with respect to every other handle on the same substrate;
/// attempts on different identifiers are independent.
pub trait MeshSubstrate: fmt::Debug + Send + Sync {
    /// Joins the substrate with the given topology.
    ///
    /// Fails with `TopologyInitFailed` if the substrate is unreachable or already in use
    /// with a different geometry.
    fn attach(&self, topology: &MeshTopology) -> SimResult<()>;

    /// Attempts to claim `coreid` for `owner`.
    ///
    /// Returns `Ok(true)` when `owner` now holds the identifier (including when it already
    /// did) and `Ok(false)` when a different owner holds it. A fresh claim clears any
    /// readiness left by the previous holder.
    fn try_reserve(&self, coreid: CoreId, owner: OwnerId) -> SimResult<bool>;

    /// Returns true if `owner` currently holds `coreid`.
    fn holds(&self, coreid: CoreId, owner: OwnerId) -> bool;

    /// Drops `owner`'s claim on `coreid`. No-op if not held.
    ///
    /// Readiness is kept, so a peer that passed the barrier and exited still counts for
    /// siblings that are waiting.
    fn release(&self, coreid: CoreId, owner: OwnerId);

    /// Marks `coreid` as having reached the barrier.
    fn signal_ready(&self, coreid: CoreId, owner: OwnerId) -> SimResult<()>;

    /// Counts how many of `participants` have signaled readiness.
    fn ready_count(&self, participants: &[CoreId]) -> usize;

    /// Sleeps until readiness may have changed or `timeout` elapses.
    fn park(&self, timeout: Duration);
}
