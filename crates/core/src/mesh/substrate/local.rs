//! In-process substrate.
//!
//! Every coordinator holding a clone of the same `Arc<LocalSubstrate>` shares one
//! reservation table for the life of the substrate. Readiness changes wake parked waiters
//! through a condition variable.

use std::collections::{HashMap, HashSet};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::common::{SimError, SimResult};

use super::{CoreId, MeshSubstrate, MeshTopology, OwnerId};

#[derive(Debug, Default)]
struct Table {
    signature: Option<String>,
    owners: HashMap<CoreId, OwnerId>,
    ready: HashSet<CoreId>,
}

/// Mutex-guarded reservation table for coordinators living in one process.
#[derive(Debug, Default)]
pub struct LocalSubstrate {
    table: Mutex<Table>,
    changed: Condvar,
}

impl LocalSubstrate {
    /// Creates an empty substrate.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current holder of `coreid`, if any.
    pub fn owner_of(&self, coreid: CoreId) -> Option<OwnerId> {
        self.lock().owners.get(&coreid).copied()
    }
}

impl MeshSubstrate for LocalSubstrate {
    fn attach(&self, topology: &MeshTopology) -> SimResult<()> {
        let signature = topology.signature();
        let mut table = self.lock();
        match &table.signature {
            Some(existing) if *existing != signature => Err(SimError::TopologyInitFailed(
                format!("substrate in use with `{existing}`"),
            )),
            Some(_) => Ok(()),
            None => {
                table.signature = Some(signature);
                Ok(())
            }
        }
    }

    fn try_reserve(&self, coreid: CoreId, owner: OwnerId) -> SimResult<bool> {
        let mut table = self.lock();
        match table.owners.get(&coreid) {
            Some(holder) => Ok(*holder == owner),
            None => {
                let _ = table.owners.insert(coreid, owner);
                let _ = table.ready.remove(&coreid);
                debug!(%coreid, %owner, "reserved");
                Ok(true)
            }
        }
    }

    fn holds(&self, coreid: CoreId, owner: OwnerId) -> bool {
        self.lock().owners.get(&coreid) == Some(&owner)
    }

    fn release(&self, coreid: CoreId, owner: OwnerId) {
        let mut table = self.lock();
        if table.owners.get(&coreid) == Some(&owner) {
            let _ = table.owners.remove(&coreid);
            debug!(%coreid, %owner, "released");
        }
    }

    fn signal_ready(&self, coreid: CoreId, owner: OwnerId) -> SimResult<()> {
        if !self.holds(coreid, owner) {
            return Err(SimError::MissingIdentity {
                hint: "readiness requires a reserved coreid",
            });
        }
        let mut table = self.lock();
        let _ = table.ready.insert(coreid);
        self.changed.notify_all();
        Ok(())
    }

    fn ready_count(&self, participants: &[CoreId]) -> usize {
        let table = self.lock();
        participants
            .iter()
            .filter(|id| table.ready.contains(id))
            .count()
    }

    fn park(&self, timeout: Duration) {
        let table = self.lock();
        let _ = self
            .changed
            .wait_timeout(table, timeout)
            .unwrap_or_else(PoisonError::into_inner);
    }
}
