//! Mesh Coordinator.
//!
//! The process-local representative of one node in the core grid. It owns the topology
//! and is the only writer of this process's core identity: an identifier is claimed on
//! the shared substrate before it becomes the held identity, and the previous one is
//! released only after the new claim succeeded.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::common::{SimError, SimResult};
use crate::config::MeshConfig;

use super::coreid::CoreId;
use super::substrate::{MeshSubstrate, OwnerId};
use super::topology::MeshTopology;
use super::wait::{BlockIndefinitely, PeerWaitPolicy};

/// One node's view of the mesh and its reserved identity.
#[derive(Debug)]
pub struct MeshCoordinator {
    topology: MeshTopology,
    substrate: Arc<dyn MeshSubstrate>,
    owner: OwnerId,
    coreid: Option<CoreId>,
    policy: Box<dyn PeerWaitPolicy>,
}

impl MeshCoordinator {
    /// Builds the topology from `config` and joins `substrate`.
    ///
    /// # Errors
    ///
    /// `TopologyInitFailed` if the configuration is unusable or the substrate cannot be
    /// reached or is in use with a different geometry.
    pub fn initialize(config: &MeshConfig, substrate: Arc<dyn MeshSubstrate>) -> SimResult<Self> {
        let topology = MeshTopology::from_config(config)?;
        substrate.attach(&topology)?;
        let (row_base, col_base, rows, cols) = topology.window();
        info!(
            rank = topology.rank(),
            row_base, col_base, rows, cols, "mesh topology initialized"
        );
        Ok(Self {
            topology,
            substrate,
            owner: OwnerId::unique(),
            coreid: None,
            policy: Box::new(BlockIndefinitely::default()),
        })
    }

    /// Replaces the peer-wait policy.
    #[must_use]
    pub fn with_policy(mut self, policy: Box<dyn PeerWaitPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Topology this node was initialized with.
    pub const fn topology(&self) -> &MeshTopology {
        &self.topology
    }

    /// Reservation owner identity of this coordinator.
    pub const fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Currently held identifier, if any.
    pub const fn coreid(&self) -> Option<CoreId> {
        self.coreid
    }

    /// Returns true if `coreid` belongs to this node's part of the grid.
    pub fn is_member(&self, coreid: CoreId) -> bool {
        self.topology.is_member(coreid)
    }

    /// Claims `coreid` as this process's identity.
    ///
    /// Holding `coreid` already is a no-op. Otherwise the new identifier is claimed
    /// first and any previously held one released afterwards; on failure the held
    /// identity is unchanged.
    ///
    /// # Errors
    ///
    /// * `NotInTopology` if `coreid` is not a member of this node.
    /// * `ReservationConflict` if another holder owns it.
    /// * `Substrate` if the substrate could not be queried.
    pub fn reserve(&mut self, coreid: CoreId) -> SimResult<()> {
        if !self.is_member(coreid) {
            return Err(SimError::NotInTopology {
                coreid: coreid.get(),
            });
        }
        if self.coreid == Some(coreid) {
            return Ok(());
        }
        if !self.substrate.try_reserve(coreid, self.owner)? {
            warn!(%coreid, "coreid held by another sim process");
            return Err(SimError::ReservationConflict {
                coreid: coreid.get(),
            });
        }
        if let Some(previous) = self.coreid.replace(coreid) {
            self.substrate.release(previous, self.owner);
        }
        info!(%coreid, row = coreid.row(), col = coreid.col(), "coreid reserved");
        Ok(())
    }

    /// Gives up the held identifier, if any.
    pub fn release(&mut self) {
        if let Some(coreid) = self.coreid.take() {
            self.substrate.release(coreid, self.owner);
            info!(%coreid, "coreid released");
        }
    }

    /// True if the held identifier is a member of this node and reserved by it.
    pub fn is_valid(&self) -> bool {
        self.coreid
            .is_some_and(|id| self.is_member(id) && self.substrate.holds(id, self.owner))
    }

    /// Signals readiness and blocks until every core in the cluster has done the same.
    ///
    /// There is no timeout and no cancellation: a sibling that never arrives keeps this
    /// call blocked. The installed `PeerWaitPolicy` observes every pending round.
    pub fn wait_for_peers(&mut self) {
        if let Some(coreid) = self.coreid {
            if let Err(e) = self.substrate.signal_ready(coreid, self.owner) {
                error!(%coreid, error = %e, "could not signal readiness");
            }
        }

        let participants = self.topology.cluster();
        let expected = participants.len();
        info!(expected, "waiting for peers");

        let mut round = 0u64;
        loop {
            let ready = self.substrate.ready_count(&participants);
            if ready >= expected {
                break;
            }
            round += 1;
            self.policy.on_pending(round, ready, expected);
            self.substrate.park(self.policy.poll_interval());
        }
        info!(rounds = round, "all peers ready");
    }
}

impl Drop for MeshCoordinator {
    fn drop(&mut self) {
        self.release();
    }
}
