//! Mesh coordination.
//!
//! This module contains everything a simulator process needs to take part in a grid of
//! sibling processes:
//! 1. **Identifiers:** `CoreId` and its row/column encoding.
//! 2. **Topology:** The cluster window and this node's slice of it.
//! 3. **Substrate:** The shared reservation and readiness medium.
//! 4. **Coordinator:** Identity reservation and the peer barrier.

/// Core identifier newtype.
pub mod coreid;

/// Mesh Coordinator.
pub mod coordinator;

/// Shared substrate contract and implementations.
pub mod substrate;

/// Cluster topology.
pub mod topology;

/// Peer-wait policy hook.
pub mod wait;

pub use coordinator::MeshCoordinator;
pub use coreid::CoreId;
#[cfg(unix)]
pub use substrate::DirSubstrate;
pub use substrate::{LocalSubstrate, MeshSubstrate, OwnerId};
pub use topology::MeshTopology;
pub use wait::{BlockIndefinitely, PeerWaitPolicy};
