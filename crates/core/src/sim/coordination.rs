//! Coordination capability.
//!
//! A `SimulatorInstance` is generic over how it relates to sibling processes. `Standalone`
//! runs a single core with no identity negotiation; `Meshed` carries a `MeshCoordinator`
//! and adds the `coreid` option, the identity check after option parsing, and the peer
//! barrier at inferior creation.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::common::{SimError, SimResult};
use crate::config::Config;
use crate::core::CoreHeader;
use crate::mesh::{MeshCoordinator, MeshSubstrate};

use super::instance::OpenKind;
use super::options::{self, SimOption};

/// Capability a simulator instance is specialized with.
pub trait Coordination: Sized + fmt::Debug {
    /// Input needed to build the capability (e.g. the shared substrate).
    type Seed;

    /// True when the instance negotiates an identity with siblings.
    const MESH: bool;

    /// Builds the capability for `config`.
    fn initialize(config: &Config, seed: Self::Seed) -> SimResult<Self>;

    /// Options registered in addition to the common table.
    fn extra_options() -> Vec<SimOption<Self>>;

    /// Identity check run right after option parsing.
    fn validate_open(&self, kind: OpenKind) -> SimResult<()>;

    /// Prepares the core header for execution and performs any rendezvous.
    fn prepare_inferior(&mut self, header: &mut CoreHeader, kind: OpenKind) -> SimResult<()>;

    /// Mesh coordinator, if this capability has one.
    fn mesh(&self) -> Option<&MeshCoordinator>;
}

/// Single standalone core; no mesh coordination.
#[derive(Debug, Clone, Copy, Default)]
pub struct Standalone;

impl Coordination for Standalone {
    type Seed = ();

    const MESH: bool = false;

    fn initialize(_config: &Config, (): ()) -> SimResult<Self> {
        Ok(Self)
    }

    fn extra_options() -> Vec<SimOption<Self>> {
        Vec::new()
    }

    fn validate_open(&self, _kind: OpenKind) -> SimResult<()> {
        Ok(())
    }

    fn prepare_inferior(&mut self, _header: &mut CoreHeader, _kind: OpenKind) -> SimResult<()> {
        Ok(())
    }

    fn mesh(&self) -> Option<&MeshCoordinator> {
        None
    }
}

/// One tile of a mesh of sibling simulator processes.
#[derive(Debug)]
pub struct Meshed {
    mesh: MeshCoordinator,
}

impl Meshed {
    /// The coordinator.
    pub const fn coordinator(&self) -> &MeshCoordinator {
        &self.mesh
    }

    /// The coordinator, mutably.
    pub fn coordinator_mut(&mut self) -> &mut MeshCoordinator {
        &mut self.mesh
    }
}

impl Coordination for Meshed {
    type Seed = Arc<dyn MeshSubstrate>;

    const MESH: bool = true;

    fn initialize(config: &Config, substrate: Self::Seed) -> SimResult<Self> {
        Ok(Self {
            mesh: MeshCoordinator::initialize(&config.mesh, substrate)?,
        })
    }

    fn extra_options() -> Vec<SimOption<Self>> {
        vec![options::coreid_option()]
    }

    fn validate_open(&self, kind: OpenKind) -> SimResult<()> {
        if self.mesh.is_valid() {
            return Ok(());
        }
        match kind {
            OpenKind::Standalone => Err(SimError::MissingIdentity {
                hint: kind.identity_hint(),
            }),
            OpenKind::Debug => {
                warn!("coreid not set yet; {}", kind.identity_hint());
                Ok(())
            }
        }
    }

    fn prepare_inferior(&mut self, header: &mut CoreHeader, kind: OpenKind) -> SimResult<()> {
        let coreid = self
            .mesh
            .coreid()
            .filter(|_| self.mesh.is_valid())
            .ok_or(SimError::MissingIdentity {
                hint: kind.identity_hint(),
            })?;
        header.set_coreid(u32::from(coreid.get()));
        self.mesh.wait_for_peers();
        Ok(())
    }

    fn mesh(&self) -> Option<&MeshCoordinator> {
        Some(&self.mesh)
    }
}
