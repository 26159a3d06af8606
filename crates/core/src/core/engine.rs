//! Decode engine contract.
//!
//! The decode/execute engine is an external collaborator. The bootstrapper only needs
//! three things from it: how many extension bytes a core record needs under the current
//! configuration, a way to bind a core record to its dispatch and disassembly tables, and
//! a teardown call. `ReferenceEngine` is the in-tree implementation used by the CLI.

use std::fmt;

use tracing::debug;

use crate::common::{SimError, SimResult};
use crate::config::EngineConfig;

use super::registry::{CoreHandle, CoreRegistry};
use super::state::CoreHeader;

/// Services the bootstrapper requires from a decode engine.
pub trait DecodeEngine: fmt::Debug {
    /// Short engine name used in logs.
    fn name(&self) -> &str;

    /// Extension bytes a core record needs under the current configuration.
    fn extra_bytes(&self) -> usize;

    /// Binds `core` to the engine's dispatch and disassembly tables.
    ///
    /// The engine keeps the handle, never a reference, so later relocations of the
    /// record are picked up without rebinding.
    fn attach(&mut self, core: CoreHandle, cores: &CoreRegistry) -> SimResult<()>;

    /// Drops every binding installed by `attach`.
    fn detach(&mut self);
}

/// Descriptor-table engine with a configurable extension size.
#[derive(Debug, Clone)]
pub struct ReferenceEngine {
    extension_bytes: usize,
    bound: Option<CoreHandle>,
}

impl ReferenceEngine {
    /// Creates an engine sized from `config`.
    pub const fn new(config: &EngineConfig) -> Self {
        Self {
            extension_bytes: config.extension_bytes,
            bound: None,
        }
    }

    /// Core currently bound to the dispatch table.
    pub const fn bound(&self) -> Option<CoreHandle> {
        self.bound
    }
}

impl DecodeEngine for ReferenceEngine {
    fn name(&self) -> &str {
        "epiphany-ref"
    }

    fn extra_bytes(&self) -> usize {
        self.extension_bytes
    }

    fn attach(&mut self, core: CoreHandle, cores: &CoreRegistry) -> SimResult<()> {
        let state = cores.get(core).ok_or(SimError::StaleHandle(core.index()))?;
        if state.extension().len() < self.extension_bytes {
            return Err(SimError::AllocationFailed {
                requested: CoreHeader::SIZE + self.extension_bytes,
            });
        }
        self.bound = Some(core);
        debug!(core = core.index(), engine = self.name(), "dispatch table bound");
        Ok(())
    }

    fn detach(&mut self) {
        if let Some(core) = self.bound.take() {
            debug!(core = core.index(), engine = self.name(), "dispatch table unbound");
        }
    }
}
