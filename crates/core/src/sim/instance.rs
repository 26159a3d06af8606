//! Instance Bootstrapper.
//!
//! `SimulatorInstance::open` walks a linear sequence of stages and fails fast:
//!
//! `Allocated → CpuAllocated → MeshInitialized → OptionsParsed → IdentityValidated →
//! MemoryProvisioned → ProgramAnalyzed → ConfigApplied → DecodeEngineAttached → Ready`
//!
//! The two mesh stages only exist for `Meshed` instances. A failure at any stage drops
//! whatever was built so far and returns the error, so callers never see a partially
//! constructed instance. Teardown runs in reverse: engine bindings first, core record
//! last.

use std::fmt;

use tracing::{debug, info};

use crate::common::constants::EM_EPIPHANY;
use crate::common::{SimError, SimResult};
use crate::config::{Config, Provisioning};
use crate::core::{CoreHandle, CoreHeader, CoreRegistry, CoreState, DecodeEngine, relocate};
use crate::soc::{MemoryCore, provision_defaults};
use crate::stats::ProfileHook;

use super::coordination::Coordination;
use super::loader::{self, ProgramImage};
use super::options::{self, Invocation};

/// How the instance was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenKind {
    /// Run directly from the command line.
    Standalone,
    /// Embedded under an external controller such as a debugger.
    Debug,
}

impl OpenKind {
    /// Tells the user how a missing identifier is supplied for this kind of launch.
    pub const fn identity_hint(self) -> &'static str {
        match self {
            Self::Standalone => "set with --coreid",
            Self::Debug => "set with \"sim coreid\"",
        }
    }
}

/// Bootstrap stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BootStage {
    /// Instance descriptor exists.
    Allocated,
    /// Core record allocated.
    CpuAllocated,
    /// Mesh topology built and substrate joined.
    MeshInitialized,
    /// Startup options applied.
    OptionsParsed,
    /// Identifier checked against the open kind.
    IdentityValidated,
    /// Default memory map installed.
    MemoryProvisioned,
    /// Program image inspected.
    ProgramAnalyzed,
    /// Remaining configuration checked.
    ConfigApplied,
    /// Decode engine bound to the core.
    DecodeEngineAttached,
    /// Open finished.
    Ready,
}

impl fmt::Display for BootStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// External services an instance is built around.
#[derive(Debug)]
pub struct Collaborators {
    /// Decode/execute engine.
    pub engine: Box<dyn DecodeEngine>,
    /// Memory core.
    pub memory: Box<dyn MemoryCore>,
}

/// A simulator instance modeling one core.
///
/// Fields drop in declaration order after `Drop::drop` detaches the engine, which gives
/// reverse-construction teardown.
#[derive(Debug)]
pub struct SimulatorInstance<M: Coordination> {
    engine: Box<dyn DecodeEngine>,
    profile: Option<ProfileHook>,
    program: Option<ProgramImage>,
    program_args: Vec<String>,
    memory: Box<dyn MemoryCore>,
    coordination: M,
    cores: CoreRegistry,
    core: CoreHandle,
    config: Config,
    kind: OpenKind,
    stage: BootStage,
}

impl<M: Coordination> SimulatorInstance<M> {
    /// Opens an instance: allocates the core, applies `argv`, provisions memory,
    /// analyzes the program, and attaches the decode engine.
    ///
    /// `argv` excludes the simulator's own name.
    ///
    /// # Errors
    ///
    /// The first stage failure, after everything built so far has been released.
    pub fn open<S: AsRef<str>>(
        kind: OpenKind,
        config: Config,
        argv: &[S],
        collaborators: Collaborators,
        seed: M::Seed,
    ) -> SimResult<Self> {
        let Collaborators { engine, memory } = collaborators;
        debug!(stage = %BootStage::Allocated, ?kind, "bootstrap");

        let mut cores = CoreRegistry::new();
        let core = cores.allocate(engine.extra_bytes())?;
        debug!(stage = %BootStage::CpuAllocated, core = core.index(), "bootstrap");

        let coordination = M::initialize(&config, seed)?;

        let mut sim = Self {
            engine,
            profile: None,
            program: None,
            program_args: Vec::new(),
            memory,
            coordination,
            cores,
            core,
            config,
            kind,
            stage: BootStage::CpuAllocated,
        };
        if M::MESH {
            sim.advance(BootStage::MeshInitialized);
        }

        let Invocation { program, args } = options::parse_args(&mut sim, argv)?;
        sim.program_args = args;
        sim.advance(BootStage::OptionsParsed);

        if M::MESH {
            sim.coordination.validate_open(kind)?;
            sim.advance(BootStage::IdentityValidated);
        }

        match &sim.config.memory.provisioning {
            Provisioning::Core => provision_defaults(sim.memory.as_mut(), &sim.config.memory)?,
            Provisioning::HardwareDescription { root } => sim.memory.attach_hardware(root)?,
        }
        sim.advance(BootStage::MemoryProvisioned);

        if let Some(path) = program {
            sim.program = Some(loader::analyze(&path)?);
        }
        sim.advance(BootStage::ProgramAnalyzed);

        sim.apply_config()?;
        sim.advance(BootStage::ConfigApplied);

        sim.engine.attach(sim.core, &sim.cores)?;
        if sim.config.engine.profile {
            sim.profile = Some(ProfileHook::install(sim.core, &sim.cores)?);
        }
        sim.advance(BootStage::DecodeEngineAttached);

        sim.advance(BootStage::Ready);
        info!(engine = sim.engine.name(), "simulator instance ready");
        Ok(sim)
    }

    fn advance(&mut self, stage: BootStage) {
        self.stage = stage;
        debug!(%stage, "bootstrap");
    }

    fn apply_config(&self) -> SimResult<()> {
        let Some(image) = &self.program else {
            return Ok(());
        };
        match image.machine {
            Some(machine) if self.config.general.check_machine && machine != EM_EPIPHANY => {
                Err(SimError::ProgramAnalysis(format!(
                    "{}: machine {machine:#x} is not Epiphany",
                    image.path.display()
                )))
            }
            _ => Ok(()),
        }
    }

    /// Prepares the core to run the loaded program.
    ///
    /// Sets the PC to the program entry (0 without a program). Mesh instances then
    /// require a valid identifier, publish it into the COREID mesh register, and block
    /// until every peer is ready.
    ///
    /// # Errors
    ///
    /// `MissingIdentity` if a mesh instance has no valid, reserved identifier.
    pub fn create_inferior(&mut self) -> SimResult<()> {
        let entry = self.program.as_ref().map_or(0, |p| p.entry);
        let pc = u32::try_from(entry).map_err(|_| {
            SimError::ProgramAnalysis(format!("entry point {entry:#x} exceeds 32 bits"))
        })?;

        let state = self
            .cores
            .get_mut(self.core)
            .ok_or(SimError::StaleHandle(self.core.index()))?;
        state.header.pc = pc;
        self.coordination
            .prepare_inferior(&mut state.header, self.kind)?;
        info!("inferior created, pc {pc:#x}");
        Ok(())
    }

    /// Runs a registered option as a live command, e.g. `"coreid 0x809"`.
    pub fn do_command(&mut self, command: &str) -> SimResult<()> {
        options::run_command(self, command)
    }

    /// Reallocates the core record to the size the decode engine currently needs.
    ///
    /// Handles held by the engine and profiling hook follow the new record without
    /// rebinding.
    pub fn relocate_core(&mut self) -> SimResult<()> {
        let size = CoreHeader::SIZE.saturating_add(self.engine.extra_bytes());
        relocate(&mut self.cores, self.core, size)
    }

    /// Closes the instance, releasing everything it owns.
    pub fn close(self) {
        info!("closing simulator instance");
        drop(self);
    }

    /// Stage reached; always `Ready` for an instance returned by `open`.
    pub const fn stage(&self) -> BootStage {
        self.stage
    }

    /// How the instance was opened.
    pub const fn kind(&self) -> OpenKind {
        self.kind
    }

    /// Effective configuration, including option changes.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) const fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Handle of the core record.
    pub const fn core(&self) -> CoreHandle {
        self.core
    }

    /// Current core record.
    pub fn core_state(&self) -> Option<&CoreState> {
        self.cores.get(self.core)
    }

    /// Core registry.
    pub const fn cores(&self) -> &CoreRegistry {
        &self.cores
    }

    /// Memory core.
    pub fn memory(&self) -> &dyn MemoryCore {
        self.memory.as_ref()
    }

    pub(crate) fn memory_mut(&mut self) -> &mut dyn MemoryCore {
        self.memory.as_mut()
    }

    /// Decode engine.
    pub fn engine(&self) -> &dyn DecodeEngine {
        self.engine.as_ref()
    }

    /// Coordination capability.
    pub const fn coordination(&self) -> &M {
        &self.coordination
    }

    pub(crate) const fn coordination_mut(&mut self) -> &mut M {
        &mut self.coordination
    }

    /// Analyzed program, if one was named.
    pub const fn program(&self) -> Option<&ProgramImage> {
        self.program.as_ref()
    }

    /// Arguments following the program path.
    pub fn program_args(&self) -> &[String] {
        &self.program_args
    }

    /// Profiling hook, if enabled.
    pub const fn profile(&self) -> Option<&ProfileHook> {
        self.profile.as_ref()
    }

    /// Profiling hook, mutably.
    pub fn profile_mut(&mut self) -> Option<&mut ProfileHook> {
        self.profile.as_mut()
    }

    /// Profiling report for the core, if profiling is enabled.
    pub fn profile_report(&self) -> Option<String> {
        self.profile.as_ref()?.report(&self.cores)
    }
}

impl<M: Coordination> Drop for SimulatorInstance<M> {
    fn drop(&mut self) {
        self.engine.detach();
        let _ = self.profile.take();
        let _ = self.cores.release(self.core);
        debug!(stage = %self.stage, "simulator instance released");
    }
}
