//! Epiphany simulator bootstrap and mesh coordination library.
//!
//! This crate brings up one simulated core of a mesh-connected multi-core array and
//! coordinates it with its sibling processes:
//! 1. **Core:** Per-core state record, handle registry, State Relocator, decode-engine contract.
//! 2. **Memory:** Memory-core contract, mmap-backed region map, and the Memory Provisioner.
//! 3. **Mesh:** Core identifiers, cluster topology, shared substrates, and the Mesh Coordinator.
//! 4. **Simulation:** Option Registry, program analysis, and the Instance Bootstrapper.
//! 5. **Profiling:** The miscellaneous-statistics hook attached at bootstrap.

/// Common types and constants (address map, identifier ranges, errors).
pub mod common;
/// Instance configuration (defaults and hierarchical config structures).
pub mod config;
/// Core record, registry, relocation, and decode engine.
pub mod core;
/// Mesh topology, substrates, and coordinator.
pub mod mesh;
/// Instance lifecycle: options, program analysis, bootstrap.
pub mod sim;
/// Memory core and default provisioning.
pub mod soc;
/// Profiling hook and report formatting.
pub mod stats;

/// Error type returned by every fallible operation.
pub use crate::common::{ErrorKind, SimError, SimResult};
/// Root configuration type; use `Config::default()` or load from JSON.
pub use crate::config::Config;
/// Top-level instance type; open with `SimulatorInstance::open`.
pub use crate::sim::{Meshed, OpenKind, SimulatorInstance, Standalone};
