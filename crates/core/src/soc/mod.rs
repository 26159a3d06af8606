//! Memory subsystem.
//!
//! This module organizes the memory core the instance owns and the provisioner that
//! fills it with the default memory map.

/// Memory core contract, regions, and the region map.
pub mod memory;

/// Default memory provisioning.
pub mod provision;

pub use memory::{MemoryCore, MemoryRegion, RegionMap};
pub use provision::{ensure_region, provision_defaults};
