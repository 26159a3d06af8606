//! Memory core.
//!
//! This module implements the memory-core collaborator the provisioner talks to. It provides:
//! 1. **Contract:** `MemoryCore`, the two queries the provisioner needs plus the
//!    hardware-description hook.
//! 2. **Regions:** `MemoryRegion`, a (base, length) pair.
//! 3. **Region map:** `RegionMap`, a sorted set of mmap-backed regions.

/// mmap-backed region storage.
pub mod buffer;

use std::fmt;

use tracing::{debug, info};

use self::buffer::RegionBuffer;
use crate::common::{SimError, SimResult};

/// A provisioned backing-store range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemoryRegion {
    /// First mapped address.
    pub base: u64,
    /// Length in bytes.
    pub len: u64,
}

impl MemoryRegion {
    /// Returns true if `addr` falls inside the region.
    pub const fn contains(&self, addr: u64) -> bool {
        addr >= self.base && addr - self.base < self.len
    }

    /// Returns true if the two ranges share at least one address.
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.base < other.base.saturating_add(other.len)
            && other.base < self.base.saturating_add(self.len)
    }
}

/// Services the provisioner and option handlers require from the memory core.
pub trait MemoryCore: fmt::Debug {
    /// Returns true if some existing mapping can serve a read at `addr`.
    fn is_backed(&self, addr: u64) -> bool;

    /// Installs a backing region of `len` bytes at `base`.
    fn attach_region(&mut self, base: u64, len: u64) -> SimResult<()>;

    /// Hands memory setup to the hardware-description tree rooted at `root`.
    fn attach_hardware(&mut self, root: &str) -> SimResult<()>;

    /// Currently mapped regions, ordered by base address.
    fn regions(&self) -> Vec<MemoryRegion>;
}

#[derive(Debug)]
struct Mapping {
    region: MemoryRegion,
    // Unmapped when the mapping is dropped.
    _backing: RegionBuffer,
}

/// Sorted set of mapped regions.
#[derive(Debug, Default)]
pub struct RegionMap {
    mappings: Vec<Mapping>,
    hardware_root: Option<String>,
}

impl RegionMap {
    /// Creates an empty map.
    pub const fn new() -> Self {
        Self {
            mappings: Vec::new(),
            hardware_root: None,
        }
    }

    /// Hardware-description root, if memory was delegated to one.
    pub fn hardware_root(&self) -> Option<&str> {
        self.hardware_root.as_deref()
    }
}

impl MemoryCore for RegionMap {
    fn is_backed(&self, addr: u64) -> bool {
        self.mappings.iter().any(|m| m.region.contains(addr))
    }

    fn attach_region(&mut self, base: u64, len: u64) -> SimResult<()> {
        let region = MemoryRegion { base, len };
        if base.checked_add(len).is_none()
            || self.mappings.iter().any(|m| m.region.overlaps(&region))
        {
            return Err(SimError::RegionOverlap { base, len });
        }
        let size = usize::try_from(len).map_err(|_| SimError::AllocationFailed {
            requested: usize::MAX,
        })?;
        let buffer = RegionBuffer::new(size)?;
        self.mappings.push(Mapping {
            region,
            _backing: buffer,
        });
        self.mappings.sort_by_key(|m| m.region.base);
        debug!("mapped region {base:#x},{len:#x}");
        Ok(())
    }

    fn attach_hardware(&mut self, root: &str) -> SimResult<()> {
        info!(root, "memory delegated to hardware description");
        self.hardware_root = Some(root.to_owned());
        Ok(())
    }

    fn regions(&self) -> Vec<MemoryRegion> {
        self.mappings.iter().map(|m| m.region).collect()
    }
}
