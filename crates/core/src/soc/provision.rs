//! Memory Provisioner.
//!
//! Installs the default memory map unless the user already mapped the probed addresses.
//! Regions are always visited in the same order (primary first, then external bank 0,
//! then bank 1) so an overlapping configuration fails the same way every run.

use tracing::{debug, info};

use crate::common::SimResult;
use crate::config::MemoryConfig;

use super::memory::MemoryCore;

/// Ensures `base` is backed, installing a region of exactly `len` bytes if it is not.
///
/// Returns whether a region was installed. Already-backed addresses are left alone,
/// which makes repeated provisioning with the same configuration a no-op.
pub fn ensure_region(memory: &mut dyn MemoryCore, base: u64, len: u64) -> SimResult<bool> {
    if memory.is_backed(base) {
        debug!("{base:#x} already backed, skipping");
        return Ok(false);
    }
    memory.attach_region(base, len)?;
    info!("memory region {base:#x},{len:#x}");
    Ok(true)
}

/// Provisions the primary region and, unless turned off, both external banks.
pub fn provision_defaults(memory: &mut dyn MemoryCore, config: &MemoryConfig) -> SimResult<()> {
    let _ = ensure_region(memory, config.primary_base, config.primary_size)?;

    if config.external_memory {
        for (base, len) in config.external_banks() {
            let _ = ensure_region(memory, base, len)?;
        }
    } else {
        debug!("external memory turned off");
    }
    Ok(())
}
