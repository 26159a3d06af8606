//! Per-core state record.
//!
//! A record is a fixed header (registers, PC, core-mesh registers) followed by
//! decode-engine-private extension bytes whose size is only known once the engine is
//! configured. The core never interprets the extension bytes.

use std::mem;

use crate::common::constants::{MESH_REG_COREID, NUM_GPRS, NUM_MESH_REGS};
use crate::common::{SimError, SimResult};

/// Fixed, engine-independent part of a core record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreHeader {
    /// General-purpose registers.
    pub gprs: [u32; NUM_GPRS],
    /// Program counter.
    pub pc: u32,
    /// Core-mesh registers; index 1 holds the published core identifier.
    pub mesh_regs: [u32; NUM_MESH_REGS],
    /// Core status register.
    pub status: u32,
}

impl CoreHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = mem::size_of::<Self>();

    /// Returns the identifier published into the COREID mesh register.
    pub const fn coreid(&self) -> u32 {
        self.mesh_regs[MESH_REG_COREID]
    }

    /// Publishes an identifier into the COREID mesh register.
    pub const fn set_coreid(&mut self, coreid: u32) {
        self.mesh_regs[MESH_REG_COREID] = coreid;
    }
}

impl Default for CoreHeader {
    fn default() -> Self {
        Self {
            gprs: [0; NUM_GPRS],
            pc: 0,
            mesh_regs: [0; NUM_MESH_REGS],
            status: 0,
        }
    }
}

/// Mutable per-core record: header plus extension bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreState {
    /// Fixed header.
    pub header: CoreHeader,
    extension: Vec<u8>,
}

impl CoreState {
    /// Allocates a zeroed record with `extension_bytes` of extension space.
    pub fn new(extension_bytes: usize) -> SimResult<Self> {
        Self::with_header(CoreHeader::default(), extension_bytes)
    }

    /// Allocates a record carrying `header` and a zero-initialized extension.
    ///
    /// Fails with `AllocationFailed` instead of aborting when the host cannot
    /// provide the extension.
    pub fn with_header(header: CoreHeader, extension_bytes: usize) -> SimResult<Self> {
        let mut extension = Vec::new();
        extension
            .try_reserve_exact(extension_bytes)
            .map_err(|_| SimError::AllocationFailed {
                requested: CoreHeader::SIZE.saturating_add(extension_bytes),
            })?;
        extension.resize(extension_bytes, 0);
        Ok(Self { header, extension })
    }

    /// Total record size: header plus extension.
    pub fn total_size(&self) -> usize {
        CoreHeader::SIZE + self.extension.len()
    }

    /// Engine-private extension bytes.
    pub fn extension(&self) -> &[u8] {
        &self.extension
    }

    /// Mutable access to the extension bytes.
    pub fn extension_mut(&mut self) -> &mut [u8] {
        &mut self.extension
    }
}
