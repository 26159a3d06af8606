//! Address-map and identifier constants shared by the provisioner, mesh, and option code.

/// Base of the primary (core-local) memory region.
pub const DEFAULT_MEM_BASE: u64 = 0x0000_0000;

/// Size of the primary memory region provisioned when the user mapped nothing at 0.
pub const DEFAULT_MEM_SIZE: u64 = 0x0010_0000;

/// Base of external memory bank 0.
pub const EXT_MEM_BANK0_START: u64 = 0x8e00_0000;

/// Base of external memory bank 1.
pub const EXT_MEM_BANK1_START: u64 = 0x8f00_0000;

/// Size of each external memory bank.
pub const EXT_MEM_BANK_SIZE: u64 = 0x0100_0000;

/// Smallest assignable core identifier.
pub const COREID_MIN: u16 = 1;

/// Largest assignable core identifier (12-bit field).
pub const COREID_MAX: u16 = 0x0fff;

/// Bit width of the column field inside a core identifier.
pub const COREID_COL_BITS: u32 = 6;

/// Mask selecting the column field of a core identifier.
pub const COREID_COL_MASK: u16 = (1 << COREID_COL_BITS) - 1;

/// Number of general-purpose registers in the fixed core header.
pub const NUM_GPRS: usize = 64;

/// Number of core-mesh registers in the fixed core header.
pub const NUM_MESH_REGS: usize = 8;

/// Index of the COREID register among the core-mesh registers.
pub const MESH_REG_COREID: usize = 1;

/// ELF machine number of the Epiphany architecture.
pub const EM_EPIPHANY: u16 = 0x1223;
