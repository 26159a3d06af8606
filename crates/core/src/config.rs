//! Configuration system for the simulator instance.
//!
//! This module defines all configuration structures used to parameterize an instance.
//! It provides:
//! 1. **Defaults:** Baseline address map, mesh cluster geometry, and engine sizing.
//! 2. **Structures:** Hierarchical config for general, memory, mesh, and decode-engine settings.
//! 3. **Enums:** Memory provisioning strategy.
//!
//! Configuration is read from JSON (`Config::from_json`, `Config::from_file`) or built with
//! `Config::default()`. Option handlers mutate the owning instance's copy, never a global.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::common::SimResult;
use crate::common::constants;

/// Default configuration constants for the simulator.
mod defaults {
    use crate::common::constants;

    /// External memory banks are provisioned unless turned off.
    pub const EXTERNAL_MEMORY: bool = true;

    /// Node rank of this process inside the cluster.
    pub const RANK: u32 = 0;

    /// Number of nodes sharing the cluster window.
    pub const NODES: u32 = 1;

    /// First mesh row of the cluster window.
    pub const ROW_BASE: u16 = 32;

    /// First mesh column of the cluster window.
    pub const COL_BASE: u16 = 8;

    /// Rows in the cluster window.
    pub const ROWS: u16 = 2;

    /// Columns in the cluster window.
    pub const COLS: u16 = 2;

    /// Per-core memory region size (1 MiB).
    pub const CORE_MEM_REGION: u64 = 1024 * 1024;

    /// External RAM size (32 MiB).
    pub const EXT_RAM_SIZE: u64 = 32 * 1024 * 1024;

    /// Node hosting the external RAM.
    pub const EXT_RAM_NODE: u32 = 0;

    /// Base address of the external RAM window.
    pub const EXT_RAM_BASE: u64 = constants::EXT_MEM_BANK0_START;

    /// Extension bytes requested by the reference decode engine.
    pub const EXTENSION_BYTES: usize = 256;
}

/// How default memory is established.
///
/// The two strategies are mutually exclusive: with a hardware description the
/// Memory Provisioner never runs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub enum Provisioning {
    /// The Memory Provisioner installs the primary region and external banks.
    #[default]
    Core,
    /// Memory comes from a hardware-description tree rooted at `root`.
    HardwareDescription {
        /// Root node of the hardware tree (e.g. `/epiphany_mem`).
        root: String,
    },
}

/// Root configuration structure containing all instance settings.
///
/// # Examples
///
/// ```
/// use esim_core::config::Config;
///
/// let config = Config::default();
/// assert!(config.memory.external_memory);
/// assert_eq!(config.mesh.rows, 2);
/// ```
///
/// Partial documents fill the rest from defaults:
///
/// ```
/// use esim_core::config::{Config, Provisioning};
///
/// let json = r#"{
///     "memory": { "external_memory": false },
///     "mesh": { "rows": 4, "cols": 4, "substrate_dir": "/tmp/esim-mesh" }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert!(!config.memory.external_memory);
/// assert_eq!(config.memory.provisioning, Provisioning::Core);
/// assert_eq!(config.mesh.rows, 4);
/// assert_eq!(config.mesh.row_base, 32);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Memory map and provisioning
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Mesh cluster geometry and substrate location
    #[serde(default)]
    pub mesh: MeshConfig,
    /// Decode engine sizing
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Config {
    /// Parses a configuration document.
    pub fn from_json(text: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a configuration file.
    pub fn from_file(path: &Path) -> SimResult<Self> {
        let file = File::open(path).map_err(serde_json::Error::io)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// General settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Reject ELF programs built for a different machine when applying configuration.
    #[serde(default = "GeneralConfig::default_check_machine")]
    pub check_machine: bool,
}

impl GeneralConfig {
    fn default_check_machine() -> bool {
        true
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            check_machine: true,
        }
    }
}

/// Memory map and provisioning configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Provision the two external banks (toggled by `--external-memory`).
    #[serde(default = "MemoryConfig::default_external_memory")]
    pub external_memory: bool,

    /// Provisioning strategy
    #[serde(default)]
    pub provisioning: Provisioning,

    /// Primary region base address
    #[serde(default = "MemoryConfig::default_primary_base")]
    pub primary_base: u64,

    /// Primary region size in bytes
    #[serde(default = "MemoryConfig::default_primary_size")]
    pub primary_size: u64,

    /// External bank 0 base address
    #[serde(default = "MemoryConfig::default_bank0")]
    pub ext_bank0_base: u64,

    /// External bank 1 base address
    #[serde(default = "MemoryConfig::default_bank1")]
    pub ext_bank1_base: u64,

    /// Size of each external bank in bytes
    #[serde(default = "MemoryConfig::default_bank_size")]
    pub ext_bank_size: u64,
}

impl MemoryConfig {
    fn default_external_memory() -> bool {
        defaults::EXTERNAL_MEMORY
    }

    fn default_primary_base() -> u64 {
        constants::DEFAULT_MEM_BASE
    }

    fn default_primary_size() -> u64 {
        constants::DEFAULT_MEM_SIZE
    }

    fn default_bank0() -> u64 {
        constants::EXT_MEM_BANK0_START
    }

    fn default_bank1() -> u64 {
        constants::EXT_MEM_BANK1_START
    }

    fn default_bank_size() -> u64 {
        constants::EXT_MEM_BANK_SIZE
    }

    /// Returns the external banks in provisioning order.
    pub const fn external_banks(&self) -> [(u64, u64); 2] {
        [
            (self.ext_bank0_base, self.ext_bank_size),
            (self.ext_bank1_base, self.ext_bank_size),
        ]
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            external_memory: defaults::EXTERNAL_MEMORY,
            provisioning: Provisioning::default(),
            primary_base: constants::DEFAULT_MEM_BASE,
            primary_size: constants::DEFAULT_MEM_SIZE,
            ext_bank0_base: constants::EXT_MEM_BANK0_START,
            ext_bank1_base: constants::EXT_MEM_BANK1_START,
            ext_bank_size: constants::EXT_MEM_BANK_SIZE,
        }
    }
}

/// Mesh cluster configuration.
///
/// Describes the rectangular window of the global core grid this cluster occupies,
/// how it is split between nodes, and where the external RAM lives.
#[derive(Debug, Clone, Deserialize)]
pub struct MeshConfig {
    /// Rank of this node within the cluster
    #[serde(default = "MeshConfig::default_rank")]
    pub rank: u32,

    /// Number of nodes sharing the cluster
    #[serde(default = "MeshConfig::default_nodes")]
    pub nodes: u32,

    /// First row of the cluster window
    #[serde(default = "MeshConfig::default_row_base")]
    pub row_base: u16,

    /// First column of the cluster window
    #[serde(default = "MeshConfig::default_col_base")]
    pub col_base: u16,

    /// Rows in the cluster window
    #[serde(default = "MeshConfig::default_rows")]
    pub rows: u16,

    /// Columns in the cluster window
    #[serde(default = "MeshConfig::default_cols")]
    pub cols: u16,

    /// Per-core memory region size
    #[serde(default = "MeshConfig::default_core_mem_region")]
    pub core_mem_region: u64,

    /// External RAM size
    #[serde(default = "MeshConfig::default_ext_ram_size")]
    pub ext_ram_size: u64,

    /// Node hosting the external RAM
    #[serde(default = "MeshConfig::default_ext_ram_node")]
    pub ext_ram_node: u32,

    /// External RAM base address
    #[serde(default = "MeshConfig::default_ext_ram_base")]
    pub ext_ram_base: u64,

    /// Directory shared by sibling processes for reservations and readiness markers
    #[serde(default)]
    pub substrate_dir: Option<PathBuf>,
}

impl MeshConfig {
    fn default_rank() -> u32 {
        defaults::RANK
    }

    fn default_nodes() -> u32 {
        defaults::NODES
    }

    fn default_row_base() -> u16 {
        defaults::ROW_BASE
    }

    fn default_col_base() -> u16 {
        defaults::COL_BASE
    }

    fn default_rows() -> u16 {
        defaults::ROWS
    }

    fn default_cols() -> u16 {
        defaults::COLS
    }

    fn default_core_mem_region() -> u64 {
        defaults::CORE_MEM_REGION
    }

    fn default_ext_ram_size() -> u64 {
        defaults::EXT_RAM_SIZE
    }

    fn default_ext_ram_node() -> u32 {
        defaults::EXT_RAM_NODE
    }

    fn default_ext_ram_base() -> u64 {
        defaults::EXT_RAM_BASE
    }
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            rank: defaults::RANK,
            nodes: defaults::NODES,
            row_base: defaults::ROW_BASE,
            col_base: defaults::COL_BASE,
            rows: defaults::ROWS,
            cols: defaults::COLS,
            core_mem_region: defaults::CORE_MEM_REGION,
            ext_ram_size: defaults::EXT_RAM_SIZE,
            ext_ram_node: defaults::EXT_RAM_NODE,
            ext_ram_base: defaults::EXT_RAM_BASE,
            substrate_dir: None,
        }
    }
}

/// Decode engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Extension bytes the reference engine appends to each core record
    #[serde(default = "EngineConfig::default_extension_bytes")]
    pub extension_bytes: usize,

    /// Install the profiling hook at attach time
    #[serde(default = "EngineConfig::default_profile")]
    pub profile: bool,
}

impl EngineConfig {
    fn default_extension_bytes() -> usize {
        defaults::EXTENSION_BYTES
    }

    fn default_profile() -> bool {
        true
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            extension_bytes: defaults::EXTENSION_BYTES,
            profile: true,
        }
    }
}
