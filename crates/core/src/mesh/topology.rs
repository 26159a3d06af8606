//! Mesh topology.
//!
//! The cluster occupies a `rows x cols` window of the global grid starting at
//! (`row_base`, `col_base`). With several nodes the window is split row-major into equal
//! slices and each node owns the slice matching its rank; only those cores are members
//! from this process's point of view.

use std::ops::Range;

use crate::common::constants::{COREID_COL_BITS, COREID_MAX};
use crate::common::{SimError, SimResult};
use crate::config::MeshConfig;

use super::coreid::CoreId;

/// Largest row or column index a 12-bit identifier can encode.
const GRID_EDGE: u32 = 1 << COREID_COL_BITS;

/// Immutable description of the cluster and this node's place in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshTopology {
    rank: u32,
    nodes: u32,
    row_base: u16,
    col_base: u16,
    rows: u16,
    cols: u16,
    core_mem_region: u64,
    ext_ram_size: u64,
    ext_ram_node: u32,
    ext_ram_base: u64,
}

impl MeshTopology {
    /// Validates `config` and builds the topology.
    ///
    /// # Errors
    ///
    /// `TopologyInitFailed` when the window is empty, leaves the 64x64 grid, cannot be
    /// split evenly between nodes, or names a rank or external-RAM node that does not exist.
    pub fn from_config(config: &MeshConfig) -> SimResult<Self> {
        let fail = |why: String| Err(SimError::TopologyInitFailed(why));

        if config.rows == 0 || config.cols == 0 {
            return fail(format!("empty cluster window {}x{}", config.rows, config.cols));
        }
        if u32::from(config.row_base) + u32::from(config.rows) > GRID_EDGE
            || u32::from(config.col_base) + u32::from(config.cols) > GRID_EDGE
        {
            return fail(format!(
                "cluster window {}x{} at ({}, {}) exceeds the {GRID_EDGE}x{GRID_EDGE} grid",
                config.rows, config.cols, config.row_base, config.col_base
            ));
        }
        if config.nodes == 0 || config.rank >= config.nodes {
            return fail(format!("rank {} outside {} node(s)", config.rank, config.nodes));
        }
        let cores = u32::from(config.rows) * u32::from(config.cols);
        if cores % config.nodes != 0 {
            return fail(format!("{cores} cores cannot be split across {} nodes", config.nodes));
        }
        if config.ext_ram_node >= config.nodes {
            return fail(format!("external RAM node {} does not exist", config.ext_ram_node));
        }

        Ok(Self {
            rank: config.rank,
            nodes: config.nodes,
            row_base: config.row_base,
            col_base: config.col_base,
            rows: config.rows,
            cols: config.cols,
            core_mem_region: config.core_mem_region,
            ext_ram_size: config.ext_ram_size,
            ext_ram_node: config.ext_ram_node,
            ext_ram_base: config.ext_ram_base,
        })
    }

    /// Node rank.
    pub const fn rank(&self) -> u32 {
        self.rank
    }

    /// Cluster window as (row_base, col_base, rows, cols).
    pub const fn window(&self) -> (u16, u16, u16, u16) {
        (self.row_base, self.col_base, self.rows, self.cols)
    }

    /// Per-core memory region size.
    pub const fn core_mem_region(&self) -> u64 {
        self.core_mem_region
    }

    /// External RAM window as (base, size).
    pub const fn ext_ram(&self) -> (u64, u64) {
        (self.ext_ram_base, self.ext_ram_size)
    }

    /// True if this node hosts the external RAM.
    pub const fn hosts_ext_ram(&self) -> bool {
        self.ext_ram_node == self.rank
    }

    /// Number of cores owned by each node.
    pub fn cores_per_node(&self) -> usize {
        (usize::from(self.rows) * usize::from(self.cols)) / self.nodes as usize
    }

    /// Row-major window indices owned by this node.
    fn local_slice(&self) -> Range<usize> {
        let per_node = self.cores_per_node();
        let start = self.rank as usize * per_node;
        start..start + per_node
    }

    /// Returns true if `coreid` decodes into this node's slice of the window.
    pub fn is_member(&self, coreid: CoreId) -> bool {
        let (row, col) = (coreid.row(), coreid.col());
        if row < self.row_base
            || row >= self.row_base + self.rows
            || col < self.col_base
            || col >= self.col_base + self.cols
        {
            return false;
        }
        let index = usize::from(row - self.row_base) * usize::from(self.cols)
            + usize::from(col - self.col_base);
        self.local_slice().contains(&index)
    }

    /// Identifiers of every core this node owns, in row-major order.
    pub fn members(&self) -> Vec<CoreId> {
        self.local_slice()
            .filter_map(|index| self.coreid_at(index))
            .collect()
    }

    /// Identifiers of every core in the cluster window, across all nodes.
    ///
    /// This is the participant set of the peer barrier.
    pub fn cluster(&self) -> Vec<CoreId> {
        (0..usize::from(self.rows) * usize::from(self.cols))
            .filter_map(|index| self.coreid_at(index))
            .collect()
    }

    fn coreid_at(&self, index: usize) -> Option<CoreId> {
        let row = self.row_base + (index / usize::from(self.cols)) as u16;
        let col = self.col_base + (index % usize::from(self.cols)) as u16;
        CoreId::from_row_col(row, col)
    }

    /// Text that sibling processes compare to detect incompatible geometry.
    pub fn signature(&self) -> String {
        format!(
            "nodes={} rows={} cols={} row_base={} col_base={} max={COREID_MAX}",
            self.nodes, self.rows, self.cols, self.row_base, self.col_base
        )
    }
}
