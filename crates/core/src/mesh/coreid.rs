//! Core identifiers.
//!
//! An identifier is a 12-bit value: the upper six bits select the mesh row, the lower
//! six the column. Zero is reserved as "no identifier".

use std::fmt;

use crate::common::constants::{COREID_COL_BITS, COREID_COL_MASK, COREID_MAX, COREID_MIN};
use crate::common::num::parse_unsigned;

/// A core identifier in `[1, 4095]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoreId(u16);

impl CoreId {
    /// Wraps `raw` if it is in range.
    pub const fn new(raw: u16) -> Option<Self> {
        if raw >= COREID_MIN && raw <= COREID_MAX {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// Builds the identifier of the core at (`row`, `col`).
    pub const fn from_row_col(row: u16, col: u16) -> Option<Self> {
        if row > (COREID_MAX >> COREID_COL_BITS) || col > COREID_COL_MASK {
            return None;
        }
        Self::new((row << COREID_COL_BITS) | col)
    }

    /// Parses an option argument such as `0x808`, `04010`, or `2056`.
    ///
    /// # Errors
    ///
    /// Returns the violated constraint as a static message.
    pub fn parse(text: &str) -> Result<Self, &'static str> {
        let value = parse_unsigned(text).ok_or("expected a non-negative integer literal")?;
        u16::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or("valid range is [1-4095] ([0x001-0xFFF])")
    }

    /// Raw identifier value.
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Mesh row.
    pub const fn row(self) -> u16 {
        self.0 >> COREID_COL_BITS
    }

    /// Mesh column.
    pub const fn col(self) -> u16 {
        self.0 & COREID_COL_MASK
    }
}

impl fmt::Display for CoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#05x}", self.0)
    }
}
