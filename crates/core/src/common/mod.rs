//! Common types and constants used throughout the simulator.
//!
//! This module provides the building blocks shared by every subsystem:
//! 1. **Constants:** Default memory map and core identifier ranges.
//! 2. **Error Handling:** The `SimError` type and its coarse `ErrorKind` classification.
//! 3. **Parsing:** Base-prefixed integer literals shared by option handlers.

/// Address-map and identifier constants.
pub mod constants;

/// Error types.
pub mod error;

/// Integer literal parsing.
pub mod num;

pub use error::{ErrorKind, SimError, SimResult};
