//! Core state and its collaborators.
//!
//! This module owns everything about the single simulated core record:
//! 1. **State:** The fixed header plus engine-sized extension bytes.
//! 2. **Registry:** Handle-based indirection so consumers survive relocation.
//! 3. **Relocation:** All-or-nothing replacement of the record at a new size.
//! 4. **Engine:** The decode-engine contract the bootstrapper attaches.

/// Decode engine contract and reference engine.
pub mod engine;

/// Core record registry and handles.
pub mod registry;

/// State Relocator.
pub mod relocate;

/// Core record layout.
pub mod state;

pub use engine::{DecodeEngine, ReferenceEngine};
pub use registry::{CoreHandle, CoreRegistry};
pub use relocate::relocate;
pub use state::{CoreHeader, CoreState};
