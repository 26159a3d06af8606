//! # Unit Components
//!
//! Tests grouped by the subsystem they exercise.

/// Error taxonomy and literal parsing.
pub mod common;






/// Profiling hook and report formatting.
pub mod stats;
