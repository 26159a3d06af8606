//! Collaborator doubles.

pub mod engine;
