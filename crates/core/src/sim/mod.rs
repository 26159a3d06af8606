//! Simulator instance lifecycle.
//!
//! Provides the bootstrapper, the option registry it drives, the program analysis it
//! runs, and the coordination capabilities an instance is specialized with.

pub mod coordination;
pub mod instance;
pub mod loader;
pub mod options;

pub use coordination::{Coordination, Meshed, Standalone};
pub use instance::{BootStage, Collaborators, OpenKind, SimulatorInstance};
pub use options::{OptionSource, SimOption};
