//! Simulator error definitions.
//!
//! This module defines the single error type returned by every fallible operation. It provides:
//! 1. **Variants:** One per failure the bootstrapper, option handlers, relocator, provisioner,
//!    and mesh coordinator can report.
//! 2. **Classification:** `ErrorKind` folds variants into the coarse taxonomy callers act on.
//!
//! No error is recovered locally: the bootstrapper unwinds on the first failure and reports upward.

use thiserror::Error;

/// Coarse failure classes.
///
/// Every `SimError` belongs to exactly one class; callers that only care about the
/// category (e.g. an external controller deciding whether to prompt for a coreid)
/// match on this instead of on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad option, option argument, or configuration document.
    Configuration,
    /// Identifier outside the configured mesh window, or unusable topology.
    Topology,
    /// Identifier already held by a sibling process.
    Reservation,
    /// Core state or memory region could not be obtained.
    Allocation,
    /// Launch attempted without a valid, reserved identifier.
    MissingIdentity,
    /// The shared substrate could not be reached or manipulated.
    Substrate,
    /// The program image could not be analyzed.
    Program,
}

/// Errors produced while opening, configuring, or launching a simulator instance.
#[derive(Debug, Error)]
pub enum SimError {
    /// An option argument was malformed or out of range.
    #[error("invalid argument `{value}` for option `{option}`: {reason}")]
    InvalidArgument {
        /// Option name as registered (e.g. `coreid`).
        option: &'static str,
        /// Raw argument text.
        value: String,
        /// Human-readable constraint that was violated.
        reason: &'static str,
    },

    /// The option name is not registered for this instance variant.
    #[error("unrecognized option `{0}`")]
    UnknownOption(String),

    /// A required-argument option was given without its argument.
    #[error("option `{0}` requires an argument")]
    MissingArgument(&'static str),

    /// The identifier decodes to a row/column outside this node's window.
    #[error("coreid {coreid:#05x} does not belong to this node")]
    NotInTopology {
        /// Offending identifier.
        coreid: u16,
    },

    /// Another process already holds the identifier.
    #[error("coreid {coreid:#05x} is already reserved by another sim process")]
    ReservationConflict {
        /// Contended identifier.
        coreid: u16,
    },

    /// Core state relocation failed after the identifier changed.
    #[error("core state relocation failed")]
    RelocationFailed(#[source] Box<SimError>),

    /// A core record or memory region of the requested size could not be obtained.
    #[error("allocation of {requested} bytes failed")]
    AllocationFailed {
        /// Number of bytes requested.
        requested: usize,
    },

    /// A core handle no longer refers to a live record.
    #[error("core handle {0} does not refer to a live core record")]
    StaleHandle(usize),

    /// The instance has no valid, reserved identifier.
    #[error("coreid must be set ({hint})")]
    MissingIdentity {
        /// How the identifier can be supplied for this launch kind.
        hint: &'static str,
    },

    /// The mesh topology could not be built or the substrate could not be reached.
    #[error("mesh topology initialization failed: {0}")]
    TopologyInitFailed(String),

    /// A requested region overlaps a region that is already mapped.
    #[error("memory region {base:#x},{len:#x} overlaps an existing mapping")]
    RegionOverlap {
        /// Requested base address.
        base: u64,
        /// Requested length in bytes.
        len: u64,
    },

    /// The program image is unreadable or unsuitable for this target.
    #[error("program analysis failed: {0}")]
    ProgramAnalysis(String),

    /// I/O failure while talking to the shared substrate.
    #[error("substrate I/O error: {0}")]
    Substrate(#[from] std::io::Error),

    /// The configuration document could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl SimError {
    /// Returns the coarse class this error belongs to.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. }
            | Self::UnknownOption(_)
            | Self::MissingArgument(_)
            | Self::RegionOverlap { .. }
            | Self::Config(_) => ErrorKind::Configuration,
            Self::NotInTopology { .. } | Self::TopologyInitFailed(_) => ErrorKind::Topology,
            Self::ReservationConflict { .. } => ErrorKind::Reservation,
            Self::RelocationFailed(_) | Self::AllocationFailed { .. } | Self::StaleHandle(_) => {
                ErrorKind::Allocation
            }
            Self::MissingIdentity { .. } => ErrorKind::MissingIdentity,
            Self::Substrate(_) => ErrorKind::Substrate,
            Self::ProgramAnalysis(_) => ErrorKind::Program,
        }
    }
}

/// Convenience alias used across the crate.
pub type SimResult<T> = Result<T, SimError>;
