//! # Error Taxonomy Tests
//!
//! Every error folds into exactly one coarse class, and messages carry the offending values.

use esim_core::{ErrorKind, SimError};
use rstest::rstest;

#[rstest]
#[case(SimError::UnknownOption("bogus".into()), ErrorKind::Configuration)]
#[case(SimError::MissingArgument("coreid"), ErrorKind::Configuration)]
#[case(SimError::RegionOverlap { base: 0, len: 1 }, ErrorKind::Configuration)]
#[case(SimError::NotInTopology { coreid: 10 }, ErrorKind::Topology)]
#[case(SimError::TopologyInitFailed("x".into()), ErrorKind::Topology)]
#[case(SimError::ReservationConflict { coreid: 7 }, ErrorKind::Reservation)]
#[case(SimError::AllocationFailed { requested: 8 }, ErrorKind::Allocation)]
#[case(SimError::StaleHandle(3), ErrorKind::Allocation)]
#[case(SimError::MissingIdentity { hint: "set with --coreid" }, ErrorKind::MissingIdentity)]
#[case(SimError::ProgramAnalysis("x".into()), ErrorKind::Program)]
fn test_error_kind(#[case] err: SimError, #[case] kind: ErrorKind) {
    assert_eq!(err.kind(), kind);
}

#[test]
fn test_relocation_failure_keeps_cause() {
    let err = SimError::RelocationFailed(Box::new(SimError::AllocationFailed { requested: 64 }));
    assert_eq!(err.kind(), ErrorKind::Allocation);
    let cause = std::error::Error::source(&err).unwrap();
    assert!(cause.to_string().contains("64"));
}

#[test]
fn test_io_error_is_substrate() {
    let err: SimError = std::io::Error::other("gone").into();
    assert_eq!(err.kind(), ErrorKind::Substrate);
}

#[test]
fn test_messages_name_values() {
    let err = SimError::NotInTopology { coreid: 0x80a };
    assert_eq!(err.to_string(), "coreid 0x80a does not belong to this node");

    let err = SimError::InvalidArgument {
        option: "coreid",
        value: "0".into(),
        reason: "valid range is [1-4095] ([0x001-0xFFF])",
    };
    let text = err.to_string();
    assert!(text.contains("`0`"));
    assert!(text.contains("coreid"));

    let err = SimError::MissingIdentity {
        hint: "set with --coreid",
    };
    assert_eq!(err.to_string(), "coreid must be set (set with --coreid)");
}
