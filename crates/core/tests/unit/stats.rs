//! # Profiling Tests

use esim_core::SimError;
use esim_core::core::CoreRegistry;
use esim_core::stats::{MiscProfile, PROFILE_LABEL_WIDTH, ProfileHook, add_commas};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
#[case(0, "0")]
#[case(7, "7")]
#[case(999, "999")]
#[case(1000, "1,000")]
#[case(65536, "65,536")]
#[case(100_000, "100,000")]
#[case(u64::MAX, "18,446,744,073,709,551,615")]
fn test_add_commas(#[case] value: u64, #[case] text: &str) {
    assert_eq!(add_commas(value), text);
}

#[test]
fn test_report_layout() {
    let mut cores = CoreRegistry::new();
    let core = cores.allocate(0).unwrap();
    let mut hook = ProfileHook::install(core, &cores).unwrap();
    assert_eq!(hook.misc(), MiscProfile::default());

    for _ in 0..1_000_001 {
        hook.record_fillnop();
    }
    let label = format!("{:<width$}", "Fill nops:", width = PROFILE_LABEL_WIDTH);
    assert_eq!(
        hook.report(&cores).unwrap(),
        format!("Miscellaneous Statistics\n\n  {label} 1,000,001\n\n")
    );
}

#[test]
fn test_install_on_released_core() {
    let mut cores = CoreRegistry::new();
    let core = cores.allocate(0).unwrap();
    let hook = ProfileHook::install(core, &cores).unwrap();

    let _ = cores.release(core);
    assert!(hook.report(&cores).is_none());
    let err = ProfileHook::install(core, &cores).unwrap_err();
    assert!(matches!(err, SimError::StaleHandle(0)));
}
