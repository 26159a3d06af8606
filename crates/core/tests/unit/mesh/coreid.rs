//! # Core Identifier Tests

use esim_core::mesh::CoreId;
use proptest::prelude::*;
use rstest::rstest;

#[rstest]
#[case("0x808", 0x808)]
#[case("0X808", 0x808)]
#[case("2056", 0x808)]
#[case("04010", 0x808)]
#[case("1", 1)]
#[case("0xfff", 0xfff)]
#[case("4095", 4095)]
fn test_parse_accepts(#[case] text: &str, #[case] raw: u16) {
    assert_eq!(CoreId::parse(text).unwrap().get(), raw);
}

#[rstest]
#[case("0")]
#[case("0x0")]
#[case("4096")]
#[case("0x1000")]
#[case("-1")]
#[case("")]
#[case("abc")]
#[case("0x80g")]
#[case("12 ")]
#[case("08")]
#[case("99999999999999999999999")]
fn test_parse_rejects(#[case] text: &str) {
    assert!(CoreId::parse(text).is_err());
}

#[test]
fn test_row_col_decode() {
    let id = CoreId::new(0x849).unwrap();
    assert_eq!((id.row(), id.col()), (33, 9));
    assert_eq!(CoreId::from_row_col(33, 9), Some(id));
    assert_eq!(CoreId::from_row_col(0, 0), None);
    assert_eq!(CoreId::from_row_col(64, 0), None);
    assert_eq!(CoreId::from_row_col(0, 64), None);
}

#[test]
fn test_display_is_padded_hex() {
    assert_eq!(CoreId::new(10).unwrap().to_string(), "0x00a");
    assert_eq!(CoreId::new(0x808).unwrap().to_string(), "0x808");
}

proptest! {
    #[test]
    fn prop_range_enforced(raw in any::<u32>()) {
        let parsed = CoreId::parse(&raw.to_string());
        prop_assert_eq!(parsed.is_ok(), (1..=4095).contains(&raw));
    }

    #[test]
    fn prop_row_col_roundtrip(row in 0u16..64, col in 0u16..64) {
        match CoreId::from_row_col(row, col) {
            Some(id) => prop_assert_eq!((id.row(), id.col()), (row, col)),
            None => prop_assert_eq!((row, col), (0, 0)),
        }
    }
}
