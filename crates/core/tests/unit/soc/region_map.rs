//! # Region Map Tests

use esim_core::SimError;
use esim_core::soc::{MemoryCore, RegionMap};

#[test]
fn test_region_bounds() {
    let mut map = RegionMap::new();
    map.attach_region(0x1000, 0x100).unwrap();
    assert!(!map.is_backed(0xfff));
    assert!(map.is_backed(0x1000));
    assert!(map.is_backed(0x10ff));
    assert!(!map.is_backed(0x1100));
}

#[test]
fn test_adjacent_regions() {
    let mut map = RegionMap::new();
    map.attach_region(0, 0x100).unwrap();
    map.attach_region(0x100, 0x100).unwrap();
    assert!(map.is_backed(0xff));
    assert!(map.is_backed(0x100));
    assert!(!map.is_backed(0x200));
    assert_eq!(map.regions().len(), 2);
}

#[test]
fn test_overlap_rejected() {
    let mut map = RegionMap::new();
    map.attach_region(0x1000, 0x1000).unwrap();
    let err = map.attach_region(0x1800, 0x1000).unwrap_err();
    assert!(matches!(err, SimError::RegionOverlap { base: 0x1800, .. }));
    assert_eq!(map.regions().len(), 1);
}

#[test]
fn test_wrapping_region_rejected() {
    let mut map = RegionMap::new();
    assert!(map.attach_region(u64::MAX - 4, 0x10).is_err());
}

#[test]
fn test_empty_region_rejected() {
    let mut map = RegionMap::new();
    let err = map.attach_region(0x1000, 0).unwrap_err();
    assert!(matches!(err, SimError::AllocationFailed { requested: 0 }));
}

#[test]
fn test_regions_sorted() {
    let mut map = RegionMap::new();
    map.attach_region(0x8f00_0000, 0x10).unwrap();
    map.attach_region(0, 0x10).unwrap();
    let bases: Vec<u64> = map.regions().iter().map(|r| r.base).collect();
    assert_eq!(bases, vec![0, 0x8f00_0000]);
}

#[test]
fn test_hardware_description_recorded() {
    let mut map = RegionMap::new();
    map.attach_hardware("/epiphany_mem").unwrap();
    assert_eq!(map.hardware_root(), Some("/epiphany_mem"));
    assert!(map.regions().is_empty());
}
