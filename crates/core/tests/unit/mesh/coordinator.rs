//! # Mesh Coordinator Tests
//!
//! Identity lifecycle, validity, and the peer barrier.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Barrier, mpsc};
use std::thread;
use std::time::Duration;

use esim_core::config::MeshConfig;
#[cfg(unix)]
use esim_core::mesh::DirSubstrate;
use esim_core::mesh::{
    BlockIndefinitely, CoreId, LocalSubstrate, MeshCoordinator, MeshSubstrate, PeerWaitPolicy,
};
use esim_core::{ErrorKind, SimError};
use proptest::prelude::*;

fn id(raw: u16) -> CoreId {
    CoreId::new(raw).unwrap()
}

fn coordinator(config: &MeshConfig, substrate: &Arc<LocalSubstrate>) -> MeshCoordinator {
    let seed: Arc<dyn MeshSubstrate> = substrate.clone();
    MeshCoordinator::initialize(config, seed).unwrap()
}

/// A row of eight cores at the grid origin, which makes 1..=7 members.
fn origin_row() -> MeshConfig {
    MeshConfig {
        row_base: 0,
        col_base: 0,
        rows: 1,
        cols: 8,
        ..MeshConfig::default()
    }
}

fn fast() -> Box<dyn PeerWaitPolicy> {
    Box::new(BlockIndefinitely::new(0, Duration::from_millis(2)))
}

#[test]
fn test_starts_without_identity() {
    let substrate = Arc::new(LocalSubstrate::new());
    let mesh = coordinator(&MeshConfig::default(), &substrate);
    assert_eq!(mesh.coreid(), None);
    assert!(!mesh.is_valid());
}

#[test]
fn test_reserve_member() {
    let substrate = Arc::new(LocalSubstrate::new());
    let mut mesh = coordinator(&MeshConfig::default(), &substrate);

    mesh.reserve(id(0x808)).unwrap();
    assert_eq!(mesh.coreid(), Some(id(0x808)));
    assert!(mesh.is_valid());
    assert_eq!(substrate.owner_of(id(0x808)), Some(mesh.owner()));

    mesh.reserve(id(0x808)).unwrap();
    assert_eq!(mesh.coreid(), Some(id(0x808)));
}

#[test]
fn test_non_member_leaves_identity_unset() {
    let substrate = Arc::new(LocalSubstrate::new());
    let mut mesh = coordinator(&MeshConfig::default(), &substrate);

    let err = mesh.reserve(id(10)).unwrap_err();
    assert!(matches!(err, SimError::NotInTopology { coreid: 10 }));
    assert_eq!(mesh.coreid(), None);
    assert_eq!(substrate.owner_of(id(10)), None);
}

#[test]
fn test_two_coordinators_reserve_7() {
    let substrate = Arc::new(LocalSubstrate::new());
    let mut first = coordinator(&origin_row(), &substrate);
    let mut second = coordinator(&origin_row(), &substrate);

    first.reserve(id(7)).unwrap();
    let err = second.reserve(id(7)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Reservation);
    assert_eq!(second.coreid(), None);
    assert!(first.is_valid());
    assert!(!second.is_valid());
}

#[test]
fn test_concurrent_reserve_7_has_one_winner() {
    const CONTENDERS: usize = 6;
    let substrate = Arc::new(LocalSubstrate::new());
    let start = Arc::new(Barrier::new(CONTENDERS));

    let handles: Vec<_> = (0..CONTENDERS)
        .map(|_| {
            let substrate = Arc::clone(&substrate);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                let mut mesh = coordinator(&origin_row(), &substrate);
                let _ = start.wait();
                let result = mesh.reserve(id(7));
                let won = result.is_ok();
                if let Err(e) = result {
                    assert!(matches!(e, SimError::ReservationConflict { coreid: 7 }));
                }
                // Keep the winner's claim alive until every contender has tried.
                let _ = start.wait();
                won
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|won| *won)
        .count();
    assert_eq!(winners, 1);
}

#[test]
fn test_reset_claims_new_before_releasing_old() {
    let substrate = Arc::new(LocalSubstrate::new());
    let mut mesh = coordinator(&MeshConfig::default(), &substrate);
    let mut rival = coordinator(&MeshConfig::default(), &substrate);

    mesh.reserve(id(0x808)).unwrap();
    rival.reserve(id(0x809)).unwrap();

    assert!(mesh.reserve(id(0x809)).is_err());
    assert_eq!(mesh.coreid(), Some(id(0x808)));
    assert!(mesh.is_valid());

    mesh.reserve(id(0x848)).unwrap();
    assert_eq!(substrate.owner_of(id(0x808)), None);
    assert_eq!(substrate.owner_of(id(0x848)), Some(mesh.owner()));
}

#[test]
fn test_drop_releases_identity() {
    let substrate = Arc::new(LocalSubstrate::new());
    {
        let mut mesh = coordinator(&MeshConfig::default(), &substrate);
        mesh.reserve(id(0x849)).unwrap();
    }
    assert_eq!(substrate.owner_of(id(0x849)), None);
}

#[test]
fn test_initialize_rejects_foreign_geometry() {
    let substrate = Arc::new(LocalSubstrate::new());
    let _mesh = coordinator(&MeshConfig::default(), &substrate);

    let seed: Arc<dyn MeshSubstrate> = substrate.clone();
    let other = MeshConfig {
        rows: 3,
        ..MeshConfig::default()
    };
    let err = MeshCoordinator::initialize(&other, seed).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Topology);
}

#[test]
fn test_single_core_barrier_passes() {
    let substrate = Arc::new(LocalSubstrate::new());
    let config = MeshConfig {
        rows: 1,
        cols: 1,
        ..MeshConfig::default()
    };
    let mut mesh = coordinator(&config, &substrate).with_policy(fast());
    mesh.reserve(id(0x808)).unwrap();
    mesh.wait_for_peers();
}

#[test]
fn test_barrier_waits_for_all_four() {
    let substrate = Arc::new(LocalSubstrate::new());
    let arrived = Arc::new(AtomicU64::new(0));

    let handles: Vec<_> = [0x808u16, 0x809, 0x848, 0x849]
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            let substrate = Arc::clone(&substrate);
            let arrived = Arc::clone(&arrived);
            thread::spawn(move || {
                let mut mesh = coordinator(&MeshConfig::default(), &substrate).with_policy(fast());
                mesh.reserve(id(raw)).unwrap();
                thread::sleep(Duration::from_millis(10 * i as u64));
                let _ = arrived.fetch_add(1, Ordering::SeqCst);
                mesh.wait_for_peers();
                // Nobody leaves the barrier before everyone arrived.
                assert_eq!(arrived.load(Ordering::SeqCst), 4);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

/// Runs a two-core barrier where one side exits as soon as it passes.
fn assert_peer_exit_releases_waiter(waiting: Arc<dyn MeshSubstrate>, leaving: Arc<dyn MeshSubstrate>) {
    let config = MeshConfig {
        rows: 1,
        cols: 2,
        ..MeshConfig::default()
    };
    let (done, passed) = mpsc::channel();

    let shared = config.clone();
    let waiter = thread::spawn(move || {
        let mut mesh = MeshCoordinator::initialize(&shared, waiting)
            .unwrap()
            .with_policy(Box::new(BlockIndefinitely::new(0, Duration::from_millis(50))));
        mesh.reserve(id(0x808)).unwrap();
        mesh.wait_for_peers();
        let _ = done.send(());
    });

    let mut mesh = MeshCoordinator::initialize(&config, leaving)
        .unwrap()
        .with_policy(fast());
    mesh.reserve(id(0x809)).unwrap();
    mesh.wait_for_peers();
    drop(mesh);

    assert!(passed.recv_timeout(Duration::from_secs(5)).is_ok());
    waiter.join().unwrap();
}

#[test]
fn test_peer_exit_after_barrier_releases_waiter() {
    let substrate = Arc::new(LocalSubstrate::new());
    assert_peer_exit_releases_waiter(substrate.clone(), substrate);
}

#[cfg(unix)]
#[test]
fn test_peer_exit_after_barrier_releases_waiter_across_handles() {
    let dir = tempfile::tempdir().unwrap();
    assert_peer_exit_releases_waiter(
        Arc::new(DirSubstrate::new(dir.path())),
        Arc::new(DirSubstrate::new(dir.path())),
    );
}

#[derive(Debug)]
struct Counting {
    rounds: Arc<AtomicU64>,
}

impl PeerWaitPolicy for Counting {
    fn on_pending(&mut self, round: u64, ready: usize, expected: usize) {
        assert!(ready < expected);
        self.rounds.store(round, Ordering::SeqCst);
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(1)
    }
}

#[test]
fn test_policy_observes_pending_rounds() {
    let substrate = Arc::new(LocalSubstrate::new());
    let config = MeshConfig {
        rows: 1,
        cols: 2,
        ..MeshConfig::default()
    };
    let rounds = Arc::new(AtomicU64::new(0));

    let mut late = coordinator(&config, &substrate);
    late.reserve(id(0x809)).unwrap();

    let waiter = {
        let substrate = Arc::clone(&substrate);
        let rounds = Arc::clone(&rounds);
        thread::spawn(move || {
            let mut mesh = coordinator(&config, &substrate).with_policy(Box::new(Counting {
                rounds,
            }));
            mesh.reserve(id(0x808)).unwrap();
            mesh.wait_for_peers();
            mesh
        })
    };

    while rounds.load(Ordering::SeqCst) == 0 {
        thread::sleep(Duration::from_millis(1));
    }
    late.wait_for_peers();
    let _early = waiter.join().unwrap();
    assert!(rounds.load(Ordering::SeqCst) >= 1);
}

proptest! {
    #[test]
    fn prop_no_double_holding(attempts in proptest::collection::vec((0usize..2, 1u16..=7), 1..40)) {
        let substrate = Arc::new(LocalSubstrate::new());
        let mut pair = [coordinator(&origin_row(), &substrate), coordinator(&origin_row(), &substrate)];

        for (who, raw) in attempts {
            let _ = pair[who].reserve(id(raw));
            let (a, b) = (pair[0].coreid(), pair[1].coreid());
            prop_assert!(a.is_none() || a != b);
            for mesh in &pair {
                if let Some(held) = mesh.coreid() {
                    prop_assert_eq!(substrate.owner_of(held), Some(mesh.owner()));
                }
            }
        }
    }
}
