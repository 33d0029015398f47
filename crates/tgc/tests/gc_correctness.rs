//! GC Correctness Tests - Reachability and Sweep Behavior
//!
//! These tests verify that the collector:
//! - Sweeps every object not reachable from a root
//! - Preserves everything reachable through strong edges
//! - Returns swept bytes to the arena
//! - Leaves the heap in a consistent state for the next cycle

mod common;

use common::{assert_live, assert_swept, GcFixture};
use tgc::{GcError, GcState, PressureLevel, ReferenceTier};

/// ============================================================================
/// BASIC SCENARIOS
/// ============================================================================

/// Destroying the only strong handle makes its target garbage
#[test]
fn test_released_strong_handle_frees_target() {
    let mut fixture = GcFixture::with_defaults();
    let used_before = fixture.used();

    let object = fixture.allocate(256);
    fixture.heap.add_root(object).unwrap();
    let strong = fixture.heap.wrap(object, ReferenceTier::Strong).unwrap();
    strong.release(&mut fixture.heap).unwrap();

    let stats = fixture.collect();
    assert_eq!(stats.objects_swept, 1);
    assert_swept(&fixture.heap, &[object], "root removed with its strong handle");
    assert_eq!(fixture.used(), used_before);
}

/// An unrooted object behind a weak handle is swept and the handle empties
#[test]
fn test_weak_handle_to_unrooted_object_reads_empty() {
    let mut fixture = GcFixture::with_defaults();
    let object = fixture.allocate(64);
    let weak = fixture.wrap(object, ReferenceTier::Weak);

    fixture.collect();
    assert_eq!(fixture.get(weak), None);
    assert_swept(&fixture.heap, &[object], "weakly held object");
}

/// A soft handle survives without pressure and is cleared once pressure rises
#[test]
fn test_soft_handle_follows_pressure() {
    let mut fixture = GcFixture::with_pressure(PressureLevel::None);
    let object = fixture.allocate(64);
    let soft = fixture.wrap(object, ReferenceTier::Soft);

    fixture.collect();
    assert_eq!(fixture.get(soft), Some(object));
    assert_live(&fixture.heap, &[object], "soft retained at pressure 0");

    fixture.force_pressure(PressureLevel::Low);
    fixture.collect();
    assert_eq!(fixture.get(soft), None);
    assert_swept(&fixture.heap, &[object], "soft cleared at pressure 1");
}

/// Two objects referencing each other with no root are both swept
#[test]
fn test_unrooted_cycle_collected() {
    let mut fixture = GcFixture::with_defaults();
    let a = fixture.allocate(32);
    let b = fixture.allocate_with_edges(32, &[a]);
    fixture.heap.set_edges(a, &[b]).unwrap();

    let stats = fixture.collect();
    assert_eq!(stats.objects_swept, 2);
    assert_eq!(stats.bytes_reclaimed, 64);
    assert_swept(&fixture.heap, &[a, b], "unrooted cycle");
}

/// Running out of memory, collecting, and retrying the same allocation
#[test]
fn test_allocation_succeeds_after_collect() {
    let mut fixture = GcFixture::with_capacity(4096);
    let size = 1000;

    let error = loop {
        match fixture.heap.allocate(size, &[]) {
            Ok(_) => continue,
            Err(error) => break error,
        }
    };
    assert!(matches!(error, GcError::OutOfMemory { requested: 1000, .. }));

    fixture.collect();
    assert!(fixture.heap.allocate(size, &[]).is_ok());
}

/// ============================================================================
/// REACHABILITY
/// ============================================================================

#[test]
fn test_rooted_cycle_survives() {
    let mut fixture = GcFixture::with_defaults();
    let a = fixture.allocate(32);
    let b = fixture.allocate_with_edges(32, &[a]);
    fixture.heap.set_edges(a, &[b]).unwrap();
    fixture.heap.add_root(a).unwrap();

    let stats = fixture.collect();
    assert_eq!(stats.objects_marked, 2);
    assert_eq!(stats.objects_swept, 0);
    assert_live(&fixture.heap, &[a, b], "rooted cycle");
}

#[test]
fn test_deep_chain_reachable_from_head() {
    let mut fixture = GcFixture::with_defaults();
    let (head, chain) = fixture.allocate_chain(10_000, 8);
    fixture.heap.add_root(head).unwrap();

    let stats = fixture.collect();
    assert_eq!(stats.objects_marked, 10_000);
    assert_live(&fixture.heap, &chain, "deep chain");

    fixture.heap.remove_root(head);
    let stats = fixture.collect();
    assert_eq!(stats.objects_swept, 10_000);
    assert_eq!(fixture.used(), 0);
}

#[test]
fn test_cutting_an_edge_frees_the_tail() {
    let mut fixture = GcFixture::with_defaults();
    let (head, chain) = fixture.allocate_chain(4, 16);
    fixture.heap.add_root(head).unwrap();

    fixture.heap.set_edges(chain[1], &[]).unwrap();
    let stats = fixture.collect();

    assert_eq!(stats.objects_swept, 2);
    assert_live(&fixture.heap, &chain[..2], "chain prefix");
    assert_swept(&fixture.heap, &chain[2..], "chain tail");
}

#[test]
fn test_shared_child_survives_while_one_parent_lives() {
    let mut fixture = GcFixture::with_defaults();
    let child = fixture.allocate(8);
    let left = fixture.allocate_with_edges(8, &[child]);
    let right = fixture.allocate_with_edges(8, &[child]);
    fixture.heap.add_root(left).unwrap();
    fixture.heap.add_root(right).unwrap();

    fixture.heap.remove_root(left);
    fixture.collect();
    assert_swept(&fixture.heap, &[left], "unrooted parent");
    assert_live(&fixture.heap, &[right, child], "rooted parent and child");
}

#[test]
fn test_duplicate_root_is_single_root() {
    let mut fixture = GcFixture::with_defaults();
    let object = fixture.allocate(8);
    fixture.heap.add_root(object).unwrap();
    fixture.heap.add_root(object).unwrap();
    assert_eq!(fixture.heap.roots(), vec![object]);

    fixture.heap.remove_root(object);
    fixture.collect();
    assert_swept(&fixture.heap, &[object], "root added twice, removed once");
}

#[test]
fn test_weak_handle_does_not_keep_target_alive() {
    let mut fixture = GcFixture::with_pressure(PressureLevel::None);
    let child = fixture.allocate(8);
    let parent = fixture.allocate_with_edges(8, &[child]);
    let weak_parent = fixture.wrap(parent, ReferenceTier::Weak);
    let weak_child = fixture.wrap(child, ReferenceTier::Weak);

    let stats = fixture.collect();
    assert_eq!(stats.objects_swept, 2);
    assert_eq!(stats.weak_refs_cleared, 2);
    assert_eq!(fixture.get(weak_parent), None);
    assert_eq!(fixture.get(weak_child), None);
}

/// ============================================================================
/// CYCLE BOOKKEEPING
/// ============================================================================

#[test]
fn test_surviving_objects_are_collectable_next_cycle() {
    let mut fixture = GcFixture::with_defaults();
    let object = fixture.allocate_rooted(128);

    for _ in 0..3 {
        assert_eq!(fixture.collect().objects_swept, 0);
    }

    fixture.heap.remove_root(object);
    assert_eq!(fixture.collect().objects_swept, 1);
    assert_eq!(fixture.heap.cycle_count(), 4);
}

#[test]
fn test_cycle_stats_account_bytes() {
    let mut fixture = GcFixture::with_defaults();
    fixture.allocate_rooted(100);
    fixture.allocate(200);
    fixture.allocate(300);

    let stats = fixture.collect();
    assert_eq!(stats.used_before, 600);
    assert_eq!(stats.used_after, 100);
    assert_eq!(stats.bytes_reclaimed, 500);
    assert_eq!(stats.objects_surviving(), 1);
    assert_eq!(fixture.heap.state(), GcState::Idle);
}

#[test]
fn test_stale_id_never_aliases_reused_slot() {
    let mut fixture = GcFixture::with_defaults();
    let old = fixture.allocate(8);
    fixture.collect();

    let new = fixture.allocate(8);
    assert_eq!(old.index(), new.index());
    assert_ne!(old, new);
    assert!(!fixture.heap.contains(old));
    assert!(matches!(
        fixture.heap.add_root(old),
        Err(GcError::InvalidReference { .. })
    ));
}
