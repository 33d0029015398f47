//! GC Stress Tests - Randomized Mutator Workloads
//!
//! A seeded random mutator allocates, links, roots, unroots and wraps
//! objects while collections run in between. After every cycle the heap
//! must still be consistent:
//! - Usage never exceeds capacity
//! - Every root and every strong edge of a live object is live
//! - No handle reads a swept object
//!
//! The long-running variant is marked `#[ignore]` and should be run
//! explicitly with `cargo test --test gc_stress -- --ignored`

mod common;

use common::GcFixture;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tgc::{GcError, Heap, ObjectId, ReferenceHandle, ReferenceTier};

fn assert_consistent(heap: &Heap, handles: &[ReferenceHandle]) {
    let usage = heap.usage();
    assert!(usage.used <= usage.capacity, "usage exceeds capacity");

    for root in heap.roots() {
        assert!(heap.contains(root), "root {} was swept", root);
    }
    for object in heap.graph().iter() {
        for &edge in object.edges() {
            assert!(
                heap.contains(edge),
                "{} has dangling edge to {}",
                object.id(),
                edge
            );
        }
    }
    for handle in handles {
        if let Some(target) = handle.get(heap) {
            assert!(heap.contains(target), "{} reads swept {}", handle.id(), target);
        }
    }
}

fn run_mutator(seed: u64, steps: usize, capacity: usize) -> GcFixture {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut fixture = GcFixture::with_capacity(capacity);
    let mut rooted: Vec<ObjectId> = Vec::new();
    let mut handles: Vec<ReferenceHandle> = Vec::new();

    for step in 0..steps {
        let size = rng.gen_range(0..256);
        let edge_count = rng.gen_range(0..=rooted.len().min(4));
        let edges: Vec<ObjectId> = (0..edge_count)
            .map(|_| rooted[rng.gen_range(0..rooted.len())])
            .collect();

        match fixture.heap.allocate_or_collect(size, &edges) {
            Ok(id) => {
                match rng.gen_range(0..4) {
                    0 => {
                        fixture.heap.add_root(id).unwrap();
                        rooted.push(id);
                    },
                    1 => handles.push(fixture.heap.wrap(id, ReferenceTier::Soft).unwrap()),
                    2 => handles.push(fixture.heap.wrap(id, ReferenceTier::Weak).unwrap()),
                    _ => {},
                }
            },
            Err(GcError::OutOfMemory { .. }) => {
                let drop_count = rooted.len() / 2;
                for id in rooted.drain(..drop_count) {
                    fixture.heap.remove_root(id);
                }
            },
            Err(error) => panic!("unexpected error at step {}: {}", step, error),
        }

        if !rooted.is_empty() && rng.gen_bool(0.1) {
            let id = rooted.swap_remove(rng.gen_range(0..rooted.len()));
            fixture.heap.remove_root(id);
        }

        if rng.gen_bool(0.02) {
            fixture.collect();
            assert_consistent(&fixture.heap, &handles);
        }
    }

    fixture.collect();
    assert_consistent(&fixture.heap, &handles);
    for handle in handles {
        handle.release(&mut fixture.heap).unwrap();
    }
    fixture
}

#[test]
fn test_random_mutator_stays_consistent() {
    for seed in 0..8 {
        let fixture = run_mutator(seed, 2_000, 64 * 1024);
        assert!(fixture.heap.cycle_count() > 0);
        assert!(fixture.heap.handles().is_empty());
    }
}

#[test]
fn test_random_mutator_in_tight_arena() {
    let fixture = run_mutator(42, 5_000, 4 * 1024);
    let summary = fixture.heap.summary();
    assert!(summary.total_cycles > 0);
    assert!(summary.peak_used <= 4 * 1024);
}

/// Stress test with many cycles over a long-lived random graph
///
/// **Purpose:** Verify slot reuse and generation bumps over many cycles
#[test]
#[ignore = "Stress test - run explicitly"]
fn test_stress_long_running_mutator() {
    let fixture = run_mutator(7, 500_000, 1024 * 1024);
    let summary = fixture.heap.summary();

    println!(
        "Stress test completed: {} cycles, {} objects swept, {} bytes reclaimed, max pause {:?}",
        summary.total_cycles, summary.objects_swept, summary.bytes_reclaimed, summary.max_pause
    );
    assert!(summary.objects_swept > 0);
}
