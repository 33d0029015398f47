//! Test Utilities for the TGC Test Suite
//!
//! Fixtures and assertions shared by the integration tests. Assertions are
//! exact: a cycle either swept an object or it did not.

#![allow(dead_code)]

use tgc::{
    FixedPressure, Heap, HeapConfig, ObjectId, PressureLevel, ReferenceHandle, ReferenceTier,
};

/// Default arena size for tests (1MB)
pub const DEFAULT_CAPACITY: usize = 1024 * 1024;

/// ============================================================================
/// GC FIXTURE
/// ============================================================================

/// Test fixture owning a heap and every handle a test creates
///
/// Handles are released when the fixture is dropped, so tests only keep the
/// ones they inspect.
pub struct GcFixture {
    pub heap: Heap,
    handles: Vec<ReferenceHandle>,
}

impl GcFixture {
    /// Fixture with the default test capacity and watermark pressure
    pub fn with_defaults() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let heap = Heap::new(HeapConfig::with_capacity(capacity))
            .expect("heap initialization should succeed with valid config");
        Self {
            heap,
            handles: Vec::new(),
        }
    }

    /// Fixture whose pressure is pinned to `level` regardless of usage
    pub fn with_pressure(level: PressureLevel) -> Self {
        let mut fixture = Self::with_defaults();
        fixture.force_pressure(level);
        fixture
    }

    pub fn force_pressure(&mut self, level: PressureLevel) {
        self.heap.set_pressure_source(FixedPressure(level));
    }

    pub fn allocate(&mut self, size: usize) -> ObjectId {
        self.heap
            .allocate(size, &[])
            .expect("allocation should succeed")
    }

    pub fn allocate_with_edges(&mut self, size: usize, edges: &[ObjectId]) -> ObjectId {
        self.heap
            .allocate(size, edges)
            .expect("allocation should succeed")
    }

    pub fn allocate_rooted(&mut self, size: usize) -> ObjectId {
        let id = self.allocate(size);
        self.heap.add_root(id).expect("root registration should succeed");
        id
    }

    /// Wrap `id` and return the index of the fixture-owned handle
    pub fn wrap(&mut self, id: ObjectId, tier: ReferenceTier) -> usize {
        let handle = self.heap.wrap(id, tier).expect("wrap should succeed");
        self.handles.push(handle);
        self.handles.len() - 1
    }

    pub fn get(&self, handle: usize) -> Option<ObjectId> {
        self.handles[handle].get(&self.heap)
    }

    /// Allocate a linked chain of `length` objects; returns (head, all)
    pub fn allocate_chain(&mut self, length: usize, size: usize) -> (ObjectId, Vec<ObjectId>) {
        let mut chain = Vec::with_capacity(length);
        let mut next: Option<ObjectId> = None;
        for _ in 0..length {
            let edges: Vec<ObjectId> = next.into_iter().collect();
            let id = self.allocate_with_edges(size, &edges);
            chain.push(id);
            next = Some(id);
        }
        chain.reverse();
        (chain[0], chain)
    }

    pub fn collect(&mut self) -> tgc::CycleStats {
        self.heap.collect().clone()
    }

    pub fn used(&self) -> usize {
        self.heap.usage().used
    }
}

impl Drop for GcFixture {
    fn drop(&mut self) {
        for handle in self.handles.drain(..) {
            handle
                .release(&mut self.heap)
                .expect("fixture handles belong to the fixture heap");
        }
    }
}

/// ============================================================================
/// ASSERTIONS
/// ============================================================================

pub fn assert_live(heap: &Heap, ids: &[ObjectId], context: &str) {
    for id in ids {
        assert!(heap.contains(*id), "{}: {} was swept", context, id);
    }
}

pub fn assert_swept(heap: &Heap, ids: &[ObjectId], context: &str) {
    for id in ids {
        assert!(!heap.contains(*id), "{}: {} survived", context, id);
    }
}
