//! Marker Module - Reachability Tracing
//!
//! Identifies which objects are still reachable and which are garbage.
//!
//! Marking Algorithm:
//! - Tri-color marking: unmarked (white), on the mark stack (grey),
//!   scanned (black)
//! - Stop-the-world, single-threaded, iterative depth-first
//! - Only strong edges are followed; the mark bit stops re-traversal, so
//!   cycles terminate and unrooted cycles stay white
//!
//! Two passes can run per cycle:
//! 1. Strong marking from the root set and the targets of live strong
//!    handles ([`Mark::Reachable`])
//! 2. Retention from surviving soft handle targets ([`Mark::SoftRetained`]),
//!    which only shades objects the first pass left white

pub mod mark_queue;
pub mod roots;

pub use mark_queue::MarkStack;
pub use roots::RootSet;

use crate::heap::ObjectId;
use crate::object::{Mark, ObjectGraph};

/// Marker - per-cycle tracing state
pub struct Marker {
    stack: MarkStack,
    marked: usize,
    retained: usize,
}

impl Marker {
    pub fn new() -> Self {
        Self {
            stack: MarkStack::new(),
            marked: 0,
            retained: 0,
        }
    }

    /// Forget everything from the previous cycle
    pub fn start_cycle(&mut self) {
        self.stack.reset();
        self.marked = 0;
        self.retained = 0;
    }

    /// Mark every object reachable from the root set or `handle_roots`
    ///
    /// `handle_roots` are the targets of live strong handles. Returns the
    /// number of objects marked.
    pub fn mark_from_roots(
        &mut self,
        graph: &mut ObjectGraph,
        handle_roots: &[ObjectId],
    ) -> usize {
        let roots: Vec<ObjectId> = graph.root_set().iter().collect();
        let mut marked = 0;
        for root in roots.into_iter().chain(handle_roots.iter().copied()) {
            if self.shade(graph, root, Mark::Reachable) {
                marked += 1;
            }
        }
        marked += self.drain(graph, Mark::Reachable);

        log::trace!(
            "marked {} objects from {} roots and {} strong handles",
            marked,
            graph.root_set().len(),
            handle_roots.len()
        );
        self.marked += marked;
        marked
    }

    /// Retain `targets` and everything strongly reachable from them
    ///
    /// Objects already marked reachable are left alone. Returns the number
    /// of objects newly retained.
    pub fn retain(&mut self, graph: &mut ObjectGraph, targets: &[ObjectId]) -> usize {
        let mut retained = 0;
        for &target in targets {
            if self.shade(graph, target, Mark::SoftRetained) {
                retained += 1;
            }
        }
        retained += self.drain(graph, Mark::SoftRetained);

        self.retained += retained;
        retained
    }

    /// Objects marked reachable this cycle
    pub fn marked(&self) -> usize {
        self.marked
    }

    /// Objects retained through soft handles this cycle
    pub fn retained(&self) -> usize {
        self.retained
    }

    /// Objects whose edges were scanned this cycle
    pub fn scanned(&self) -> usize {
        self.stack.processed()
    }

    /// Grey a white object; returns false if it was already shaded or is dead
    fn shade(&mut self, graph: &mut ObjectGraph, id: ObjectId, mark: Mark) -> bool {
        match graph.get_mut(id) {
            Some(object) if object.mark == Mark::Unmarked => {
                object.mark = mark;
                self.stack.push(id);
                true
            },
            _ => false,
        }
    }

    fn drain(&mut self, graph: &mut ObjectGraph, mark: Mark) -> usize {
        let mut shaded = 0;
        while let Some(id) = self.stack.pop() {
            let Some(object) = graph.get_mut(id) else {
                continue;
            };
            // Edges are moved out while children are shaded and put back after.
            let edges = std::mem::take(&mut object.edges);
            for &child in &edges {
                if self.shade(graph, child, mark) {
                    shaded += 1;
                }
            }
            if let Some(object) = graph.get_mut(id) {
                object.edges = edges;
            }
        }
        shaded
    }
}

impl Default for Marker {
    fn default() -> Self {
        Self::new()
    }
}
