//! Mark Stack - Worklist for Tracing
//!
//! Grey objects (reached but not yet scanned) wait here. The stack is LIFO,
//! so tracing proceeds depth-first without recursion and deep chains cannot
//! overflow the native stack.

use crate::heap::ObjectId;

/// MarkStack - reusable depth-first worklist
///
/// The backing buffer is kept across cycles; only its contents are
/// cycle-scoped.
#[derive(Debug, Default)]
pub struct MarkStack {
    stack: Vec<ObjectId>,
    pushed: usize,
    processed: usize,
}

impl MarkStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: ObjectId) {
        self.stack.push(id);
        self.pushed += 1;
    }

    pub fn pop(&mut self) -> Option<ObjectId> {
        let id = self.stack.pop();
        if id.is_some() {
            self.processed += 1;
        }
        id
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Drop pending work and zero the counters for a new cycle
    pub fn reset(&mut self) {
        self.stack.clear();
        self.pushed = 0;
        self.processed = 0;
    }

    /// Objects pushed since the last reset
    pub fn pushed(&self) -> usize {
        self.pushed
    }

    /// Objects popped since the last reset
    pub fn processed(&self) -> usize {
        self.processed
    }
}
