//! Root Set - Entry Points for Tracing
//!
//! Roots are strong edges held directly by the caller (a local variable
//! holding an object). All objects reachable from a root through strong
//! edges must be marked as live.
//!
//! The set has set semantics: registering a root twice is the same as
//! registering it once, and removing a non-root does nothing, the same as
//! assigning null to a variable that already held nothing.

use crate::heap::ObjectId;
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;

/// RootSet - caller-registered roots in registration order
#[derive(Debug, Default, Clone)]
pub struct RootSet {
    roots: IndexSet<ObjectId, FxBuildHasher>,
}

impl RootSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `id` was not a root before
    pub fn insert(&mut self, id: ObjectId) -> bool {
        self.roots.insert(id)
    }

    /// Returns true if `id` was a root
    pub fn remove(&mut self, id: ObjectId) -> bool {
        self.roots.shift_remove(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.roots.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.roots.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_idempotent() {
        let mut roots = RootSet::new();
        let id = ObjectId::new(0, 0);
        assert!(roots.insert(id));
        assert!(!roots.insert(id));
        assert_eq!(roots.len(), 1);
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut roots = RootSet::new();
        let ids: Vec<_> = (0..4).map(|i| ObjectId::new(i, 0)).collect();
        for &id in &ids {
            roots.insert(id);
        }

        assert!(roots.remove(ids[1]));
        assert!(!roots.remove(ids[1]));
        assert_eq!(
            roots.iter().collect::<Vec<_>>(),
            vec![ids[0], ids[2], ids[3]]
        );
    }

    #[test]
    fn test_generations_are_distinct_roots() {
        let mut roots = RootSet::new();
        roots.insert(ObjectId::new(0, 0));
        assert!(!roots.contains(ObjectId::new(0, 1)));
    }
}
