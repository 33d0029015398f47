//! Object Module - Object Graph and Tiered References
//!
//! The object graph owns every allocated object together with its ordered
//! strong edges and the caller's root set. Strong edges and roots are the
//! only edges the marker follows; soft and weak handles live in the
//! [`reference`] registry and never keep anything reachable.

pub mod reference;

pub use reference::{
    HandleId, HandleTable, QueueId, ReferenceHandle, ReferenceProcessor, ReferenceQueue,
    ReferenceStats, ReferenceTier,
};

use crate::error::{GcError, Result};
use crate::heap::{Arena, ArenaUsage, ObjectId};
use crate::marker::RootSet;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

/// Per-cycle mark state of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    /// Not reached (yet) this cycle
    Unmarked,
    /// Reached from a root through strong edges
    Reachable,
    /// Kept alive only through a surviving soft handle
    SoftRetained,
}

/// A heap object: a byte reservation with ordered outgoing strong edges
#[derive(Debug, Clone)]
pub struct Object {
    id: ObjectId,
    size: usize,
    pub(crate) edges: Vec<ObjectId>,
    pub(crate) mark: Mark,
}

impl Object {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn edges(&self) -> &[ObjectId] {
        &self.edges
    }

    pub fn mark(&self) -> Mark {
        self.mark
    }

    pub fn is_marked(&self) -> bool {
        self.mark == Mark::Reachable
    }
}

/// ObjectGraph - allocated objects, their strong edges and the root set
pub struct ObjectGraph {
    arena: Arena,
    objects: IndexMap<ObjectId, Object, FxBuildHasher>,
    roots: RootSet,
}

impl ObjectGraph {
    pub fn new(capacity: usize) -> Self {
        Self {
            arena: Arena::new(capacity),
            objects: IndexMap::default(),
            roots: RootSet::new(),
        }
    }

    /// Allocate an object of `size` bytes with the given strong edges
    ///
    /// Every edge must denote a live object; otherwise `InvalidReference`
    /// is returned and no bytes are reserved.
    pub fn allocate(&mut self, size: usize, edges: &[ObjectId]) -> Result<ObjectId> {
        self.check_all_live(edges)?;
        let id = self.arena.allocate(size)?;
        self.objects.insert(
            id,
            Object {
                id,
                size,
                edges: edges.to_vec(),
                mark: Mark::Unmarked,
            },
        );
        Ok(id)
    }

    /// Replace the outgoing strong edges of `id` (field reassignment)
    pub fn set_edges(&mut self, id: ObjectId, edges: &[ObjectId]) -> Result<()> {
        self.check_all_live(edges)?;
        let object = self
            .objects
            .get_mut(&id)
            .ok_or(GcError::InvalidReference { id })?;
        object.edges.clear();
        object.edges.extend_from_slice(edges);
        Ok(())
    }

    pub fn edges(&self, id: ObjectId) -> Result<&[ObjectId]> {
        self.get(id)
            .map(Object::edges)
            .ok_or(GcError::InvalidReference { id })
    }

    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Object> {
        self.objects.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Object> {
        self.objects.values_mut()
    }

    /// Root set in registration order
    pub fn roots(&self) -> Vec<ObjectId> {
        self.roots.iter().collect()
    }

    pub(crate) fn root_set(&self) -> &RootSet {
        &self.roots
    }

    /// Register `id` as a root; no-op if it already is one
    pub fn add_root(&mut self, id: ObjectId) -> Result<()> {
        if !self.contains(id) {
            return Err(GcError::InvalidReference { id });
        }
        self.roots.insert(id);
        Ok(())
    }

    /// Unregister `id`; no-op if it is not a root
    pub fn remove_root(&mut self, id: ObjectId) {
        self.roots.remove(id);
    }

    pub fn is_root(&self, id: ObjectId) -> bool {
        self.roots.contains(id)
    }

    pub fn usage(&self) -> ArenaUsage {
        self.arena.usage()
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Remove `id` from storage and give its bytes back to the arena
    ///
    /// Returns the number of bytes released (0 if `id` was not live).
    pub(crate) fn reclaim(&mut self, id: ObjectId) -> usize {
        if self.objects.swap_remove(&id).is_none() {
            return 0;
        }
        self.roots.remove(id);
        self.arena.free(id)
    }

    fn check_all_live(&self, ids: &[ObjectId]) -> Result<()> {
        match ids.iter().find(|id| !self.contains(**id)) {
            Some(&id) => Err(GcError::InvalidReference { id }),
            None => Ok(()),
        }
    }
}
