//! Tiered References - Strong, Soft and Weak Handles
//!
//! A handle is a caller-owned token for a slot in the heap's handle table.
//! The table is scanned once per cycle by the [`ReferenceProcessor`]:
//!
//! - Strong: the target is a root for marking while the handle holds it
//! - Soft: cleared when its target was not marked and memory pressure is at
//!   least low; otherwise the target is retained for another cycle
//! - Weak: cleared whenever its target was not marked
//!
//! A handle whose target was swept always reads empty. Handles cleared by
//! the collector are delivered to their [`ReferenceQueue`], if they have one.

use crate::error::{GcError, Result};
use crate::gc::Heap;
use crate::heap::{ObjectId, PressureLevel};
use std::collections::VecDeque;
use std::fmt;

/// Reference strength
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceTier {
    Strong,
    Soft,
    Weak,
}

impl fmt::Display for ReferenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceTier::Strong => write!(f, "strong"),
            ReferenceTier::Soft => write!(f, "soft"),
            ReferenceTier::Weak => write!(f, "weak"),
        }
    }
}

/// Identity of a handle table slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId {
    index: u32,
    generation: u32,
}

impl HandleId {
    fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle#{}@{}", self.index, self.generation)
    }
}

/// Identity of a reference queue owned by a heap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueueId(u32);

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue#{}", self.0)
    }
}

/// ReferenceHandle - caller-owned tiered reference
///
/// Not `Clone`: one token owns one table slot. Reads and writes go through
/// the heap that issued the handle.
#[derive(Debug)]
#[must_use = "a handle keeps its table slot (and a strong handle its root) until released"]
pub struct ReferenceHandle {
    id: HandleId,
    tier: ReferenceTier,
}

impl ReferenceHandle {
    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn tier(&self) -> ReferenceTier {
        self.tier
    }

    /// Current target, or `None` once cleared or swept
    pub fn get(&self, heap: &Heap) -> Option<ObjectId> {
        heap.handle_target(self)
    }

    /// Drop the target; a strong handle also gives up its root
    pub fn clear(&self, heap: &mut Heap) -> Result<()> {
        heap.clear_handle(self)
    }

    /// Destroy the handle and free its slot
    ///
    /// Fails with `InvalidHandle` if `heap` holds no slot for this handle,
    /// e.g. when it was issued by another heap.
    pub fn release(self, heap: &mut Heap) -> Result<()> {
        heap.release_handle(self)
    }
}

/// ReferenceQueue - notification queue for cleared handles
///
/// When the collector clears a handle registered with a queue, the handle's
/// id is enqueued exactly once. Manual clears are not reported.
#[derive(Debug, Default)]
pub struct ReferenceQueue {
    pending: VecDeque<HandleId>,
    enqueued: usize,
}

impl ReferenceQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, handle: HandleId) {
        self.pending.push_back(handle);
        self.enqueued += 1;
    }

    /// Oldest pending notification
    pub fn poll(&mut self) -> Option<HandleId> {
        self.pending.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Notifications ever delivered to this queue
    pub fn total_enqueued(&self) -> usize {
        self.enqueued
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[derive(Debug, Clone)]
pub(crate) struct HandleEntry {
    pub(crate) tier: ReferenceTier,
    pub(crate) target: Option<ObjectId>,
    queue: Option<QueueId>,
}

#[derive(Debug)]
struct HandleSlot {
    generation: u32,
    entry: Option<HandleEntry>,
}

/// HandleTable - registry of every live handle and reference queue
#[derive(Debug, Default)]
pub struct HandleTable {
    slots: Vec<HandleSlot>,
    free: Vec<u32>,
    queues: Vec<ReferenceQueue>,
    live: usize,
}

impl HandleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(
        &mut self,
        tier: ReferenceTier,
        target: ObjectId,
        queue: Option<QueueId>,
    ) -> Result<ReferenceHandle> {
        if let Some(queue) = queue {
            self.queue(queue)?;
        }

        let entry = HandleEntry {
            tier,
            target: Some(target),
            queue,
        };
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = Some(entry);
                HandleId::new(index, slot.generation)
            },
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(HandleSlot {
                    generation: 0,
                    entry: Some(entry),
                });
                HandleId::new(index, 0)
            },
        };
        self.live += 1;
        Ok(ReferenceHandle { id, tier })
    }

    pub(crate) fn entry(&self, id: HandleId) -> Option<&HandleEntry> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    pub fn target(&self, id: HandleId) -> Option<ObjectId> {
        self.entry(id).and_then(|entry| entry.target)
    }

    /// Empty the handle without notifying its queue; returns the old target
    pub(crate) fn take_target(&mut self, id: HandleId) -> Result<Option<ObjectId>> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
            .map(|entry| entry.target.take())
            .ok_or(GcError::InvalidHandle { handle: id })
    }

    pub(crate) fn remove(&mut self, id: HandleId) -> Option<HandleEntry> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?;
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Some(entry)
    }

    /// Clear every non-empty handle the predicate selects
    ///
    /// Cleared handles with a queue are enqueued. Returns the number cleared.
    pub(crate) fn clear_matching<F>(&mut self, mut should_clear: F) -> usize
    where
        F: FnMut(ReferenceTier, ObjectId) -> bool,
    {
        let mut cleared = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(entry) = slot.entry.as_mut() else {
                continue;
            };
            let Some(target) = entry.target else {
                continue;
            };
            if !should_clear(entry.tier, target) {
                continue;
            }

            entry.target = None;
            if let Some(queue) = entry.queue {
                let handle = HandleId::new(index as u32, slot.generation);
                if let Some(queue) = self.queues.get_mut(queue.0 as usize) {
                    queue.enqueue(handle);
                }
            }
            cleared += 1;
        }
        cleared
    }

    pub fn new_queue(&mut self) -> QueueId {
        self.queues.push(ReferenceQueue::new());
        QueueId(self.queues.len() as u32 - 1)
    }

    pub fn queue(&self, id: QueueId) -> Result<&ReferenceQueue> {
        self.queues
            .get(id.0 as usize)
            .ok_or(GcError::InvalidQueue { queue: id })
    }

    pub fn queue_mut(&mut self, id: QueueId) -> Result<&mut ReferenceQueue> {
        self.queues
            .get_mut(id.0 as usize)
            .ok_or(GcError::InvalidQueue { queue: id })
    }

    /// Number of live (unreleased) handles
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Targets of live strong handles; these are roots for marking
    pub(crate) fn strong_targets(&self) -> Vec<ObjectId> {
        self.slots
            .iter()
            .filter_map(|slot| slot.entry.as_ref())
            .filter(|entry| entry.tier == ReferenceTier::Strong)
            .filter_map(|entry| entry.target)
            .collect()
    }

    /// Live handles of `tier` that still hold a target
    pub fn count_holding(&self, tier: ReferenceTier) -> usize {
        self.slots
            .iter()
            .filter_map(|slot| slot.entry.as_ref())
            .filter(|entry| entry.tier == tier && entry.target.is_some())
            .count()
    }
}

/// Reference processing counters for one cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReferenceStats {
    pub weak_cleared: usize,
    pub soft_cleared: usize,
    pub soft_retained: usize,
    pub swept_cleared: usize,
}

impl ReferenceStats {
    pub fn total_cleared(&self) -> usize {
        self.weak_cleared + self.soft_cleared + self.swept_cleared
    }
}

/// ReferenceProcessor - tiered clearing after marking
///
/// Runs between the mark and sweep phases:
///
/// - Weak references: cleared when the target is unmarked
/// - Soft references: cleared when the target is unmarked and pressure
///   allows; otherwise the target is reported for retention
/// - After sweep: any handle still naming a swept object is cleared
#[derive(Debug, Default)]
pub struct ReferenceProcessor {
    stats: ReferenceStats,
}

impl ReferenceProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_cycle(&mut self) {
        self.stats = ReferenceStats::default();
    }

    /// Clear weak references whose targets are not marked
    pub fn process_weak_references(
        &mut self,
        table: &mut HandleTable,
        marked: &impl Fn(ObjectId) -> bool,
    ) -> usize {
        let cleared = table.clear_matching(|tier, target| {
            tier == ReferenceTier::Weak && !marked(target)
        });
        self.stats.weak_cleared += cleared;
        cleared
    }

    /// Clear or retain soft references whose targets are not marked
    ///
    /// Returns the targets that must be retained this cycle (empty whenever
    /// `level` clears soft references).
    pub fn process_soft_references(
        &mut self,
        table: &mut HandleTable,
        marked: &impl Fn(ObjectId) -> bool,
        level: PressureLevel,
    ) -> Vec<ObjectId> {
        let clear = level.clears_soft_references();
        let mut retained = Vec::new();
        let cleared = table.clear_matching(|tier, target| {
            if tier != ReferenceTier::Soft || marked(target) {
                return false;
            }
            if !clear {
                retained.push(target);
            }
            clear
        });
        self.stats.soft_cleared += cleared;
        self.stats.soft_retained += retained.len();
        retained
    }

    /// Clear handles of any tier whose target did not survive the sweep
    pub fn process_swept_references(
        &mut self,
        table: &mut HandleTable,
        live: &impl Fn(ObjectId) -> bool,
    ) -> usize {
        let cleared = table.clear_matching(|_, target| !live(target));
        self.stats.swept_cleared += cleared;
        cleared
    }

    pub fn stats(&self) -> ReferenceStats {
        self.stats
    }
}
