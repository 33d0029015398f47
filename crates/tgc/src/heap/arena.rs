//! Arena - Fixed-Capacity Byte Accounting
//!
//! The arena is the leaf of the heap: it owns the capacity budget and hands
//! out object identities. Identities are generational slot indices, so a
//! freed slot can be reused without a stale id ever denoting the new object.
//!
//! ```text
//! slots:  ┌──────────┬──────────┬──────────┬──────────┐
//!         │ gen 0    │ gen 2    │ gen 1    │ gen 0    │
//!         │ 64 bytes │  (free)  │ 16 bytes │  (free)  │
//!         └──────────┴──────────┴──────────┴──────────┘
//! free:   [3, 1]   (popped from the back on allocation)
//! ```

use crate::error::{GcError, Result};
use std::fmt;

/// Opaque identity of an allocated object
///
/// Ids are only issued by [`Arena::allocate`]. Within one arena, two ids
/// compare equal only if they denote the same allocation.
///
/// Ids carry no arena tag: an id issued by another heap is indistinguishable
/// from a local id with the same slot and generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

impl ObjectId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index (reused after the object is swept)
    pub fn index(self) -> usize {
        self.index as usize
    }

    /// Slot generation at the time this id was issued
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}@{}", self.index, self.generation)
    }
}

/// Snapshot of arena occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaUsage {
    pub used: usize,
    pub capacity: usize,
}

impl ArenaUsage {
    /// Bytes still available for allocation
    pub fn available(&self) -> usize {
        self.capacity - self.used
    }

    /// Fraction of capacity in use (0.0 - 1.0)
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            1.0
        } else {
            self.used as f64 / self.capacity as f64
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    /// Reserved bytes while live
    size: Option<usize>,
}

/// Arena - fixed-capacity allocation region
///
/// Invariant: `used <= capacity` at all times.
pub struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    used: usize,
    capacity: usize,
    live: usize,
}

impl Arena {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            used: 0,
            capacity,
            live: 0,
        }
    }

    /// Reserve `size` bytes and issue a fresh identity
    ///
    /// Fails with `OutOfMemory` when `used + size > capacity`; nothing is
    /// reserved in that case.
    pub fn allocate(&mut self, size: usize) -> Result<ObjectId> {
        let new_used = self
            .used
            .checked_add(size)
            .filter(|&total| total <= self.capacity)
            .ok_or(GcError::OutOfMemory {
                requested: size,
                available: self.capacity - self.used,
            })?;

        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.size = Some(size);
                ObjectId::new(index, slot.generation)
            },
            None => {
                let index = u32::try_from(self.slots.len()).map_err(|_| GcError::OutOfMemory {
                    requested: size,
                    available: self.capacity - self.used,
                })?;
                self.slots.push(Slot {
                    generation: 0,
                    size: Some(size),
                });
                ObjectId::new(index, 0)
            },
        };

        self.used = new_used;
        self.live += 1;
        Ok(id)
    }

    /// Release the bytes reserved for `id`
    ///
    /// Idempotent: freeing a stale or unknown id is a no-op returning 0.
    pub fn free(&mut self, id: ObjectId) -> usize {
        let Some(slot) = self.slots.get_mut(id.index()) else {
            return 0;
        };
        if slot.generation != id.generation {
            return 0;
        }
        let Some(size) = slot.size.take() else {
            return 0;
        };

        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.used -= size;
        self.live -= 1;
        size
    }

    pub fn usage(&self) -> ArenaUsage {
        ArenaUsage {
            used: self.used,
            capacity: self.capacity,
        }
    }

    /// Check whether `id` currently denotes a live allocation
    pub fn is_live(&self, id: ObjectId) -> bool {
        self.size_of(id).is_some()
    }

    /// Reserved size of a live allocation
    pub fn size_of(&self, id: ObjectId) -> Option<usize> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.size)
    }

    /// Number of live allocations
    pub fn live_count(&self) -> usize {
        self.live
    }
}
