//! GC Cycle Statistics
//!
//! Everything one collection cycle did, recorded when the cycle ends. The
//! heap keeps the most recent record for `Heap::stats()`.

use crate::gc::GcReason;
use crate::heap::PressureLevel;
use std::time::Duration;

/// Statistics for a single collection cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleStats {
    /// Cycle ID (1-based; 0 means no cycle has run)
    pub cycle_id: u64,
    pub reason: GcReason,
    /// Pressure level read at the start of reference processing
    pub pressure: PressureLevel,

    /// Object statistics
    pub objects_marked: usize,
    pub objects_retained: usize,
    pub objects_scanned: usize,
    pub objects_swept: usize,

    /// Reference processing
    pub weak_refs_cleared: usize,
    pub soft_refs_cleared: usize,
    pub swept_refs_cleared: usize,

    /// Memory statistics
    pub used_before: usize,
    pub used_after: usize,
    pub bytes_reclaimed: usize,

    /// Phase timings
    pub mark_time: Duration,
    pub reference_time: Duration,
    pub sweep_time: Duration,
}

impl CycleStats {
    pub fn new(cycle_id: u64, reason: GcReason) -> Self {
        Self {
            cycle_id,
            reason,
            ..Default::default()
        }
    }

    /// Handles cleared by the collector this cycle, all tiers
    pub fn handles_cleared(&self) -> usize {
        self.weak_refs_cleared + self.soft_refs_cleared + self.swept_refs_cleared
    }

    pub fn total_time(&self) -> Duration {
        self.mark_time + self.reference_time + self.sweep_time
    }

    /// Objects still allocated after this cycle that it examined
    pub fn objects_surviving(&self) -> usize {
        self.objects_marked + self.objects_retained
    }
}
