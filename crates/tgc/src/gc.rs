//! GC Core Module - Heap Facade and Collection Cycle
//!
//! Implements the collection algorithm: stop-the-world mark-sweep with
//! tiered reference clearing.
//!
//! ```text
//! collect()
//!   │
//!   ├─ Marking              trace strong edges from the root set and
//!   │                       from the targets of live strong handles
//!   │
//!   ├─ ReferenceProcessing  read pressure once (at least low when the
//!   │                       cycle runs for an allocation failure)
//!   │                       clear weak handles to unmarked targets
//!   │                       clear soft handles to unmarked targets (pressure >= low)
//!   │                       or retain their targets (pressure none)
//!   │
//!   └─ Sweeping             free everything neither marked nor retained,
//!                           clear any handle still naming a swept object
//! ```
//!
//! Mark state is cycle-scoped: every surviving object is unmarked again
//! before `collect` returns.

use crate::config::HeapConfig;
use crate::error::{GcError, Result};
use crate::heap::{ArenaUsage, ObjectId, PressureLevel, PressureSource, WatermarkPressure};
use crate::logging::{GcEvent, GcLogger, GcLoggerConfig};
use crate::marker::Marker;
use crate::object::{
    HandleId, HandleTable, Mark, Object, ObjectGraph, QueueId, ReferenceHandle,
    ReferenceProcessor, ReferenceQueue, ReferenceTier,
};
use crate::stats::{CycleStats, GcSummary, GcTimer, StatsCollector};
use std::fmt;
use std::time::Duration;

/// GC cycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcState {
    /// Idle - no GC in progress
    Idle,
    /// Marking phase - tracing from roots
    Marking,
    /// Reference processing - tiered clearing of soft and weak handles
    ReferenceProcessing,
    /// Sweeping phase - freeing unreached objects
    Sweeping,
}

impl fmt::Display for GcState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GcState::Idle => write!(f, "idle"),
            GcState::Marking => write!(f, "mark"),
            GcState::ReferenceProcessing => write!(f, "reference processing"),
            GcState::Sweeping => write!(f, "sweep"),
        }
    }
}

/// Reason for GC trigger
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GcReason {
    /// Explicit GC request (user call)
    #[default]
    Explicit,
    /// An allocation ran out of memory and will be retried
    AllocationFailure { requested: usize },
}

impl fmt::Display for GcReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GcReason::Explicit => write!(f, "explicit"),
            GcReason::AllocationFailure { requested } => {
                write!(f, "allocation failure ({} bytes)", requested)
            },
        }
    }
}

/// Heap - object graph, handle registry and collector in one place
///
/// All mutation goes through `&mut Heap`, so a collection can never
/// interleave with an allocation or a handle operation.
///
/// # Examples
///
/// ```rust
/// use tgc::{Heap, ReferenceTier};
///
/// fn main() -> tgc::Result<()> {
///     let mut heap = Heap::with_capacity(1024)?;
///
///     let kept = heap.allocate(64, &[])?;
///     let strong = heap.wrap(kept, ReferenceTier::Strong)?;
///
///     let dropped = heap.allocate(64, &[])?;
///     let weak = heap.wrap(dropped, ReferenceTier::Weak)?;
///
///     heap.collect();
///
///     assert_eq!(strong.get(&heap), Some(kept));
///     assert_eq!(weak.get(&heap), None);
///     assert_eq!(heap.stats().objects_swept, 1);
///
///     strong.release(&mut heap)?;
///     weak.release(&mut heap)?;
///     Ok(())
/// }
/// ```
pub struct Heap {
    graph: ObjectGraph,
    handles: HandleTable,
    marker: Marker,
    references: ReferenceProcessor,
    pressure: Box<dyn PressureSource>,
    config: HeapConfig,
    stats: StatsCollector,
    logger: GcLogger,
    state: GcState,
    cycle_count: u64,
}

impl Heap {
    /// Create a heap with the specified configuration
    ///
    /// # Errors
    /// Returns `Configuration` if the configuration does not validate.
    pub fn new(config: HeapConfig) -> Result<Self> {
        config.validate()?;

        let logger = GcLogger::new(GcLoggerConfig {
            emit: config.verbose,
            capacity: config.event_history,
            ..Default::default()
        });

        Ok(Self {
            graph: ObjectGraph::new(config.capacity),
            handles: HandleTable::new(),
            marker: Marker::new(),
            references: ReferenceProcessor::new(),
            pressure: Box::new(WatermarkPressure::from_config(&config)),
            stats: StatsCollector::new(config.stats_history),
            logger,
            config,
            state: GcState::Idle,
            cycle_count: 0,
        })
    }

    /// Create a heap with `capacity` bytes and default watermarks
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::new(HeapConfig::with_capacity(capacity))
    }

    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Object graph
    // ------------------------------------------------------------------

    /// Allocate an object of `size` bytes with the given strong edges
    ///
    /// # Errors
    /// - `OutOfMemory` when the arena cannot fit `size` more bytes
    /// - `InvalidReference` when an edge is not a live object
    pub fn allocate(&mut self, size: usize, edges: &[ObjectId]) -> Result<ObjectId> {
        let result = self.graph.allocate(size, edges);
        match &result {
            Ok(id) => {
                log::trace!("allocated {} ({} bytes)", id, size);
                self.stats.observe_usage(self.graph.usage().used);
            },
            Err(GcError::OutOfMemory { .. }) => {
                let usage = self.graph.usage();
                log::debug!(
                    "allocation of {} bytes failed ({}/{} used)",
                    size,
                    usage.used,
                    usage.capacity
                );
                self.logger.log(GcEvent::AllocationFailure {
                    size,
                    heap_used: usage.used,
                    capacity: usage.capacity,
                });
            },
            Err(_) => {},
        }
        result
    }

    /// Allocate, and on `OutOfMemory` collect once and retry
    ///
    /// The collection runs at pressure `Low` or above, so every soft
    /// reference to unreached memory is cleared before giving up. A second
    /// `OutOfMemory` is returned to the caller.
    pub fn allocate_or_collect(&mut self, size: usize, edges: &[ObjectId]) -> Result<ObjectId> {
        match self.allocate(size, edges) {
            Err(GcError::OutOfMemory { .. }) => {
                self.collect_with_reason(GcReason::AllocationFailure { requested: size });
                self.allocate(size, edges)
            },
            other => other,
        }
    }

    /// Replace the outgoing strong edges of `id`
    pub fn set_edges(&mut self, id: ObjectId, edges: &[ObjectId]) -> Result<()> {
        self.graph.set_edges(id, edges)
    }

    pub fn edges(&self, id: ObjectId) -> Result<&[ObjectId]> {
        self.graph.edges(id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.graph.contains(id)
    }

    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.graph.get(id)
    }

    pub fn object_count(&self) -> usize {
        self.graph.len()
    }

    pub fn graph(&self) -> &ObjectGraph {
        &self.graph
    }

    pub fn add_root(&mut self, id: ObjectId) -> Result<()> {
        self.graph.add_root(id)
    }

    pub fn remove_root(&mut self, id: ObjectId) {
        self.graph.remove_root(id)
    }

    pub fn roots(&self) -> Vec<ObjectId> {
        self.graph.roots()
    }

    pub fn usage(&self) -> ArenaUsage {
        self.graph.usage()
    }

    // ------------------------------------------------------------------
    // Handles
    // ------------------------------------------------------------------

    /// Create a handle of `tier` targeting `id`
    ///
    /// A strong handle also registers `id` as a root, and keeps `id`
    /// reachable for as long as it holds it, even if that root is removed.
    pub fn wrap(&mut self, id: ObjectId, tier: ReferenceTier) -> Result<ReferenceHandle> {
        self.wrap_inner(id, tier, None)
    }

    /// Like [`Heap::wrap`], reporting collector clears to `queue`
    pub fn wrap_with_queue(
        &mut self,
        id: ObjectId,
        tier: ReferenceTier,
        queue: QueueId,
    ) -> Result<ReferenceHandle> {
        self.wrap_inner(id, tier, Some(queue))
    }

    fn wrap_inner(
        &mut self,
        id: ObjectId,
        tier: ReferenceTier,
        queue: Option<QueueId>,
    ) -> Result<ReferenceHandle> {
        if !self.graph.contains(id) {
            return Err(GcError::InvalidReference { id });
        }
        let handle = self.handles.insert(tier, id, queue)?;
        if tier == ReferenceTier::Strong {
            self.graph.add_root(id)?;
        }
        Ok(handle)
    }

    pub(crate) fn handle_target(&self, handle: &ReferenceHandle) -> Option<ObjectId> {
        self.handles
            .target(handle.id())
            .filter(|id| self.graph.contains(*id))
    }

    pub(crate) fn clear_handle(&mut self, handle: &ReferenceHandle) -> Result<()> {
        let previous = self.handles.take_target(handle.id())?;
        if let (ReferenceTier::Strong, Some(target)) = (handle.tier(), previous) {
            self.graph.remove_root(target);
        }
        Ok(())
    }

    pub(crate) fn release_handle(&mut self, handle: ReferenceHandle) -> Result<()> {
        let entry = self
            .handles
            .remove(handle.id())
            .ok_or(GcError::InvalidHandle { handle: handle.id() })?;
        if let (ReferenceTier::Strong, Some(target)) = (entry.tier, entry.target) {
            self.graph.remove_root(target);
        }
        Ok(())
    }

    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    /// Create a queue that receives handles cleared by the collector
    pub fn new_reference_queue(&mut self) -> QueueId {
        self.handles.new_queue()
    }

    pub fn reference_queue(&self, queue: QueueId) -> Result<&ReferenceQueue> {
        self.handles.queue(queue)
    }

    /// Take the oldest cleared handle reported to `queue`
    pub fn poll_reference_queue(&mut self, queue: QueueId) -> Result<Option<HandleId>> {
        Ok(self.handles.queue_mut(queue)?.poll())
    }

    // ------------------------------------------------------------------
    // Pressure
    // ------------------------------------------------------------------

    /// Pressure level the next cycle would see right now
    pub fn pressure(&self) -> PressureLevel {
        self.pressure.level(self.graph.usage())
    }

    /// Replace the pressure source (e.g. `FixedPressure` to force a level)
    pub fn set_pressure_source(&mut self, source: impl PressureSource + 'static) {
        self.pressure = Box::new(source);
    }

    /// Go back to watermark pressure from the heap configuration
    pub fn reset_pressure_source(&mut self) {
        self.pressure = Box::new(WatermarkPressure::from_config(&self.config));
    }

    // ------------------------------------------------------------------
    // Collection
    // ------------------------------------------------------------------

    /// Run one explicit collection cycle
    ///
    /// Never fails; returns the statistics of the cycle just run.
    pub fn collect(&mut self) -> &CycleStats {
        self.collect_with_reason(GcReason::Explicit)
    }

    /// Run one collection cycle, recording why it ran
    pub fn collect_with_reason(&mut self, reason: GcReason) -> &CycleStats {
        let cycle_timer = GcTimer::new();
        let mut timer = GcTimer::new();

        self.cycle_count += 1;
        let cycle = self.cycle_count;
        let mut stats = CycleStats::new(cycle, reason);
        stats.used_before = self.graph.usage().used;

        self.logger.log(GcEvent::CycleStart {
            cycle,
            reason: stats.reason.to_string(),
            used_bytes: stats.used_before,
        });
        self.marker.start_cycle();
        self.references.start_cycle();

        // Phase 1: Marking
        self.state = GcState::Marking;
        let handle_roots = self.handles.strong_targets();
        stats.objects_marked = self.marker.mark_from_roots(&mut self.graph, &handle_roots);
        stats.mark_time = timer.lap();
        self.log_phase_end(cycle, stats.mark_time);

        // Phase 2: Reference processing
        self.state = GcState::ReferenceProcessing;
        let mut pressure = self.pressure.level(self.graph.usage());
        if matches!(stats.reason, GcReason::AllocationFailure { .. }) {
            pressure = pressure.max(PressureLevel::Low);
        }
        stats.pressure = pressure;
        let retained = {
            let graph = &self.graph;
            let marked = |id: ObjectId| graph.get(id).map_or(false, Object::is_marked);
            self.references
                .process_weak_references(&mut self.handles, &marked);
            self.references
                .process_soft_references(&mut self.handles, &marked, pressure)
        };
        stats.objects_retained = self.marker.retain(&mut self.graph, &retained);
        stats.reference_time = timer.lap();
        self.log_phase_end(cycle, stats.reference_time);

        // Phase 3: Sweeping
        self.state = GcState::Sweeping;
        let (swept, reclaimed) = self.sweep();
        stats.objects_swept = swept;
        stats.bytes_reclaimed = reclaimed;
        {
            let graph = &self.graph;
            self.references
                .process_swept_references(&mut self.handles, &|id: ObjectId| graph.contains(id));
        }
        stats.sweep_time = timer.lap();
        self.log_phase_end(cycle, stats.sweep_time);

        self.state = GcState::Idle;
        let references = self.references.stats();
        stats.weak_refs_cleared = references.weak_cleared;
        stats.soft_refs_cleared = references.soft_cleared;
        stats.swept_refs_cleared = references.swept_cleared;
        stats.objects_scanned = self.marker.scanned();
        stats.used_after = self.graph.usage().used;

        self.log_cycle_end(&stats, references.soft_retained, cycle_timer.elapsed_ms());
        self.stats.record(stats);
        self.stats.last()
    }

    /// Free every unmarked object and reset marks on survivors
    ///
    /// Returns (objects swept, bytes reclaimed).
    fn sweep(&mut self) -> (usize, usize) {
        let garbage: Vec<ObjectId> = self
            .graph
            .iter()
            .filter(|object| object.mark() == Mark::Unmarked)
            .map(Object::id)
            .collect();

        let mut reclaimed = 0;
        for &id in &garbage {
            reclaimed += self.graph.reclaim(id);
            log::trace!("swept {}", id);
        }

        for object in self.graph.iter_mut() {
            object.mark = Mark::Unmarked;
        }

        (garbage.len(), reclaimed)
    }

    fn log_phase_end(&mut self, cycle: u64, duration: Duration) {
        self.logger.log(GcEvent::PhaseEnd {
            cycle,
            phase: self.state.to_string(),
            duration_ms: duration.as_secs_f64() * 1000.0,
        });
    }

    fn log_cycle_end(&mut self, stats: &CycleStats, soft_retained: usize, duration_ms: f64) {
        log::debug!(
            "cycle {} ({}): marked {}, retained {}, swept {} ({} bytes), pressure {}",
            stats.cycle_id,
            stats.reason,
            stats.objects_marked,
            stats.objects_retained,
            stats.objects_swept,
            stats.bytes_reclaimed,
            stats.pressure
        );

        self.logger.log(GcEvent::MarkStats {
            cycle: stats.cycle_id,
            marked_count: stats.objects_marked,
            scanned_count: stats.objects_scanned,
        });
        self.logger.log(GcEvent::ReferenceStats {
            cycle: stats.cycle_id,
            pressure: stats.pressure.as_u8(),
            weak_cleared: stats.weak_refs_cleared,
            soft_cleared: stats.soft_refs_cleared,
            soft_retained,
            swept_cleared: stats.swept_refs_cleared,
        });
        self.logger.log(GcEvent::CycleEnd {
            cycle: stats.cycle_id,
            duration_ms,
            objects_swept: stats.objects_swept,
            reclaimed_bytes: stats.bytes_reclaimed,
        });
        let usage = self.graph.usage();
        self.logger.log(GcEvent::HeapStats {
            used_bytes: usage.used,
            capacity_bytes: usage.capacity,
            utilization: usage.utilization(),
        });
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Statistics of the most recent cycle
    pub fn stats(&self) -> &CycleStats {
        self.stats.last()
    }

    pub fn summary(&self) -> &GcSummary {
        self.stats.summary()
    }

    pub fn history(&self) -> impl Iterator<Item = &CycleStats> {
        self.stats.history()
    }

    pub fn state(&self) -> GcState {
        self.state
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Recorded GC events, oldest first
    pub fn events(&self) -> impl Iterator<Item = &GcEvent> {
        self.logger.events()
    }
}

impl fmt::Debug for Heap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Heap")
            .field("usage", &self.graph.usage())
            .field("objects", &self.graph.len())
            .field("roots", &self.graph.root_set().len())
            .field("handles", &self.handles.len())
            .field("state", &self.state)
            .field("cycle_count", &self.cycle_count)
            .finish_non_exhaustive()
    }
}
