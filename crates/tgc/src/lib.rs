//! # TGC - Tiered-Reference Mark-Sweep Collector
//!
//! TGC is a single-threaded, stop-the-world mark-sweep garbage collector
//! over an explicit object graph. Callers reach objects through handles of
//! three strengths, and the collector decides per cycle which handles to
//! clear.
//!
//! ## Overview
//!
//! - **Fixed-Capacity Arena**: every object is charged its size against one
//!   byte budget; allocation past it fails with `OutOfMemory`
//! - **Explicit Object Graph**: objects carry ordered strong edges, and the
//!   caller's root set is where tracing starts
//! - **Tiered References**: strong handles keep their target alive, soft
//!   handles keep it until memory gets tight, weak handles never keep it
//! - **Memory Pressure**: a pluggable source reports `None`, `Low` or
//!   `High` once per cycle; soft handles are cleared at `Low` and above
//! - **Generational Ids**: stale object and handle ids are detected, never
//!   resolved to a reused slot
//!
//! ## Quick Start
//!
//! ```rust
//! use tgc::{Heap, HeapConfig, ReferenceTier, MB};
//!
//! fn main() -> tgc::Result<()> {
//!     let mut heap = Heap::new(HeapConfig::with_capacity(16 * MB))?;
//!
//!     // Ten 1 MiB buffers held only through soft handles
//!     let soft: Vec<_> = (0..10)
//!         .map(|_| {
//!             let buffer = heap.allocate(MB, &[])?;
//!             heap.wrap(buffer, ReferenceTier::Soft)
//!         })
//!         .collect::<tgc::Result<_>>()?;
//!
//!     // 10 of 16 MiB used: above the low watermark, so soft handles go
//!     heap.collect();
//!     assert!(soft.iter().all(|handle| handle.get(&heap).is_none()));
//!     assert_eq!(heap.usage().used, 0);
//!
//!     for handle in soft {
//!         handle.release(&mut heap)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Collection Cycle
//!
//! ```text
//! ┌───────────────┐   ┌──────────────────────┐   ┌───────────────┐
//! │     Mark      │──▶│ Reference Processing │──▶│     Sweep     │
//! │ roots, strong │   │ weak: clear unmarked │   │ free unmarked │
//! │ handles, edges│   │ soft: clear or retain│   │ clear handles │
//! └───────────────┘   └──────────────────────┘   │ to swept objs │
//!                                                └───────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Heap configuration and validation
//! - [`error`]: Error types for all heap operations
//! - [`gc`]: The heap facade and the collection cycle
//! - [`heap`]: Arena accounting and memory pressure
//! - [`logging`]: Structured GC events
//! - [`marker`]: Root set and reachability tracing
//! - [`object`]: Object graph, handles and reference queues
//! - [`stats`]: Per-cycle and cumulative statistics
//!
//! ## Limitations
//!
//! - Objects carry no payload; only their size is accounted
//! - No finalization, compaction or concurrent collection
//! - A heap is `Send` but not shared: all operations take `&mut Heap`

// Core GC modules
pub mod config;
pub mod error;
pub mod gc;

// Memory and object model
pub mod heap;
pub mod object;

// GC algorithm components
pub mod marker;

// Monitoring
pub mod logging;
pub mod stats;

// Re-export main types for convenience
pub use config::{ConfigError, HeapConfig, KB, MB};
pub use error::{GcError, Result};
pub use gc::{GcReason, GcState, Heap};
pub use heap::{ArenaUsage, FixedPressure, ObjectId, PressureLevel, PressureSource, WatermarkPressure};
pub use logging::GcEvent;
pub use object::{HandleId, QueueId, ReferenceHandle, ReferenceQueue, ReferenceTier};
pub use stats::{CycleStats, GcSummary};

/// TGC version string from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Create a heap from `TGC_*` environment variables
///
/// # Examples
///
/// ```rust
/// let heap = tgc::init_from_env()?;
/// assert_eq!(heap.cycle_count(), 0);
/// # Ok::<(), tgc::GcError>(())
/// ```
pub fn init_from_env() -> Result<Heap> {
    Heap::new(HeapConfig::from_env())
}
