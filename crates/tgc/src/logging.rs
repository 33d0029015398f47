//! GC Logging and Tracing
//!
//! Structured logging for collection cycles, useful for:
//! - Debugging reference clearing decisions
//! - Performance analysis
//! - Tests asserting what the collector reported
//!
//! Every event is recorded in a bounded in-memory log. When emission is
//! enabled, events are also forwarded to the `log` facade at the level
//! of the event kind:
//! - WARN: Allocation failures
//! - INFO: Cycle start/end, heap statistics
//! - DEBUG: Phase completion, reference processing
//! - TRACE: Marking statistics

use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

/// Log target used for every emitted event
pub const LOG_TARGET: &str = "tgc";

/// GC event types
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GcEvent {
    /// GC cycle started
    CycleStart {
        cycle: u64,
        reason: String,
        used_bytes: usize,
    },

    /// GC phase completed
    PhaseEnd {
        cycle: u64,
        phase: String,
        duration_ms: f64,
    },

    /// GC cycle completed
    CycleEnd {
        cycle: u64,
        duration_ms: f64,
        objects_swept: usize,
        reclaimed_bytes: usize,
    },

    /// Heap statistics
    HeapStats {
        used_bytes: usize,
        capacity_bytes: usize,
        utilization: f64,
    },

    /// Allocation failure
    AllocationFailure {
        size: usize,
        heap_used: usize,
        capacity: usize,
    },

    /// Marking statistics
    MarkStats {
        cycle: u64,
        marked_count: usize,
        scanned_count: usize,
    },

    /// Reference processing statistics
    ReferenceStats {
        cycle: u64,
        pressure: u8,
        weak_cleared: usize,
        soft_cleared: usize,
        soft_retained: usize,
        swept_cleared: usize,
    },
}

impl GcEvent {
    /// Log level for this event
    pub fn level(&self) -> log::Level {
        match self {
            GcEvent::AllocationFailure { .. } => log::Level::Warn,
            GcEvent::CycleStart { .. } | GcEvent::CycleEnd { .. } | GcEvent::HeapStats { .. } => {
                log::Level::Info
            },
            GcEvent::PhaseEnd { .. } | GcEvent::ReferenceStats { .. } => log::Level::Debug,
            GcEvent::MarkStats { .. } => log::Level::Trace,
        }
    }

    /// Render as a single JSON object
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }
}

impl fmt::Display for GcEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GcEvent::CycleStart {
                cycle,
                reason,
                used_bytes,
            } => write!(
                f,
                "[GC] Cycle {} started (reason: {}, used: {} bytes)",
                cycle, reason, used_bytes
            ),
            GcEvent::PhaseEnd {
                cycle,
                phase,
                duration_ms,
            } => write!(
                f,
                "[GC] Cycle {}: {} phase completed ({:.3}ms)",
                cycle, phase, duration_ms
            ),
            GcEvent::CycleEnd {
                cycle,
                duration_ms,
                objects_swept,
                reclaimed_bytes,
            } => write!(
                f,
                "[GC] Cycle {} completed ({:.3}ms, swept {} objects, reclaimed {} bytes)",
                cycle, duration_ms, objects_swept, reclaimed_bytes
            ),
            GcEvent::HeapStats {
                used_bytes,
                capacity_bytes,
                utilization,
            } => write!(
                f,
                "[GC] Heap: {}/{} bytes ({:.1}% utilized)",
                used_bytes,
                capacity_bytes,
                utilization * 100.0
            ),
            GcEvent::AllocationFailure {
                size,
                heap_used,
                capacity,
            } => write!(
                f,
                "[GC] Allocation failure: {} bytes (heap used: {}/{})",
                size, heap_used, capacity
            ),
            GcEvent::MarkStats {
                cycle,
                marked_count,
                scanned_count,
            } => write!(
                f,
                "[GC] Cycle {}: marked {} objects, scanned {}",
                cycle, marked_count, scanned_count
            ),
            GcEvent::ReferenceStats {
                cycle,
                pressure,
                weak_cleared,
                soft_cleared,
                soft_retained,
                swept_cleared,
            } => write!(
                f,
                "[GC] Cycle {}: pressure {}, references cleared: {} weak, {} soft, {} swept ({} soft retained)",
                cycle, pressure, weak_cleared, soft_cleared, swept_cleared, soft_retained
            ),
        }
    }
}

/// GC Logger configuration
#[derive(Debug, Clone)]
pub struct GcLoggerConfig {
    /// Forward events to the `log` facade
    pub emit: bool,

    /// Emit JSON instead of human-readable lines
    pub json: bool,

    /// Prefix emitted lines with a local timestamp
    pub timestamps: bool,

    /// Maximum number of recorded events
    pub capacity: usize,
}

impl Default for GcLoggerConfig {
    fn default() -> Self {
        Self {
            emit: false,
            json: false,
            timestamps: true,
            capacity: 256,
        }
    }
}

/// GC Logger - records events and optionally forwards them to `log`
#[derive(Debug)]
pub struct GcLogger {
    config: GcLoggerConfig,
    events: VecDeque<(DateTime<Local>, GcEvent)>,
}

impl GcLogger {
    pub fn new(config: GcLoggerConfig) -> Self {
        Self {
            events: VecDeque::with_capacity(config.capacity.min(1024)),
            config,
        }
    }

    /// Log a GC event
    pub fn log(&mut self, event: GcEvent) {
        let timestamp = Local::now();
        if self.config.emit {
            self.emit(&timestamp, &event);
        }

        if self.config.capacity == 0 {
            return;
        }
        if self.events.len() >= self.config.capacity {
            self.events.pop_front();
        }
        self.events.push_back((timestamp, event));
    }

    fn emit(&self, timestamp: &DateTime<Local>, event: &GcEvent) {
        let level = event.level();
        if !log::log_enabled!(target: LOG_TARGET, level) {
            return;
        }

        let body = if self.config.json {
            event.to_json()
        } else {
            event.to_string()
        };

        if self.config.timestamps {
            log::log!(
                target: LOG_TARGET,
                level,
                "[{}] {}",
                timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
                body
            );
        } else {
            log::log!(target: LOG_TARGET, level, "{}", body);
        }
    }

    /// Recorded events, oldest first
    pub fn events(&self) -> impl Iterator<Item = &GcEvent> {
        self.events.iter().map(|(_, event)| event)
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

impl Default for GcLogger {
    fn default() -> Self {
        Self::new(GcLoggerConfig::default())
    }
}
