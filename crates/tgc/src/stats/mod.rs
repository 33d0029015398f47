//! Stats Module - GC Performance Monitoring
//!
//! Collects per-cycle statistics and cumulative totals for:
//! - Tests asserting what a cycle did
//! - Embedders monitoring heap behavior
//!
//! Metrics:
//! - Objects marked, retained and swept
//! - Handles cleared per tier
//! - Bytes reclaimed and peak usage
//! - Pause times

pub mod gc_cycle;
pub mod timer;

pub use gc_cycle::CycleStats;
pub use timer::GcTimer;

use std::collections::VecDeque;
use std::time::Duration;

/// StatsCollector - bounded cycle history plus running totals
#[derive(Debug)]
pub struct StatsCollector {
    last: CycleStats,
    history: VecDeque<CycleStats>,
    max_history: usize,
    summary: GcSummary,
}

impl StatsCollector {
    pub fn new(max_history: usize) -> Self {
        Self {
            last: CycleStats::default(),
            history: VecDeque::with_capacity(max_history),
            max_history,
            summary: GcSummary::default(),
        }
    }

    /// Record a finished cycle
    pub fn record(&mut self, stats: CycleStats) {
        let pause = stats.total_time();
        let summary = &mut self.summary;
        summary.total_cycles += 1;
        summary.objects_marked += stats.objects_marked as u64;
        summary.objects_swept += stats.objects_swept as u64;
        summary.bytes_reclaimed += stats.bytes_reclaimed as u64;
        summary.weak_refs_cleared += stats.weak_refs_cleared as u64;
        summary.soft_refs_cleared += stats.soft_refs_cleared as u64;
        summary.swept_refs_cleared += stats.swept_refs_cleared as u64;
        summary.peak_used = summary.peak_used.max(stats.used_before);
        summary.total_pause += pause;
        summary.max_pause = summary.max_pause.max(pause);

        if self.history.len() >= self.max_history {
            self.history.pop_front();
        }
        self.history.push_back(stats.clone());
        self.last = stats;
    }

    /// Most recent cycle (all zeros before the first one)
    pub fn last(&self) -> &CycleStats {
        &self.last
    }

    /// Recent cycles, oldest first
    pub fn history(&self) -> impl Iterator<Item = &CycleStats> {
        self.history.iter()
    }

    pub fn summary(&self) -> &GcSummary {
        &self.summary
    }

    /// Track usage outside of cycles so the peak covers allocation spikes
    pub fn observe_usage(&mut self, used: usize) {
        self.summary.peak_used = self.summary.peak_used.max(used);
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new(32)
    }
}

/// Cumulative statistics across all cycles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GcSummary {
    pub total_cycles: u64,
    pub objects_marked: u64,
    pub objects_swept: u64,
    pub bytes_reclaimed: u64,
    pub weak_refs_cleared: u64,
    pub soft_refs_cleared: u64,
    pub swept_refs_cleared: u64,
    /// Highest arena usage observed
    pub peak_used: usize,
    pub total_pause: Duration,
    pub max_pause: Duration,
}

impl GcSummary {
    pub fn avg_pause(&self) -> Duration {
        if self.total_cycles == 0 {
            Duration::ZERO
        } else {
            self.total_pause / self.total_cycles as u32
        }
    }
}
