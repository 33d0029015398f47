//! Memory Pressure - Soft Reference Clearing Signal
//!
//! The collector reads one pressure level per cycle and clears unreached
//! soft references only when the level is at least `Low`.
//!
//! ```text
//! utilization:  0.0 ────────── low ────────── high ────────── 1.0
//! level:            None (0)        Low (1)         High (2)
//! ```

use super::arena::ArenaUsage;
use crate::config::HeapConfig;
use std::fmt;

/// Coarse memory scarcity signal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PressureLevel {
    #[default]
    None = 0,
    Low = 1,
    High = 2,
}

impl PressureLevel {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether unreached soft references are cleared at this level
    pub fn clears_soft_references(self) -> bool {
        self >= PressureLevel::Low
    }
}

impl fmt::Display for PressureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PressureLevel::None => write!(f, "none"),
            PressureLevel::Low => write!(f, "low"),
            PressureLevel::High => write!(f, "high"),
        }
    }
}

/// Source of the per-cycle pressure level
///
/// Implementations must be pure: the same usage yields the same level.
pub trait PressureSource: Send {
    fn level(&self, usage: ArenaUsage) -> PressureLevel;
}

/// Pressure derived from arena utilization against two watermarks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatermarkPressure {
    pub low_watermark: f64,
    pub high_watermark: f64,
}

impl WatermarkPressure {
    pub fn new(low_watermark: f64, high_watermark: f64) -> Self {
        Self {
            low_watermark,
            high_watermark,
        }
    }

    pub fn from_config(config: &HeapConfig) -> Self {
        Self::new(config.low_watermark, config.high_watermark)
    }
}

impl Default for WatermarkPressure {
    fn default() -> Self {
        Self::from_config(&HeapConfig::default())
    }
}

impl PressureSource for WatermarkPressure {
    fn level(&self, usage: ArenaUsage) -> PressureLevel {
        let utilization = usage.utilization();
        if utilization >= self.high_watermark {
            PressureLevel::High
        } else if utilization >= self.low_watermark {
            PressureLevel::Low
        } else {
            PressureLevel::None
        }
    }
}

/// Pressure pinned to a fixed level regardless of usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPressure(pub PressureLevel);

impl PressureSource for FixedPressure {
    fn level(&self, _usage: ArenaUsage) -> PressureLevel {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(used: usize, capacity: usize) -> ArenaUsage {
        ArenaUsage { used, capacity }
    }

    #[test]
    fn test_watermark_levels() {
        let pressure = WatermarkPressure::new(0.5, 0.85);
        assert_eq!(pressure.level(usage(0, 100)), PressureLevel::None);
        assert_eq!(pressure.level(usage(49, 100)), PressureLevel::None);
        assert_eq!(pressure.level(usage(50, 100)), PressureLevel::Low);
        assert_eq!(pressure.level(usage(84, 100)), PressureLevel::Low);
        assert_eq!(pressure.level(usage(85, 100)), PressureLevel::High);
        assert_eq!(pressure.level(usage(100, 100)), PressureLevel::High);
    }

    #[test]
    fn test_fixed_pressure_ignores_usage() {
        let pressure = FixedPressure(PressureLevel::Low);
        assert_eq!(pressure.level(usage(0, 100)), PressureLevel::Low);
        assert_eq!(pressure.level(usage(100, 100)), PressureLevel::Low);
    }

    #[test]
    fn test_soft_clearing_threshold() {
        assert!(!PressureLevel::None.clears_soft_references());
        assert!(PressureLevel::Low.clears_soft_references());
        assert!(PressureLevel::High.clears_soft_references());
        assert_eq!(PressureLevel::High.as_u8(), 2);
    }
}
