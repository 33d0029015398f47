//! Heap Module - Arena and Memory Pressure
//!
//! The arena is the fixed-capacity byte budget every object is charged
//! against; the pressure source turns its occupancy into the signal the
//! collector uses to decide whether soft references survive a cycle.

pub mod arena;
pub mod pressure;

pub use arena::{Arena, ArenaUsage, ObjectId};
pub use pressure::{FixedPressure, PressureLevel, PressureSource, WatermarkPressure};
