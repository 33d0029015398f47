//! Configuration Module - Heap Tuning Parameters
//!
//! Manages the parameters a heap is constructed with: arena capacity,
//! the pressure watermarks that decide when soft references are cleared,
//! and diagnostics switches.

use serde::{Deserialize, Serialize};

pub const KB: usize = 1024;
pub const MB: usize = 1024 * KB;

/// Main configuration for a TGC heap
///
/// # Examples
///
/// ```rust
/// use tgc::HeapConfig;
///
/// // Use default configuration
/// let config = HeapConfig::default();
///
/// // A small arena that reaches pressure quickly
/// let config = HeapConfig {
///     capacity: 3 * 1024 * 1024,
///     low_watermark: 0.3,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeapConfig {
    /// Arena capacity in bytes
    ///
    /// Hard limit: allocation beyond it fails with `OutOfMemory`.
    /// Default: 64MB
    pub capacity: usize,

    /// Utilization fraction at which pressure becomes Low (1)
    ///
    /// Unreached soft references are cleared from this level on.
    /// Default: 0.5
    pub low_watermark: f64,

    /// Utilization fraction at which pressure becomes High (2)
    ///
    /// Default: 0.85
    pub high_watermark: f64,

    /// Emit recorded GC events through the `log` facade
    ///
    /// Default: false
    pub verbose: bool,

    /// Number of per-cycle statistics kept in history
    ///
    /// Default: 32
    pub stats_history: usize,

    /// Number of GC events kept by the heap logger
    ///
    /// Default: 256
    pub event_history: usize,
}

impl Default for HeapConfig {
    fn default() -> Self {
        HeapConfig {
            capacity: 64 * MB,
            low_watermark: 0.5,
            high_watermark: 0.85,
            verbose: false,
            stats_history: 32,
            event_history: 256,
        }
    }
}

impl HeapConfig {
    /// Configuration with the given capacity and default watermarks
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    /// Validate configuration
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tgc::HeapConfig;
    ///
    /// let config = HeapConfig {
    ///     capacity: 0,  // Invalid!
    ///     ..Default::default()
    /// };
    ///
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidCapacity(
                "capacity must be > 0".to_string(),
            ));
        }

        if !(self.low_watermark > 0.0 && self.low_watermark <= 1.0) {
            return Err(ConfigError::InvalidWatermark(format!(
                "low_watermark must be in (0.0, 1.0], got {}",
                self.low_watermark
            )));
        }

        if !(self.high_watermark > 0.0 && self.high_watermark <= 1.0) {
            return Err(ConfigError::InvalidWatermark(format!(
                "high_watermark must be in (0.0, 1.0], got {}",
                self.high_watermark
            )));
        }

        if self.low_watermark > self.high_watermark {
            return Err(ConfigError::InvalidWatermark(
                "low_watermark cannot exceed high_watermark".to_string(),
            ));
        }

        if self.stats_history == 0 {
            return Err(ConfigError::InvalidHistory(
                "stats_history must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Build configuration from environment variables
    ///
    /// Overrides defaults with environment variables:
    /// - TGC_CAPACITY
    /// - TGC_LOW_WATERMARK
    /// - TGC_HIGH_WATERMARK
    /// - TGC_VERBOSE
    ///
    /// Unparsable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("TGC_CAPACITY") {
            if let Ok(size) = val.parse::<usize>() {
                config.capacity = size;
            }
        }

        if let Ok(val) = std::env::var("TGC_LOW_WATERMARK") {
            if let Ok(fraction) = val.parse::<f64>() {
                config.low_watermark = fraction;
            }
        }

        if let Ok(val) = std::env::var("TGC_HIGH_WATERMARK") {
            if let Ok(fraction) = val.parse::<f64>() {
                config.high_watermark = fraction;
            }
        }

        if let Ok(val) = std::env::var("TGC_VERBOSE") {
            config.verbose = val == "1" || val.eq_ignore_ascii_case("true");
        }

        config
    }

    /// Parse configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: HeapConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Error types for configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid capacity: {0}")]
    InvalidCapacity(String),

    #[error("Invalid watermark: {0}")]
    InvalidWatermark(String),

    #[error("Invalid history length: {0}")]
    InvalidHistory(String),

    #[error("Unparsable configuration: {0}")]
    Parse(String),
}
