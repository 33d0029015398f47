//! Error Module - TGC Error Types
//!
//! Defines all error types returned by heap operations.
//!
//! # Error Categories
//!
//! ## Memory Errors
//! - `OutOfMemory` - Arena exhaustion
//!
//! ## Caller Errors
//! - `InvalidReference` - Object id denotes a freed or never-allocated object
//! - `InvalidHandle` - Handle slot was already released
//! - `InvalidQueue` - Reference queue was not created by this heap
//!
//! ## Configuration Errors
//! - `Configuration` - Invalid heap configuration
//!
//! Collection itself never fails, so there is no collector error variant.

use crate::config::ConfigError;
use crate::heap::ObjectId;
use crate::object::{HandleId, QueueId};
use thiserror::Error;

/// Main error type for all TGC operations
///
/// # Examples
///
/// ```rust
/// use tgc::GcError;
///
/// fn handle_error(err: GcError) {
///     match err {
///         GcError::OutOfMemory { requested, available } => {
///             eprintln!("OOM: requested {}, available {}", requested, available);
///         }
///         GcError::InvalidReference { id } => {
///             eprintln!("stale object id {}", id);
///         }
///         _ => {
///             eprintln!("Other error: {}", err);
///         }
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum GcError {
    /// Out of memory - arena exhaustion
    ///
    /// **When returned:** `used + requested` would exceed the arena capacity
    ///
    /// **Recovery strategy:** Run a collection and retry once; the arena never grows
    #[error("Out of memory: requested {requested} bytes, available {available} bytes")]
    OutOfMemory { requested: usize, available: usize },

    /// Object id does not denote a live object
    ///
    /// **When returned:** The object was swept, or the id was never issued by this heap
    ///
    /// **Recovery strategy:** None - this is a caller bug and is never retried
    #[error("Invalid reference: {id} is not a live object")]
    InvalidReference { id: ObjectId },

    /// Handle slot was already released
    ///
    /// **When returned:** A handle token outlived its registry slot
    #[error("Invalid handle: {handle} has been released")]
    InvalidHandle { handle: HandleId },

    /// Reference queue unknown to this heap
    #[error("Invalid reference queue: {queue}")]
    InvalidQueue { queue: QueueId },

    /// Configuration error
    ///
    /// **When returned:** Heap construction with an invalid `HeapConfig`
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl GcError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, GcError::OutOfMemory { .. })
    }

    /// Check if this error indicates a bug in the calling code
    pub fn is_bug(&self) -> bool {
        matches!(
            self,
            GcError::InvalidReference { .. }
                | GcError::InvalidHandle { .. }
                | GcError::InvalidQueue { .. }
        )
    }
}

/// Result type alias for TGC operations
pub type Result<T> = std::result::Result<T, GcError>;
