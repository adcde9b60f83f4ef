//! Error types for stores and cells
//!
//! Two layers:
//! - [`StoreError`]: raised by a [`DurableStore`](crate::DurableStore)
//!   implementation when it cannot complete an operation
//! - [`CellError`]: raised by cell operations; a store failure is carried
//!   unchanged as the source of [`CellError::StoreUnavailable`]

use crate::types::CellKey;
use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for cell operations
pub type CellResult<T> = std::result::Result<T, CellError>;

/// Failure of the underlying keyed store
///
/// Whenever a store returns one of these, no partial update is visible.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store could not complete the operation (lock poisoned, log closed, ...)
    #[error("store unavailable: {reason}")]
    Unavailable {
        /// What went wrong
        reason: String,
    },

    /// I/O failure while persisting or reading
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key is too long for the store's record format
    ///
    /// Retrying cannot succeed; nothing was written.
    #[error("key of {len} bytes exceeds the {max} byte limit")]
    KeyTooLarge {
        /// Key length in bytes
        len: usize,
        /// Largest accepted key length
        max: usize,
    },

    /// Persistent data failed validation
    #[error("corruption at offset {offset}: {reason}")]
    Corruption {
        /// Byte offset of the bad data
        offset: u64,
        /// What failed to validate
        reason: String,
    },
}

impl StoreError {
    /// Shorthand for [`StoreError::Unavailable`]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        StoreError::Unavailable {
            reason: reason.into(),
        }
    }
}

/// Failure of a cell operation
#[derive(Debug, Error)]
pub enum CellError {
    /// Key was read before it was ever initialized or updated
    #[error("cell not initialized: {key}")]
    NotInitialized {
        /// Key that was read
        key: CellKey,
    },

    /// Store could not complete the atomic operation
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl CellError {
    /// Check if retrying the same call may succeed
    ///
    /// Store failures are retryable: updates are idempotent for a fixed
    /// candidate, so resubmitting never double-applies. Oversized keys are
    /// the exception.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CellError::StoreUnavailable(e) if !matches!(e, StoreError::KeyTooLarge { .. })
        )
    }

    /// Check if this is a read of an uninitialized key
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, CellError::NotInitialized { .. })
    }
}
