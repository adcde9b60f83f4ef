//! Unified error type for Highwater.
//!
//! Crate-level errors (`CellError`, `StoreError`, `RouterError`) are
//! flattened into one enum with string payloads so callers match on the
//! failure kind without depending on the inner crates.

use highwater_actor::RouterError;
use highwater_core::{CellError, StoreError};
use thiserror::Error;

/// All Highwater errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Cell was read before anything created it
    #[error("cell not initialized: {0}")]
    NotInitialized(String),

    /// The backing store could not complete the operation
    ///
    /// The cell is unchanged. Retrying the same call is safe.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Key cannot be stored (too long for the log format)
    ///
    /// Nothing was written. Retrying with the same key fails again.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// I/O error while opening or flushing the data directory
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The request was dropped before a reply arrived
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Invalid builder configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for Highwater operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is retryable.
    ///
    /// Updates are idempotent, so any transient failure can be resubmitted.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::StoreUnavailable(_) | Error::Cancelled(_))
    }

    /// Check if this is a not-initialized error.
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, Error::NotInitialized(_))
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Io(io) => Error::Io(io),
            e @ StoreError::KeyTooLarge { .. } => Error::InvalidKey(e.to_string()),
            other => Error::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<CellError> for Error {
    fn from(e: CellError) -> Self {
        match e {
            CellError::NotInitialized { key } => Error::NotInitialized(key.into_string()),
            CellError::StoreUnavailable(e @ StoreError::KeyTooLarge { .. }) => {
                Error::InvalidKey(e.to_string())
            }
            CellError::StoreUnavailable(inner) => Error::StoreUnavailable(inner.to_string()),
        }
    }
}

impl From<RouterError> for Error {
    fn from(e: RouterError) -> Self {
        match e {
            RouterError::Cell(inner) => inner.into(),
            RouterError::MailboxClosed { key } => {
                Error::Cancelled(format!("actor for {} stopped before replying", key))
            }
        }
    }
}
