//! Router error types

use highwater_core::{CellError, CellKey};
use thiserror::Error;

/// Result type for routed operations
pub type RouterResult<T> = std::result::Result<T, RouterError>;

/// Failure of a routed operation
#[derive(Debug, Error)]
pub enum RouterError {
    /// The cell operation itself failed
    #[error(transparent)]
    Cell(#[from] CellError),

    /// The key's actor stopped before replying
    ///
    /// The request may or may not have been applied; resubmitting it is
    /// safe because updates are idempotent.
    #[error("mailbox closed for cell {key}")]
    MailboxClosed {
        /// Key whose actor went away
        key: CellKey,
    },
}

impl RouterError {
    /// Check if retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            RouterError::Cell(e) => e.is_retryable(),
            RouterError::MailboxClosed { .. } => true,
        }
    }
}
