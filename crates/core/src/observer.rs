//! Lifecycle observation
//!
//! Cells and actors report what they did through an injected
//! [`CellObserver`]. Business logic never writes to a global sink; the
//! default [`TracingObserver`] forwards events to `tracing`.

use crate::types::CellKey;
use tracing::debug;

/// Something that happened to a cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellEvent {
    /// `initialize` completed
    Initialized {
        /// Cell key
        key: CellKey,
        /// `true` if this call created the cell
        created: bool,
    },

    /// `apply_update` committed
    ///
    /// A stale or duplicate candidate shows up with `current == previous`.
    Updated {
        /// Cell key
        key: CellKey,
        /// Submitted value
        candidate: i64,
        /// Value before the update, `None` if the key was absent
        previous: Option<i64>,
        /// Value after the update
        current: i64,
    },

    /// Actor for the key was spawned
    Activated {
        /// Cell key
        key: CellKey,
    },

    /// Actor for the key went idle and stopped
    Deactivated {
        /// Cell key
        key: CellKey,
    },
}

impl CellEvent {
    /// Key the event is about
    pub fn key(&self) -> &CellKey {
        match self {
            CellEvent::Initialized { key, .. }
            | CellEvent::Updated { key, .. }
            | CellEvent::Activated { key }
            | CellEvent::Deactivated { key } => key,
        }
    }

    /// For `Updated` events, whether the candidate was at or below the
    /// previous value
    pub fn is_stale_update(&self) -> bool {
        match self {
            CellEvent::Updated {
                candidate,
                previous: Some(previous),
                ..
            } => candidate <= previous,
            _ => false,
        }
    }
}

/// Sink for [`CellEvent`]s
///
/// Called synchronously after the operation has taken effect, outside of
/// any store lock. Implementations must be cheap and must not call back
/// into the cell.
pub trait CellObserver: Send + Sync {
    /// Receive one event
    fn observe(&self, event: &CellEvent);
}

/// Observer that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CellObserver for NoopObserver {
    fn observe(&self, _event: &CellEvent) {}
}

/// Observer that logs every event at `debug` level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CellObserver for TracingObserver {
    fn observe(&self, event: &CellEvent) {
        match event {
            CellEvent::Initialized { key, created } => {
                debug!(key = %key, created, "cell initialized");
            }
            CellEvent::Updated {
                key,
                candidate,
                previous,
                current,
            } => {
                debug!(
                    key = %key,
                    candidate,
                    previous = ?previous,
                    current,
                    stale = event.is_stale_update(),
                    "cell updated"
                );
            }
            CellEvent::Activated { key } => debug!(key = %key, "actor activated"),
            CellEvent::Deactivated { key } => debug!(key = %key, "actor deactivated"),
        }
    }
}
