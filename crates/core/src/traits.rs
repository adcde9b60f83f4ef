//! Store contract
//!
//! [`DurableStore`] is the only thing cells know about persistence. It
//! exposes exactly three operations and no blind write: every mutation goes
//! through [`try_initialize`](DurableStore::try_initialize) or
//! [`atomic_update`](DurableStore::atomic_update), which is what rules out
//! lost updates under concurrent callers.

use crate::error::StoreResult;
use crate::types::{CellKey, CellRecord, StoreUpdate};
use std::sync::Arc;

/// Durable keyed store of cell records
///
/// # Thread Safety
///
/// Implementations must be safe to call from many threads at once.
/// Operations on the same key must be linearizable; operations on
/// different keys should not block each other.
///
/// # Atomicity
///
/// `atomic_update` must call `update` exactly once, with the key locked,
/// and persist the result before the lock is released. On error nothing
/// is visible.
pub trait DurableStore: Send + Sync {
    /// Set `key` to `default` only if it is absent
    ///
    /// Returns `true` if the record was newly created.
    fn try_initialize(&self, key: &CellKey, default: i64) -> StoreResult<bool>;

    /// Apply `update` to the current value (or `None` if absent) and persist
    /// the result
    fn atomic_update(
        &self,
        key: &CellKey,
        update: &dyn Fn(Option<i64>) -> i64,
    ) -> StoreResult<StoreUpdate>;

    /// Current record for `key`, `None` if absent
    fn get(&self, key: &CellKey) -> StoreResult<Option<CellRecord>>;
}

impl<S: DurableStore + ?Sized> DurableStore for Arc<S> {
    fn try_initialize(&self, key: &CellKey, default: i64) -> StoreResult<bool> {
        (**self).try_initialize(key, default)
    }

    fn atomic_update(
        &self,
        key: &CellKey,
        update: &dyn Fn(Option<i64>) -> i64,
    ) -> StoreResult<StoreUpdate> {
        (**self).atomic_update(key, update)
    }

    fn get(&self, key: &CellKey) -> StoreResult<Option<CellRecord>> {
        (**self).get(key)
    }
}

impl<S: DurableStore + ?Sized> DurableStore for Box<S> {
    fn try_initialize(&self, key: &CellKey, default: i64) -> StoreResult<bool> {
        (**self).try_initialize(key, default)
    }

    fn atomic_update(
        &self,
        key: &CellKey,
        update: &dyn Fn(Option<i64>) -> i64,
    ) -> StoreResult<StoreUpdate> {
        (**self).atomic_update(key, update)
    }

    fn get(&self, key: &CellKey) -> StoreResult<Option<CellRecord>> {
        (**self).get(key)
    }
}
