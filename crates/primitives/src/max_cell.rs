//! MaxCell primitive implementation
//!
//! Per-key monotonic cells for updates that arrive concurrently, out of
//! order and possibly more than once.
//!
//! ## Design
//!
//! MaxCell is a stateless facade over a [`DurableStore`]. It provides:
//! - `initialize`: create a key at 0 if absent
//! - `read`: current value, governed by a [`ReadPolicy`]
//! - `apply_update`: merge a candidate with `max` through the store's
//!   atomic update
//!
//! ## Merge
//!
//! `max` is idempotent, commutative and associative, so the stored value
//! depends only on the *set* of candidates ever applied, not on delivery
//! order, duplicates or interleaving. An absent key merges as 0, which
//! keeps `value == max(0, candidates...)` even without `initialize`.
//!
//! ## Stale Updates
//!
//! A candidate at or below the current value is a silent no-op for the
//! caller: `apply_update` returns the unchanged value. The observer still
//! gets a `CellEvent::Updated` carrying `previous`, `current` and
//! `candidate`.

use highwater_core::{
    CellError, CellEvent, CellKey, CellObserver, CellRecord, CellResult, DurableStore,
    TracingObserver,
};
use highwater_storage::ShardedStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Value of a cell before any candidate is applied
pub const INITIAL_VALUE: i64 = 0;

/// Merge a stored value with a candidate
///
/// # Examples
///
/// ```
/// use highwater_primitives::merge;
///
/// assert_eq!(merge(Some(5), 3), 5);
/// assert_eq!(merge(Some(5), 8), 8);
/// assert_eq!(merge(None, -4), 0);
/// ```
#[inline]
pub fn merge(current: Option<i64>, candidate: i64) -> i64 {
    current.unwrap_or(INITIAL_VALUE).max(candidate)
}

/// What `read` does with a key that has no record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReadPolicy {
    /// Fail with [`CellError::NotInitialized`]
    #[default]
    RequireInitialized,
    /// Initialize the key to 0 and return 0
    AutoDefault,
}

/// Conflict-resolving state cell
///
/// Cheap to clone when the store is (`Arc<...>`); clones share the store
/// and observer.
///
/// # Example
///
/// ```
/// use highwater_core::CellKey;
/// use highwater_primitives::MaxCell;
///
/// let cells = MaxCell::in_memory();
/// let key = CellKey::new("a");
///
/// cells.initialize(&key).unwrap();
/// assert_eq!(cells.apply_update(&key, 5).unwrap(), 5);
/// assert_eq!(cells.apply_update(&key, 3).unwrap(), 5);
/// assert_eq!(cells.read(&key).unwrap(), 5);
/// ```
#[derive(Clone)]
pub struct MaxCell<S> {
    store: S,
    observer: Arc<dyn CellObserver>,
    policy: ReadPolicy,
}

impl MaxCell<Arc<ShardedStore>> {
    /// Cells backed by a fresh in-memory store
    pub fn in_memory() -> Self {
        MaxCell::new(Arc::new(ShardedStore::new()))
    }
}

impl<S: DurableStore> MaxCell<S> {
    /// Create cells over `store`
    ///
    /// Defaults: [`ReadPolicy::RequireInitialized`], [`TracingObserver`].
    pub fn new(store: S) -> Self {
        Self {
            store,
            observer: Arc::new(TracingObserver),
            policy: ReadPolicy::default(),
        }
    }

    /// Replace the observer
    pub fn with_observer(mut self, observer: Arc<dyn CellObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Replace the read policy
    pub fn with_read_policy(mut self, policy: ReadPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Active read policy
    pub fn read_policy(&self) -> ReadPolicy {
        self.policy
    }

    /// Observer receiving this cell's events
    pub fn observer(&self) -> &Arc<dyn CellObserver> {
        &self.observer
    }

    /// Create `key` with value 0 if it has no record
    ///
    /// Idempotent: calling it again, or concurrently, does nothing once
    /// the key exists.
    pub fn initialize(&self, key: &CellKey) -> CellResult<()> {
        let created = self.store.try_initialize(key, INITIAL_VALUE)?;
        self.observer.observe(&CellEvent::Initialized {
            key: key.clone(),
            created,
        });
        Ok(())
    }

    /// Current value of `key`
    ///
    /// # Errors
    ///
    /// - `NotInitialized` if the key has no record and the policy is
    ///   [`ReadPolicy::RequireInitialized`]
    /// - `StoreUnavailable` if the store fails
    pub fn read(&self, key: &CellKey) -> CellResult<i64> {
        if let Some(record) = self.store.get(key)? {
            return Ok(record.value);
        }
        match self.policy {
            ReadPolicy::RequireInitialized => Err(CellError::NotInitialized { key: key.clone() }),
            ReadPolicy::AutoDefault => {
                self.initialize(key)?;
                // A concurrent update may already have raised it
                Ok(self
                    .store
                    .get(key)?
                    .map(|record| record.value)
                    .unwrap_or(INITIAL_VALUE))
            }
        }
    }

    /// Merge `candidate` into `key` and return the resulting value
    ///
    /// Atomic per key. Duplicate and stale candidates leave the value as
    /// it is. On `StoreUnavailable` nothing was applied and the call may be
    /// retried as-is.
    pub fn apply_update(&self, key: &CellKey, candidate: i64) -> CellResult<i64> {
        let outcome = self
            .store
            .atomic_update(key, &|current| merge(current, candidate))?;
        self.observer.observe(&CellEvent::Updated {
            key: key.clone(),
            candidate,
            previous: outcome.previous,
            current: outcome.current,
        });
        Ok(outcome.current)
    }

    /// Full record of `key`, ignoring the read policy
    pub fn snapshot(&self, key: &CellKey) -> CellResult<Option<CellRecord>> {
        Ok(self.store.get(key)?)
    }
}

impl<S> std::fmt::Debug for MaxCell<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaxCell")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
