//! Sharded in-memory cell storage
//!
//! DashMap keyed by [`CellKey`], one mutex per cell.
//!
//! # Design
//!
//! - DashMap: 16-way sharded directory, shard lock held only for lookup
//!   or insertion of a cell slot
//! - FxHash: fast non-crypto hash for the directory
//! - Per-cell `parking_lot::Mutex`: read-modify-write of one key never
//!   blocks another key
//!
//! # Locking Order
//!
//! The slot `Arc` is cloned out of the map before its mutex is taken, so a
//! DashMap shard guard is never held while waiting on a cell.

use dashmap::DashMap;
use highwater_core::{CellKey, CellRecord, DurableStore, StoreResult, StoreUpdate};
use parking_lot::Mutex;
use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;
use std::sync::Arc;

type FxBuildHasher = BuildHasherDefault<FxHasher>;

/// Lockable slot for one cell
///
/// `None` means the slot exists in the directory but nothing has been
/// committed to it yet (for example a write-ahead append failed).
pub(crate) type Slot = Arc<Mutex<Option<CellRecord>>>;

/// Sharded in-memory store
///
/// # Thread Safety
///
/// All operations are thread-safe:
/// - get(): shard read lock for the lookup, then the cell's mutex
/// - try_initialize()/atomic_update(): only the target cell's mutex is
///   held across the read-modify-write
/// - Different keys never contend on their mutex
///
/// # Example
///
/// ```
/// use highwater_core::{CellKey, DurableStore};
/// use highwater_storage::ShardedStore;
///
/// let store = ShardedStore::new();
/// let key = CellKey::new("a");
/// store.try_initialize(&key, 0).unwrap();
/// let update = store.atomic_update(&key, &|v| v.unwrap_or(0).max(5)).unwrap();
/// assert_eq!(update.current, 5);
/// ```
pub struct ShardedStore {
    cells: DashMap<CellKey, Slot, FxBuildHasher>,
}

impl ShardedStore {
    /// Create new sharded store
    pub fn new() -> Self {
        Self {
            cells: DashMap::with_hasher(FxBuildHasher::default()),
        }
    }

    /// Create with expected number of cells
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: DashMap::with_capacity_and_hasher(capacity, FxBuildHasher::default()),
        }
    }

    /// Number of committed cells
    pub fn len(&self) -> usize {
        self.cells
            .iter()
            .filter(|entry| entry.value().lock().is_some())
            .count()
    }

    /// Check if no cell has been committed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if a committed cell exists for `key`
    pub fn contains(&self, key: &CellKey) -> bool {
        self.slot_if_present(key)
            .map(|slot| slot.lock().is_some())
            .unwrap_or(false)
    }

    /// All committed cells, sorted by key
    ///
    /// NOTE: Collect + sort over every shard. Not for hot paths.
    pub fn snapshot(&self) -> Vec<(CellKey, CellRecord)> {
        let mut results: Vec<_> = self
            .cells
            .iter()
            .filter_map(|entry| {
                let record = *entry.value().lock();
                record.map(|record| (entry.key().clone(), record))
            })
            .collect();
        results.sort_by(|(a, _), (b, _)| a.cmp(b));
        results
    }

    /// Merge a record rebuilt from a log
    ///
    /// Keeps the record with the larger value; replaying the same record
    /// twice is harmless.
    pub fn merge_recovered(&self, key: CellKey, record: CellRecord) {
        let slot = self.slot(&key);
        let mut guard = slot.lock();
        match guard.as_mut() {
            Some(existing) if existing.value >= record.value => {
                existing.version = existing.version.max(record.version);
            }
            Some(existing) => {
                let version = existing.version.max(record.version);
                *existing = CellRecord { version, ..record };
            }
            None => *guard = Some(record),
        }
    }

    /// Run `f` with the cell's slot locked
    ///
    /// Creates an empty slot for unseen keys. The closure decides whether to
    /// commit by writing into the `Option`.
    pub(crate) fn with_slot<R>(&self, key: &CellKey, f: impl FnOnce(&mut Option<CellRecord>) -> R) -> R {
        let slot = self.slot(key);
        let mut guard = slot.lock();
        f(&mut guard)
    }

    fn slot(&self, key: &CellKey) -> Slot {
        if let Some(slot) = self.slot_if_present(key) {
            return slot;
        }
        Arc::clone(
            self.cells
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(None)))
                .value(),
        )
    }

    fn slot_if_present(&self, key: &CellKey) -> Option<Slot> {
        self.cells.get(key).map(|entry| Arc::clone(entry.value()))
    }
}

impl DurableStore for ShardedStore {
    fn try_initialize(&self, key: &CellKey, default: i64) -> StoreResult<bool> {
        Ok(self.with_slot(key, |slot| {
            if slot.is_some() {
                false
            } else {
                *slot = Some(CellRecord::new(default));
                true
            }
        }))
    }

    fn atomic_update(
        &self,
        key: &CellKey,
        update: &dyn Fn(Option<i64>) -> i64,
    ) -> StoreResult<StoreUpdate> {
        Ok(self.with_slot(key, |slot| {
            let previous = slot.map(|record| record.value);
            let current = update(previous);
            *slot = Some(match *slot {
                Some(record) => record.advanced_to(current),
                None => CellRecord::new(current),
            });
            StoreUpdate { previous, current }
        }))
    }

    fn get(&self, key: &CellKey) -> StoreResult<Option<CellRecord>> {
        Ok(self.slot_if_present(key).and_then(|slot| *slot.lock()))
    }
}

impl Default for ShardedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShardedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedStore")
            .field("cells", &self.len())
            .finish()
    }
}
