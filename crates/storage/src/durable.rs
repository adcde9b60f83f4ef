//! WAL-backed cell store
//!
//! [`WalStore`] keeps every cell in a [`ShardedStore`] and logs each
//! change to `cells.wal` before publishing it.
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. Lock the cell's slot
//! 2. Compute the new record from the current one
//! 3. IF unchanged: release, nothing logged
//! 4. Append post-image to the WAL (fsync per DurabilityMode)
//! 5. IF append failed: release, slot untouched, return error
//! 6. Publish new record in the slot
//! ```
//!
//! ## Recovery
//!
//! Opening a directory scans the log up to the first torn or corrupt
//! record, merges every record into memory with `max`, and cuts the log
//! back to the valid prefix. Because records are merged rather than
//! applied in order, a record appearing twice (or out of order) changes
//! nothing.

use crate::sharded::ShardedStore;
use crate::wal::{DurabilityMode, RecordKind, WalReader, WalRecord, WalWriter, MAX_KEY_LEN, WAL_FILENAME};
use highwater_core::{CellKey, CellRecord, DurableStore, StoreError, StoreResult, StoreUpdate};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// What recovery found when the store was opened
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryStats {
    /// Log records merged into memory
    pub records_replayed: u64,
    /// Distinct cells after replay
    pub cells_recovered: u64,
    /// Bytes cut from the end of the log
    pub truncated_bytes: u64,
    /// Time spent recovering (microseconds)
    pub recovery_time_micros: u64,
}

impl RecoveryStats {
    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "recovered {} cells from {} records in {}us ({} bytes truncated)",
            self.cells_recovered,
            self.records_replayed,
            self.recovery_time_micros,
            self.truncated_bytes
        )
    }
}

/// Durable store: in-memory cells fronting a write-ahead log
///
/// # Thread Safety
///
/// Cells are locked individually as in [`ShardedStore`]. Appends to the
/// single log file are serialized by an internal mutex that is only taken
/// while a cell lock is already held (cell → log, never the reverse).
pub struct WalStore {
    cells: ShardedStore,
    wal: Mutex<WalWriter>,
    dir: PathBuf,
    recovery: RecoveryStats,
}

impl WalStore {
    /// Open (or create) a store in `dir`
    ///
    /// With [`DurabilityMode::None`] the log is still written but never
    /// fsynced. The `Highwater` facade does not open a `WalStore` in that
    /// mode; it keeps cells in a plain [`ShardedStore`] instead.
    pub fn open(dir: impl AsRef<Path>, mode: DurabilityMode) -> StoreResult<Self> {
        let started = Instant::now();
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        let wal_path = dir.join(WAL_FILENAME);

        info!(path = %wal_path.display(), mode = mode.description(), "opening cell store");

        let scan = WalReader::scan(&wal_path)?;
        if let Some(stopped) = &scan.stopped_at {
            warn!(
                path = %wal_path.display(),
                error = %stopped,
                discarded = scan.discarded_bytes(),
                "WAL replay stopped early"
            );
        }

        let cells = ShardedStore::new();
        let records_replayed = scan.records.len() as u64;
        for entry in scan.records {
            cells.merge_recovered(entry.key, entry.record);
        }

        let wal = WalWriter::open(&wal_path, mode, scan.valid_len)?;

        let recovery = RecoveryStats {
            records_replayed,
            cells_recovered: cells.len() as u64,
            truncated_bytes: scan.file_len - scan.valid_len,
            recovery_time_micros: started.elapsed().as_micros() as u64,
        };
        info!("{}", recovery.summary());

        Ok(Self {
            cells,
            wal: Mutex::new(wal),
            dir,
            recovery,
        })
    }

    /// Force an fsync of pending records
    pub fn flush(&self) -> StoreResult<()> {
        self.wal.lock().flush().map_err(StoreError::from)
    }

    /// What recovery found on open
    pub fn recovery_stats(&self) -> &RecoveryStats {
        &self.recovery
    }

    /// Data directory
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the store has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cells sorted by key
    pub fn snapshot(&self) -> Vec<(CellKey, CellRecord)> {
        self.cells.snapshot()
    }

    fn append(&self, kind: RecordKind, key: &CellKey, record: CellRecord) -> StoreResult<()> {
        // A record the reader would reject must never be acknowledged
        if key.len() > MAX_KEY_LEN {
            return Err(StoreError::KeyTooLarge {
                len: key.len(),
                max: MAX_KEY_LEN,
            });
        }
        let entry = WalRecord::new(kind, key.clone(), record);
        self.wal.lock().append(&entry).map_err(StoreError::from)
    }

    #[cfg(test)]
    fn with_writer(cells: ShardedStore, wal: WalWriter, dir: PathBuf) -> Self {
        Self {
            cells,
            wal: Mutex::new(wal),
            dir,
            recovery: RecoveryStats::default(),
        }
    }
}

impl DurableStore for WalStore {
    fn try_initialize(&self, key: &CellKey, default: i64) -> StoreResult<bool> {
        self.cells.with_slot(key, |slot| {
            if slot.is_some() {
                return Ok(false);
            }
            let record = CellRecord::new(default);
            self.append(RecordKind::Init, key, record)?;
            *slot = Some(record);
            Ok(true)
        })
    }

    fn atomic_update(
        &self,
        key: &CellKey,
        update: &dyn Fn(Option<i64>) -> i64,
    ) -> StoreResult<StoreUpdate> {
        self.cells.with_slot(key, |slot| {
            let previous = slot.map(|record| record.value);
            let current = update(previous);
            let outcome = StoreUpdate { previous, current };
            if !outcome.changed() {
                return Ok(outcome);
            }

            let record = match *slot {
                Some(record) => record.advanced_to(current),
                None => CellRecord::new(current),
            };
            self.append(RecordKind::Update, key, record)?;
            *slot = Some(record);
            Ok(outcome)
        })
    }

    fn get(&self, key: &CellKey) -> StoreResult<Option<CellRecord>> {
        self.cells.get(key)
    }
}

impl std::fmt::Debug for WalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalStore")
            .field("dir", &self.dir)
            .field("cells", &self.cells.len())
            .field("recovery", &self.recovery)
            .finish()
    }
}
