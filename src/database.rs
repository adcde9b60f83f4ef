//! Main entry point for Highwater.
//!
//! This module provides the `Highwater` struct, which bundles a store, the
//! max-merge cell logic and an optional router behind one handle.

use crate::error::{Error, Result};
use highwater_actor::{CellRouter, RouterConfig};
use highwater_core::{CellKey, CellObserver, CellRecord, DurableStore};
use highwater_primitives::{MaxCell, ReadPolicy};
use highwater_storage::{DurabilityMode, RecoveryStats, ShardedStore, WalStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Store handle shared by the facade and its routers
pub type SharedStore = Arc<dyn DurableStore>;

/// A Highwater cell database.
///
/// Create one with [`Highwater::open`], [`Highwater::ephemeral`] or
/// [`Highwater::builder`].
///
/// # Example
///
/// ```
/// use highwater::prelude::*;
///
/// let db = Highwater::ephemeral()?;
/// db.initialize("visits")?;
/// db.apply_update("visits", 5)?;
/// db.apply_update("visits", 3)?;
/// assert_eq!(db.read("visits")?, 5);
/// # Ok::<(), highwater::Error>(())
/// ```
pub struct Highwater {
    cells: MaxCell<SharedStore>,
    wal: Option<Arc<WalStore>>,
    durability: DurabilityMode,
}

impl Highwater {
    /// Open a database at the given path.
    ///
    /// Uses default settings (batched durability, strict reads).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().path(path).open()
    }

    /// Create an ephemeral database with no disk I/O.
    ///
    /// Nothing is logged and all values are lost on drop.
    ///
    /// | Method | Disk Files | Recovery |
    /// |--------|------------|----------|
    /// | `Highwater::ephemeral()` | None | No |
    /// | `Highwater::open(path)` | `path/cells.wal` | Yes |
    pub fn ephemeral() -> Result<Self> {
        Self::builder().no_durability().open()
    }

    /// Create a builder for database configuration.
    pub fn builder() -> HighwaterBuilder {
        HighwaterBuilder::new()
    }

    /// Create `key` with value 0 if it does not exist yet.
    ///
    /// Idempotent, including under concurrent calls.
    pub fn initialize(&self, key: &str) -> Result<()> {
        Ok(self.cells.initialize(&CellKey::new(key))?)
    }

    /// Current value of `key`.
    ///
    /// # Errors
    ///
    /// [`Error::NotInitialized`] if the key was never created and the read
    /// policy is [`ReadPolicy::RequireInitialized`].
    pub fn read(&self, key: &str) -> Result<i64> {
        Ok(self.cells.read(&CellKey::new(key))?)
    }

    /// Merge `candidate` into `key`, returning the resulting value.
    ///
    /// Out-of-order and repeated candidates are accepted; the value only
    /// ever moves up.
    pub fn apply_update(&self, key: &str, candidate: i64) -> Result<i64> {
        Ok(self.cells.apply_update(&CellKey::new(key), candidate)?)
    }

    /// Value, version and last change time of `key`, if it exists.
    pub fn snapshot(&self, key: &str) -> Result<Option<CellRecord>> {
        Ok(self.cells.snapshot(&CellKey::new(key))?)
    }

    /// Cell logic over this database's store.
    pub fn cells(&self) -> &MaxCell<SharedStore> {
        &self.cells
    }

    /// Create an actor router over this database's cells.
    ///
    /// Actors are spawned on the Tokio runtime that runs the first routed
    /// request. Several routers may share one database; each key then has
    /// one actor per router, and the store keeps them consistent.
    pub fn router(&self, config: RouterConfig) -> CellRouter<SharedStore> {
        CellRouter::new(self.cells.clone(), config)
    }

    /// Force pending log records to disk.
    ///
    /// No-op for ephemeral databases.
    pub fn flush(&self) -> Result<()> {
        match &self.wal {
            Some(wal) => Ok(wal.flush()?),
            None => Ok(()),
        }
    }

    /// Data directory, if the database is disk-backed.
    pub fn path(&self) -> Option<&Path> {
        self.wal.as_deref().map(WalStore::path)
    }

    /// Get the current durability mode.
    pub fn durability_mode(&self) -> DurabilityMode {
        self.durability
    }

    /// Check if this database keeps no files.
    pub fn is_ephemeral(&self) -> bool {
        self.wal.is_none()
    }

    /// What log replay found when the database was opened.
    pub fn recovery_stats(&self) -> Option<&RecoveryStats> {
        self.wal.as_deref().map(WalStore::recovery_stats)
    }
}

impl std::fmt::Debug for Highwater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Highwater")
            .field("path", &self.path())
            .field("durability", &self.durability)
            .field("read_policy", &self.cells.read_policy())
            .finish()
    }
}

/// Builder for database configuration.
///
/// # Example
///
/// ```no_run
/// use highwater::prelude::*;
///
/// // Disk-backed, fsync on every change
/// let db = Highwater::builder()
///     .path("./cells")
///     .strict()
///     .open()?;
///
/// // In-memory, reads of unknown keys return 0
/// let scratch = Highwater::builder()
///     .no_durability()
///     .read_policy(ReadPolicy::AutoDefault)
///     .open()?;
/// # Ok::<(), highwater::Error>(())
/// ```
pub struct HighwaterBuilder {
    path: Option<PathBuf>,
    durability: DurabilityMode,
    read_policy: ReadPolicy,
    observer: Option<Arc<dyn CellObserver>>,
}

impl HighwaterBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            path: None,
            durability: DurabilityMode::default(),
            read_policy: ReadPolicy::default(),
            observer: None,
        }
    }

    /// Set the data directory.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the durability mode.
    pub fn durability(mut self, mode: DurabilityMode) -> Self {
        self.durability = mode;
        self
    }

    /// Keep everything in memory. Any configured path is ignored.
    pub fn no_durability(self) -> Self {
        self.durability(DurabilityMode::None)
    }

    /// Use batched fsync (default): every 100ms or 1000 records.
    pub fn buffered(self) -> Self {
        self.durability(DurabilityMode::buffered_default())
    }

    /// Use batched fsync with custom limits.
    pub fn buffered_with(self, interval_ms: u64, batch_size: usize) -> Self {
        self.durability(DurabilityMode::Batched {
            interval_ms,
            batch_size,
        })
    }

    /// Fsync after every change.
    pub fn strict(self) -> Self {
        self.durability(DurabilityMode::Strict)
    }

    /// Choose how reads of never-created keys behave.
    pub fn read_policy(mut self, policy: ReadPolicy) -> Self {
        self.read_policy = policy;
        self
    }

    /// Receive cell events. Defaults to `tracing` output.
    pub fn observer(mut self, observer: Arc<dyn CellObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Open the database.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if a durable mode is selected without a path
    /// - [`Error::Io`] / [`Error::StoreUnavailable`] if the log cannot be
    ///   opened or replayed
    pub fn open(self) -> Result<Highwater> {
        let (store, wal): (SharedStore, Option<Arc<WalStore>>) = if self.durability.requires_wal()
        {
            let path = self.path.ok_or_else(|| {
                Error::Config(format!(
                    "durability mode '{}' needs a data directory",
                    self.durability.description()
                ))
            })?;
            let wal = Arc::new(WalStore::open(&path, self.durability)?);
            let store: SharedStore = wal.clone();
            (store, Some(wal))
        } else {
            let store: SharedStore = Arc::new(ShardedStore::new());
            (store, None)
        };

        let mut cells = MaxCell::new(store).with_read_policy(self.read_policy);
        if let Some(observer) = self.observer {
            cells = cells.with_observer(observer);
        }

        info!(
            durability = self.durability.description(),
            ephemeral = wal.is_none(),
            "highwater opened"
        );
        Ok(Highwater {
            cells,
            wal,
            durability: self.durability,
        })
    }
}

impl Default for HighwaterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
