//! # Highwater
//!
//! Embedded store of monotonic counter cells.
//!
//! Each key holds one `i64` that only moves up. Updates may arrive
//! concurrently, out of order and more than once; every candidate is merged
//! with `max`, so the value always equals the largest candidate seen (or 0).
//!
//! ## Quick Start
//!
//! ```
//! use highwater::prelude::*;
//!
//! let db = Highwater::ephemeral()?;
//!
//! db.initialize("offset")?;
//! db.apply_update("offset", 42)?;
//! db.apply_update("offset", 17)?; // late delivery, ignored
//! assert_eq!(db.read("offset")?, 42);
//! # Ok::<(), highwater::Error>(())
//! ```
//!
//! ## Layers
//!
//! - [`Highwater`] - facade with builder-based configuration
//! - [`MaxCell`] - the merge logic over any [`DurableStore`]
//! - [`CellRouter`] - one actor per key on a Tokio runtime
//! - [`WalStore`] / [`ShardedStore`] - durable and in-memory stores

#![warn(missing_docs)]

mod database;
mod error;

pub mod prelude;

// Re-export main entry points
pub use database::{Highwater, HighwaterBuilder, SharedStore};
pub use error::{Error, Result};

// Re-export the layers underneath
pub use highwater_actor::{CellRouter, RouterConfig, RouterError};
pub use highwater_core::{
    CellError, CellEvent, CellKey, CellObserver, CellRecord, DurableStore, NoopObserver,
    StoreError, StoreUpdate, TracingObserver,
};
pub use highwater_primitives::{merge, MaxCell, ReadPolicy, INITIAL_VALUE};
pub use highwater_storage::wal::MAX_KEY_LEN;
pub use highwater_storage::{DurabilityMode, RecoveryStats, ShardedStore, WalStore};
