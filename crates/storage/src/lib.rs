//! Storage layer for Highwater
//!
//! This crate implements the [`DurableStore`](highwater_core::DurableStore)
//! contract twice:
//! - [`ShardedStore`]: DashMap directory with one mutex per cell, memory only
//! - [`WalStore`]: the same cells fronting a CRC-checked write-ahead log,
//!   with crash recovery on open
//!
//! The `wal` module holds the log format, writer, reader and
//! [`DurabilityMode`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod durable;
pub mod sharded;
pub mod wal;

pub use durable::{RecoveryStats, WalStore};
pub use sharded::ShardedStore;
pub use wal::DurabilityMode;
