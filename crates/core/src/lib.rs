//! Core types for Highwater
//!
//! This crate defines the vocabulary shared by every other crate:
//! - [`CellKey`]: opaque identifier of a cell
//! - [`CellRecord`]: what a store keeps per key
//! - [`StoreUpdate`]: outcome of an atomic read-modify-write
//! - [`DurableStore`]: the keyed store contract cells are built on
//! - [`CellObserver`]: injected sink for lifecycle diagnostics
//! - Error types for stores and cells

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod observer;
pub mod traits;
pub mod types;

pub use error::{CellError, CellResult, StoreError, StoreResult};
pub use observer::{CellEvent, CellObserver, NoopObserver, TracingObserver};
pub use traits::DurableStore;
pub use types::{CellKey, CellRecord, StoreUpdate};
