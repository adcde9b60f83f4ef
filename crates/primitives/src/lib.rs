//! Primitives layer for Highwater
//!
//! - [`MaxCell`]: conflict-resolving state cell (merge = `max`)
//! - [`ReadPolicy`]: what reads of unknown keys do
//!
//! All primitives are stateless facades over a
//! [`DurableStore`](highwater_core::DurableStore); the store owns the data
//! and its locking.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod max_cell;

pub use max_cell::{merge, MaxCell, ReadPolicy, INITIAL_VALUE};
