//! Actor routing for Highwater
//!
//! Each key gets at most one actor task at a time, fed by a bounded
//! mailbox. Actors are activated by the first request for their key,
//! initialize the cell, and stop again after an idle period.
//!
//! - [`CellRouter`]: directory of actors, request dispatch
//! - [`RouterConfig`]: mailbox capacity and idle timeout
//! - [`RouterError`]: routed operation failures

#![warn(missing_docs)]
#![warn(clippy::all)]

mod actor;
pub mod error;
pub mod router;

pub use error::{RouterError, RouterResult};
pub use router::{CellRouter, RouterConfig};
