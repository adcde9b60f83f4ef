//! Convenient imports for Highwater.
//!
//! ```
//! use highwater::prelude::*;
//!
//! let db = Highwater::ephemeral()?;
//! assert_eq!(db.apply_update("k", 3)?, 3);
//! # Ok::<(), highwater::Error>(())
//! ```

// Main entry point
pub use crate::database::{Highwater, HighwaterBuilder};

// Error handling
pub use crate::error::{Error, Result};

// Configuration
pub use highwater_actor::RouterConfig;
pub use highwater_primitives::ReadPolicy;
pub use highwater_storage::DurabilityMode;

// Observation
pub use highwater_core::{CellEvent, CellObserver, CellRecord};
