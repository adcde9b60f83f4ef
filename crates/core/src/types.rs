//! Core types for cells
//!
//! - [`CellKey`]: opaque, caller-chosen identifier
//! - [`CellRecord`]: current value plus diagnostics (version, timestamp)
//! - [`StoreUpdate`]: previous and resulting value of an atomic update

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Identifier of a cell
///
/// Keys are opaque strings. No syntax is imposed; the empty string is a
/// valid key like any other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellKey(String);

impl CellKey {
    /// Create a key from anything string-like
    ///
    /// # Examples
    ///
    /// ```
    /// use highwater_core::CellKey;
    ///
    /// let key = CellKey::new("vehicle:42");
    /// assert_eq!(key.as_str(), "vehicle:42");
    /// ```
    pub fn new(key: impl Into<String>) -> Self {
        CellKey(key.into())
    }

    /// Borrow the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the key is the empty string
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the key, returning the inner string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CellKey {
    fn from(key: &str) -> Self {
        CellKey::new(key)
    }
}

impl From<String> for CellKey {
    fn from(key: String) -> Self {
        CellKey(key)
    }
}

impl From<&String> for CellKey {
    fn from(key: &String) -> Self {
        CellKey(key.clone())
    }
}

impl AsRef<str> for CellKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CellKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Stored state of a cell
///
/// Only `value` takes part in merging. `version` and `updated_at` exist
/// for diagnostics:
/// - `version` starts at 1 when the cell is created and is bumped only
///   when the value actually changes
/// - `updated_at` is the wall-clock time (milliseconds since epoch) of the
///   last change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRecord {
    /// Current merged value
    pub value: i64,
    /// Change counter
    pub version: u64,
    /// Last change timestamp (milliseconds since epoch)
    pub updated_at: i64,
}

impl CellRecord {
    /// Create a fresh record at version 1
    pub fn new(value: i64) -> Self {
        Self {
            value,
            version: 1,
            updated_at: Self::now(),
        }
    }

    /// Create a record with an explicit version and timestamp
    ///
    /// Used when rebuilding state from a log.
    pub fn with_version(value: i64, version: u64, updated_at: i64) -> Self {
        Self {
            value,
            version,
            updated_at,
        }
    }

    /// Record that would result from replacing the value with `value`
    ///
    /// Returns `self` unchanged when `value` equals the current value.
    pub fn advanced_to(&self, value: i64) -> Self {
        if value == self.value {
            *self
        } else {
            Self {
                value,
                version: self.version + 1,
                updated_at: Self::now(),
            }
        }
    }

    /// Current timestamp in milliseconds
    pub fn now() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Outcome of [`DurableStore::atomic_update`](crate::DurableStore::atomic_update)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreUpdate {
    /// Value before the update, `None` if the key was absent
    pub previous: Option<i64>,
    /// Value after the update (what was persisted)
    pub current: i64,
}

impl StoreUpdate {
    /// Check whether the update changed the stored value
    ///
    /// Creating a key counts as a change.
    pub fn changed(&self) -> bool {
        self.previous != Some(self.current)
    }
}
