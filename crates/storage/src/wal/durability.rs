//! Durability mode for WAL operations.
//!
//! Defines when appended records are fsynced.

use serde::{Deserialize, Serialize};

/// Durability mode for WAL writes.
///
/// Controls when data is fsynced to disk and the trade-off between
/// performance and durability.
///
/// # Mode Comparison
///
/// | Mode | fsync | Data Loss Window |
/// |------|-------|------------------|
/// | None | never | everything |
/// | Batched | every N records or T ms | bounded |
/// | Strict | every record | zero |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DurabilityMode {
    /// No durability - all data lost on exit.
    ///
    /// The `Highwater` facade writes no log file in this mode. A `WalStore`
    /// opened with it still appends records but never fsyncs them.
    None,

    /// fsync after every record (slow, maximum durability).
    Strict,

    /// fsync every `batch_size` records OR every `interval_ms` milliseconds.
    ///
    /// The interval is checked on append; there is no background thread,
    /// so an idle store keeps its last records unsynced until the next
    /// append or an explicit flush.
    Batched {
        /// Maximum time between fsyncs in milliseconds
        interval_ms: u64,
        /// Maximum records between fsyncs
        batch_size: usize,
    },
}

impl DurabilityMode {
    /// Check if this mode writes a log at all.
    pub fn requires_wal(&self) -> bool {
        !matches!(self, DurabilityMode::None)
    }

    /// Check if this mode requires fsync on every record.
    pub fn requires_immediate_fsync(&self) -> bool {
        matches!(self, DurabilityMode::Strict)
    }

    /// Human-readable description of the mode.
    pub fn description(&self) -> &'static str {
        match self {
            DurabilityMode::None => "No durability (fastest, all data lost on exit)",
            DurabilityMode::Strict => "Sync fsync (safest, slowest)",
            DurabilityMode::Batched { .. } => "Batched fsync (balanced speed/safety)",
        }
    }

    /// Batched mode with recommended defaults.
    ///
    /// Returns `Batched { interval_ms: 100, batch_size: 1000 }`.
    pub fn buffered_default() -> Self {
        DurabilityMode::Batched {
            interval_ms: 100,
            batch_size: 1000,
        }
    }
}

impl Default for DurabilityMode {
    fn default() -> Self {
        Self::buffered_default()
    }
}

impl std::str::FromStr for DurabilityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(DurabilityMode::None),
            "strict" => Ok(DurabilityMode::Strict),
            "batched" | "buffered" => Ok(DurabilityMode::buffered_default()),
            other => Err(format!(
                "unknown durability mode '{}' (expected none, strict or batched)",
                other
            )),
        }
    }
}
