//! Cell API Comprehensive Test Suite
//!
//! Exercises the `Highwater` facade end to end: the max-merge rules,
//! concurrent delivery, read policies, persistence across reopen and
//! routed access through per-key actors.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test cell_api_comprehensive
//!
//! # Durability tests only
//! cargo test --test cell_api_comprehensive durability::
//! ```

use std::sync::Arc;

use highwater::prelude::*;
use parking_lot::Mutex;

// Test modules
pub mod basic_ops;
pub mod concurrency;
pub mod durability;
pub mod edge_cases;
pub mod router;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

/// Create an in-memory database with strict reads
pub fn create_db() -> Highwater {
    Highwater::ephemeral().expect("Failed to create ephemeral database")
}

/// Create a database at `dir` with fsync on every change
pub fn create_durable_db(dir: &std::path::Path) -> Highwater {
    Highwater::builder()
        .path(dir)
        .strict()
        .open()
        .expect("Failed to open durable database")
}

/// Observer that keeps every event it sees
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<CellEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<CellEvent> {
        self.events.lock().clone()
    }

    pub fn stale_updates(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.is_stale_update())
            .count()
    }
}

impl CellObserver for RecordingObserver {
    fn observe(&self, event: &CellEvent) {
        self.events.lock().push(event.clone());
    }
}

/// In-memory database reporting to a fresh recording observer
pub fn create_observed_db() -> (Highwater, Arc<RecordingObserver>) {
    let observer = Arc::new(RecordingObserver::default());
    let db = Highwater::builder()
        .no_durability()
        .observer(observer.clone())
        .open()
        .expect("Failed to create observed database");
    (db, observer)
}

/// Candidate sequences mixing order, duplicates and negatives
pub fn candidate_sequences() -> Vec<(&'static str, Vec<i64>)> {
    vec![
        ("ascending", vec![1, 2, 3, 4, 5]),
        ("descending", vec![5, 4, 3, 2, 1]),
        ("duplicates", vec![7, 7, 7, 3, 7]),
        ("all_negative", vec![-5, -1, -9]),
        ("mixed_sign", vec![-3, 8, -20, 2]),
        ("extremes", vec![i64::MIN, i64::MAX, 0]),
    ]
}
