//! Basic Cell Operations Tests
//!
//! Tests for initialize, read, apply_update and snapshot through the facade.

use crate::*;

// =============================================================================
// INITIALIZE / READ TESTS
// =============================================================================

#[test]
fn test_initialize_then_read_is_zero() {
    let db = create_db();

    db.initialize("a").unwrap();
    assert_eq!(db.read("a").unwrap(), 0);
}

#[test]
fn test_initialize_is_idempotent() {
    let db = create_db();

    db.initialize("a").unwrap();
    db.apply_update("a", 9).unwrap();
    db.initialize("a").unwrap();

    assert_eq!(db.read("a").unwrap(), 9);
}

#[test]
fn test_read_unknown_key_is_not_initialized() {
    let db = create_db();

    let err = db.read("unknown").unwrap_err();
    assert!(err.is_not_initialized());
    assert!(matches!(err, Error::NotInitialized(ref key) if key == "unknown"));
}

#[test]
fn test_read_unknown_key_with_auto_default() {
    let db = Highwater::builder()
        .no_durability()
        .read_policy(ReadPolicy::AutoDefault)
        .open()
        .unwrap();

    assert_eq!(db.read("unknown").unwrap(), 0);
    // The read created the cell
    assert_eq!(db.snapshot("unknown").unwrap().map(|r| r.value), Some(0));
}

// =============================================================================
// APPLY_UPDATE TESTS
// =============================================================================

#[test]
fn test_apply_update_raises_value() {
    let db = create_db();

    db.initialize("a").unwrap();
    assert_eq!(db.apply_update("a", 5).unwrap(), 5);
    assert_eq!(db.read("a").unwrap(), 5);
}

#[test]
fn test_lower_candidate_is_ignored() {
    let db = create_db();

    db.apply_update("a", 5).unwrap();
    assert_eq!(db.apply_update("a", 3).unwrap(), 5);
    assert_eq!(db.read("a").unwrap(), 5);
}

#[test]
fn test_apply_update_without_initialize_creates_cell() {
    let db = create_db();

    assert_eq!(db.apply_update("fresh", 4).unwrap(), 4);
    assert_eq!(db.read("fresh").unwrap(), 4);
}

#[test]
fn test_sequences_end_at_max_with_zero() {
    for (name, candidates) in candidate_sequences() {
        let db = create_db();
        db.initialize(name).unwrap();
        for &c in &candidates {
            db.apply_update(name, c).unwrap();
        }
        let expected = candidates.iter().copied().fold(0, i64::max);
        assert_eq!(db.read(name).unwrap(), expected, "sequence {}", name);
    }
}

#[test]
fn test_keys_are_independent() {
    let db = create_db();

    db.apply_update("a", 10).unwrap();
    db.apply_update("b", 2).unwrap();

    assert_eq!(db.read("a").unwrap(), 10);
    assert_eq!(db.read("b").unwrap(), 2);
    assert!(db.read("c").is_err());
}

// =============================================================================
// SNAPSHOT TESTS
// =============================================================================

#[test]
fn test_snapshot_absent_is_none() {
    let db = create_db();
    assert!(db.snapshot("nothing").unwrap().is_none());
}

#[test]
fn test_snapshot_version_counts_changes_only() {
    let db = create_db();

    db.initialize("v").unwrap();
    assert_eq!(db.snapshot("v").unwrap().unwrap().version, 1);

    db.apply_update("v", 3).unwrap();
    db.apply_update("v", 3).unwrap();
    db.apply_update("v", 1).unwrap();
    let record = db.snapshot("v").unwrap().unwrap();
    assert_eq!(record.value, 3);
    assert_eq!(record.version, 2);

    db.apply_update("v", 8).unwrap();
    assert_eq!(db.snapshot("v").unwrap().unwrap().version, 3);
}

// =============================================================================
// OBSERVER TESTS
// =============================================================================

#[test]
fn test_observer_sees_initialize_and_updates() {
    let (db, observer) = create_observed_db();

    db.initialize("a").unwrap();
    db.initialize("a").unwrap();
    db.apply_update("a", 5).unwrap();
    db.apply_update("a", 5).unwrap();
    db.apply_update("a", 2).unwrap();

    let events = observer.events();
    assert_eq!(events.len(), 5);
    assert!(matches!(events[0], CellEvent::Initialized { created: true, .. }));
    assert!(matches!(events[1], CellEvent::Initialized { created: false, .. }));
    assert_eq!(
        events[2],
        CellEvent::Updated {
            key: "a".into(),
            candidate: 5,
            previous: Some(0),
            current: 5,
        }
    );
    // Duplicate and stale candidates are visible only to the observer
    assert_eq!(observer.stale_updates(), 2);
}
