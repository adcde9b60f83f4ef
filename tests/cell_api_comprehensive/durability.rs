//! Durability Tests
//!
//! Values written through a disk-backed database survive reopen, and a
//! damaged log tail costs at most the records it contains.

use crate::*;
use highwater::MAX_KEY_LEN;
use std::fs::OpenOptions;
use std::io::Write;

const WAL_FILE: &str = "cells.wal";

#[test]
fn test_values_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let db = create_durable_db(dir.path());
        db.initialize("a").unwrap();
        db.apply_update("a", 5).unwrap();
        db.apply_update("a", 3).unwrap();
        db.apply_update("b", -2).unwrap();
    }

    let db = create_durable_db(dir.path());
    assert_eq!(db.read("a").unwrap(), 5);
    assert_eq!(db.read("b").unwrap(), 0);

    let stats = db.recovery_stats().unwrap();
    assert_eq!(stats.cells_recovered, 2);
    assert_eq!(stats.truncated_bytes, 0);
}

#[test]
fn test_uninitialized_key_stays_uninitialized_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let db = create_durable_db(dir.path());
        db.apply_update("a", 1).unwrap();
        assert!(db.read("b").is_err());
    }

    let db = create_durable_db(dir.path());
    assert!(db.read("b").unwrap_err().is_not_initialized());
}

#[test]
fn test_batched_mode_persists_after_flush() {
    let dir = tempfile::tempdir().unwrap();
    {
        let db = Highwater::builder()
            .path(dir.path())
            .buffered()
            .open()
            .unwrap();
        assert_eq!(db.durability_mode(), DurabilityMode::buffered_default());
        for i in 0..100 {
            db.apply_update("counter", i).unwrap();
        }
        db.flush().unwrap();
    }

    let db = Highwater::open(dir.path()).unwrap();
    assert_eq!(db.read("counter").unwrap(), 99);
}

#[test]
fn test_torn_tail_loses_only_last_record() {
    let dir = tempfile::tempdir().unwrap();
    {
        let db = create_durable_db(dir.path());
        db.apply_update("a", 1).unwrap();
        db.apply_update("a", 2).unwrap();
    }

    // A crash in the middle of the next append leaves a partial record
    let mut file = OpenOptions::new()
        .append(true)
        .open(dir.path().join(WAL_FILE))
        .unwrap();
    file.write_all(&[40, 0, 0, 0, 0xAB, 0xCD]).unwrap();
    drop(file);

    let db = create_durable_db(dir.path());
    assert_eq!(db.read("a").unwrap(), 2);
    assert_eq!(db.recovery_stats().unwrap().truncated_bytes, 6);

    // The log is usable again after truncation
    db.apply_update("a", 3).unwrap();
    drop(db);
    let db = create_durable_db(dir.path());
    assert_eq!(db.read("a").unwrap(), 3);
    assert_eq!(db.recovery_stats().unwrap().truncated_bytes, 0);
}

#[test]
fn test_path_and_mode_reported() {
    let dir = tempfile::tempdir().unwrap();
    let db = create_durable_db(dir.path());

    assert!(!db.is_ephemeral());
    assert_eq!(db.path(), Some(dir.path()));
    assert_eq!(db.durability_mode(), DurabilityMode::Strict);
    assert!(dir.path().join(WAL_FILE).exists());
}

#[test]
fn test_no_durability_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let db = Highwater::builder()
        .path(dir.path())
        .no_durability()
        .open()
        .unwrap();
    db.apply_update("a", 1).unwrap();

    assert!(db.is_ephemeral());
    assert!(!dir.path().join(WAL_FILE).exists());
}

#[test]
fn test_durable_mode_requires_path() {
    let err = Highwater::builder().buffered().open().unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(!err.is_retryable());
}

#[test]
fn test_oversized_key_does_not_cost_later_writes() {
    let dir = tempfile::tempdir().unwrap();
    let huge = "k".repeat(MAX_KEY_LEN + 1);
    {
        let db = create_durable_db(dir.path());
        let err = db.apply_update(&huge, 1).unwrap_err();
        assert!(matches!(err, Error::InvalidKey(_)));
        assert!(!err.is_retryable());
        db.apply_update("b", 42).unwrap();
    }

    let db = create_durable_db(dir.path());
    assert_eq!(db.read("b").unwrap(), 42);
    assert!(db.read(&huge).unwrap_err().is_not_initialized());
    assert_eq!(db.recovery_stats().unwrap().truncated_bytes, 0);
}
