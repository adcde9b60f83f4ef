//! Edge Case Tests
//!
//! Extreme values, unusual keys and the algebraic properties of the merge.

use crate::*;
use proptest::prelude::*;

#[test]
fn test_extreme_candidates() {
    let db = create_db();

    assert_eq!(db.apply_update("lo", i64::MIN).unwrap(), 0);
    assert_eq!(db.apply_update("hi", i64::MAX).unwrap(), i64::MAX);
    assert_eq!(db.apply_update("hi", i64::MAX - 1).unwrap(), i64::MAX);
}

#[test]
fn test_negative_candidates_never_go_below_zero() {
    let db = create_db();

    db.initialize("n").unwrap();
    for c in [-1, -100, -7] {
        assert_eq!(db.apply_update("n", c).unwrap(), 0);
    }
}

#[test]
fn test_unusual_keys() {
    let db = create_db();
    let long = "x".repeat(4096);
    let keys = ["", " ", "日本語", "a/b/c", "with\nnewline", long.as_str()];

    for (i, key) in keys.iter().enumerate() {
        db.apply_update(key, i as i64 + 1).unwrap();
    }
    for (i, key) in keys.iter().enumerate() {
        assert_eq!(db.read(key).unwrap(), i as i64 + 1);
    }
}

#[test]
fn test_unusual_keys_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let db = create_durable_db(dir.path());
        db.apply_update("", 1).unwrap();
        db.apply_update("日本語", 2).unwrap();
    }
    let db = create_durable_db(dir.path());
    assert_eq!(db.read("").unwrap(), 1);
    assert_eq!(db.read("日本語").unwrap(), 2);
}

proptest! {
    #[test]
    fn prop_duplicate_delivery_is_harmless(candidates in prop::collection::vec(any::<i64>(), 0..40)) {
        let once = create_db();
        let twice = create_db();
        for &c in &candidates {
            once.apply_update("k", c).unwrap();
            twice.apply_update("k", c).unwrap();
            twice.apply_update("k", c).unwrap();
        }
        if !candidates.is_empty() {
            prop_assert_eq!(once.read("k").unwrap(), twice.read("k").unwrap());
        }
    }

    #[test]
    fn prop_reversed_order_same_result(candidates in prop::collection::vec(-1000i64..1000, 1..40)) {
        let forward = create_db();
        let backward = create_db();
        for &c in &candidates {
            forward.apply_update("k", c).unwrap();
        }
        for &c in candidates.iter().rev() {
            backward.apply_update("k", c).unwrap();
        }
        let expected = candidates.iter().copied().fold(0, i64::max);
        prop_assert_eq!(forward.read("k").unwrap(), expected);
        prop_assert_eq!(backward.read("k").unwrap(), expected);
    }

    #[test]
    fn prop_value_never_decreases(candidates in prop::collection::vec(any::<i64>(), 1..40)) {
        let db = create_db();
        db.initialize("k").unwrap();
        let mut previous = db.read("k").unwrap();
        for &c in &candidates {
            let now = db.apply_update("k", c).unwrap();
            prop_assert!(now >= previous);
            previous = now;
        }
    }
}
