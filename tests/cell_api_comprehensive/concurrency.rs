//! Concurrency Tests
//!
//! Many threads delivering candidates to the same keys, in arbitrary
//! interleavings, must converge on the maximum.

use crate::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Barrier;
use std::thread;

#[test]
fn test_two_concurrent_updates_keep_larger() {
    for _ in 0..50 {
        let db = Arc::new(create_db());
        db.initialize("a").unwrap();
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [10i64, 7]
            .into_iter()
            .map(|candidate| {
                let db = Arc::clone(&db);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    db.apply_update("a", candidate).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(db.read("a").unwrap(), 10);
    }
}

#[test]
fn test_many_threads_converge_to_max() {
    const THREADS: usize = 8;
    const PER_THREAD: i64 = 500;

    let db = Arc::new(create_db());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let db = Arc::clone(&db);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut candidates: Vec<i64> =
                    (0..PER_THREAD).map(|i| i * THREADS as i64 + t as i64).collect();
                candidates.shuffle(&mut StdRng::seed_from_u64(t as u64));
                barrier.wait();
                let mut last_seen = i64::MIN;
                for c in candidates {
                    let now = db.apply_update("shared", c).unwrap();
                    // Never observe the value going down
                    assert!(now >= last_seen);
                    assert!(now >= c);
                    last_seen = now;
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let expected = (PER_THREAD - 1) * THREADS as i64 + (THREADS as i64 - 1);
    assert_eq!(db.read("shared").unwrap(), expected);
}

#[test]
fn test_concurrent_initialize_creates_once() {
    let (db, observer) = create_observed_db();
    let db = Arc::new(db);
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let db = Arc::clone(&db);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                db.initialize("once").unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let created = observer
        .events()
        .iter()
        .filter(|e| matches!(e, CellEvent::Initialized { created: true, .. }))
        .count();
    assert_eq!(created, 1);
    assert_eq!(db.read("once").unwrap(), 0);
}

#[test]
fn test_concurrent_updates_on_durable_store() {
    let dir = tempfile::tempdir().unwrap();
    let expected;
    {
        let db = Arc::new(
            Highwater::builder()
                .path(dir.path())
                .buffered_with(10, 64)
                .open()
                .unwrap(),
        );
        let handles: Vec<_> = (0..4i64)
            .map(|t| {
                let db = Arc::clone(&db);
                thread::spawn(move || {
                    for i in (0..200i64).rev() {
                        db.apply_update(&format!("k{}", i % 5), i * 4 + t).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        db.flush().unwrap();
        expected = (0..5)
            .map(|k| db.read(&format!("k{}", k)).unwrap())
            .collect::<Vec<_>>();
    }

    let reopened = create_durable_db(dir.path());
    for (k, value) in expected.iter().enumerate() {
        assert_eq!(reopened.read(&format!("k{}", k)).unwrap(), *value);
    }
    // k4 saw i = 199 from thread 3
    assert_eq!(expected[4], 199 * 4 + 3);
}
