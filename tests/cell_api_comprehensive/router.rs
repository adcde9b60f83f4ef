//! Router Tests
//!
//! Routed access through per-key actors shares state with direct access.

use crate::*;
use std::time::Duration;

#[tokio::test]
async fn test_routed_scenarios() {
    let db = create_db();
    let router = db.router(RouterConfig::default());

    router.initialize("a").await.unwrap();
    assert_eq!(router.read("a").await.unwrap(), 0);
    assert_eq!(router.apply_update("a", 5).await.unwrap(), 5);
    assert_eq!(router.apply_update("a", 3).await.unwrap(), 5);

    // Direct and routed access see the same cell
    assert_eq!(db.read("a").unwrap(), 5);
    db.apply_update("a", 11).unwrap();
    assert_eq!(router.read("a").await.unwrap(), 11);

    router.shutdown().await;
}

#[tokio::test]
async fn test_routed_read_of_unknown_key_is_zero() {
    let db = create_db();
    let router = db.router(RouterConfig::default());

    // Activation initializes the cell even under strict reads
    assert_eq!(router.read("unknown").await.unwrap(), 0);
    assert_eq!(db.read("unknown").unwrap(), 0);

    router.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_routed_concurrent_updates_converge() {
    let db = create_db();
    let router = db.router(RouterConfig::default().mailbox_capacity(8));

    let tasks: Vec<_> = [10i64, 7, 3, 9, 10, 1]
        .into_iter()
        .map(|candidate| {
            let router = router.clone();
            tokio::spawn(async move { router.apply_update("a", candidate).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(router.read("a").await.unwrap(), 10);
    router.shutdown().await;
}

#[tokio::test]
async fn test_routed_errors_flatten_into_facade_error() {
    let db = create_db();
    let router = db.router(RouterConfig::default().idle_timeout(Some(Duration::from_millis(10))));

    let value: highwater::Result<i64> = router.apply_update("a", 2).await.map_err(Error::from);
    assert_eq!(value.unwrap(), 2);

    router.shutdown().await;
}

#[tokio::test]
async fn test_durable_routed_updates_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let db = create_durable_db(dir.path());
        let router = db.router(RouterConfig::default());
        for c in [4i64, 2, 8, 8, 6] {
            router.apply_update("r", c).await.unwrap();
        }
        router.shutdown().await;
    }

    let db = create_durable_db(dir.path());
    assert_eq!(db.read("r").unwrap(), 8);
}
