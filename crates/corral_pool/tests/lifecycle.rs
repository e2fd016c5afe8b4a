//! Initialization, process-wide cell, status and cleanup.


use core::time::Duration;
use corral_pool::{
    MAX_LIMIT, PoolCell, PoolError, PoolSettings, ResourcePool, SourceError, StaticSource,
};
use std::sync::Arc;
use test_utils::{TestFactory, TestPool, broken, config, limited, pool_with, pool_with_settings};

// ═══════════════════════════════════════════════════════════════════════════════
// INITIALIZATION
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn initialize_builds_one_slot_per_active_config() {
    let (pool, _source) = pool_with(vec![config("a", "v1"), config("b", "v1")]).await;

    assert_eq!(pool.keys(), vec!["a", "b"]);
    assert_eq!(pool.factory().builds(), 2);
    assert_eq!(pool.checkout("a").await.unwrap().handle().key, "a");
}

#[tokio::test]
async fn initialize_skips_configs_the_factory_rejects() {
    let (pool, _source) = pool_with(vec![
        config("good", "v1"),
        broken("bad", "v1"),
        limited("zero", "v1", 0),
    ])
    .await;

    assert_eq!(pool.keys(), vec!["good"]);
    assert!(matches!(
        pool.checkout("bad").await,
        Err(PoolError::ResourceNotFound(key)) if key == "bad"
    ));
}

#[tokio::test]
async fn initialize_skips_configs_with_oversized_limits() {
    let (pool, _source) = pool_with(vec![
        config("ok", "v1"),
        limited("huge", "v1", usize::MAX / 4),
        limited("wide", "v1", MAX_LIMIT.saturating_add(10)),
    ])
    .await;

    assert_eq!(pool.keys(), vec!["ok"]);
    assert_eq!(pool.factory().builds(), 1);
}

#[tokio::test]
async fn limit_at_the_maximum_is_accepted() {
    let (pool, _source) = pool_with(vec![limited("max", "v1", MAX_LIMIT)]).await;

    assert_eq!(test_utils::available(&pool, "max"), MAX_LIMIT);
}

#[tokio::test]
async fn initialize_fails_when_source_is_unavailable() {
    let source = Arc::new(StaticSource::new(vec![config("a", "v1")]));
    source.set_available(false);

    let result =
        ResourcePool::initialize(TestFactory::new(), source, PoolSettings::default()).await;

    assert!(matches!(
        result,
        Err(PoolError::Initialization(SourceError::Unavailable(_)))
    ));
}

#[tokio::test]
async fn load_is_idempotent() {
    let (pool, _source) = pool_with(vec![config("a", "v1")]).await;

    assert_eq!(pool.load().await.unwrap(), 0);
    assert_eq!(pool.factory().builds(), 1);
}

#[tokio::test]
async fn default_concurrency_comes_from_settings() {
    let settings = PoolSettings::default().with_default_concurrency(7);
    let (pool, _source) =
        pool_with_settings(vec![config("a", "v1"), limited("b", "v1", 2)], settings).await;

    let status = pool.status();
    assert_eq!(status[0].concurrency_limit, 7);
    assert_eq!(status[1].concurrency_limit, 2);
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATUS
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn status_reports_permits_and_config_summary() {
    let (pool, _source) = pool_with(vec![config("m1", "v1")]).await;
    let _held = pool.checkout("m1").await.unwrap();

    let status = pool.status_of("m1").unwrap();
    assert_eq!(status.concurrency_limit, 3);
    assert_eq!(status.available_permits, 2);
    assert_eq!(status.in_use, 1);
    assert_eq!(status.config.name, "m1");
    assert_eq!(status.config.provider, "test");
    assert_eq!(status.config.fingerprint, "v1");

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["available_permits"], 2);
    assert_eq!(json["config"]["fingerprint"], "v1");
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLEANUP
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn cleanup_tears_down_every_handle_and_closes_the_pool() {
    let (pool, _source) = pool_with(vec![config("a", "v1"), config("b", "v1")]).await;

    pool.cleanup().await;

    assert!(pool.is_empty());
    assert!(pool.is_closed());
    let mut torn_down = pool.factory().torn_down();
    torn_down.sort_unstable();
    assert_eq!(torn_down, vec![0, 1]);
    assert!(matches!(
        pool.checkout("a").await,
        Err(PoolError::NotInitialized)
    ));
    assert!(matches!(
        pool.refresh_all().await,
        Err(PoolError::NotInitialized)
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cleanup_waits_for_in_flight_checkouts() {
    let (pool, _source) = pool_with(vec![config("a", "v1")]).await;
    let held = pool.checkout("a").await.unwrap();

    let cleanup = {
        let pool = Arc::clone(&pool);
        tokio::spawn(async move { pool.cleanup().await })
    };
    test_utils::settle().await;
    assert!(!cleanup.is_finished());
    assert!(pool.factory().torn_down().is_empty());

    drop(held);
    cleanup.await.unwrap();
    assert_eq!(pool.factory().torn_down(), vec![0]);
}

#[tokio::test(start_paused = true)]
async fn cleanup_during_a_slow_build_tears_the_late_handle_down() {
    let source = Arc::new(StaticSource::new(vec![config("a", "v1")]));
    let factory = TestFactory::new().with_build_delay(Duration::from_millis(100));
    let pool = ResourcePool::initialize(factory, source.clone(), PoolSettings::default())
        .await
        .unwrap();

    source.upsert(config("late", "v1"));
    let refresh = {
        let pool = Arc::clone(&pool);
        tokio::spawn(async move { pool.refresh_one("late").await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    pool.cleanup().await;
    let result = refresh.await.unwrap();

    assert!(matches!(result, Err(PoolError::NotInitialized)));
    assert!(pool.is_empty());
    assert!(!pool.contains("late"));
    assert_eq!(pool.factory().torn_down(), vec![0, 1]);
}

#[tokio::test(start_paused = true)]
async fn cleanup_during_load_stops_the_load() {
    let source = Arc::new(StaticSource::new(vec![config("a", "v1"), config("b", "v1")]));
    let factory = TestFactory::new().with_build_delay(Duration::from_millis(100));
    let pool = Arc::new(ResourcePool::new(factory, source, PoolSettings::default()));

    let load = {
        let pool = Arc::clone(&pool);
        tokio::spawn(async move { pool.load().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    pool.cleanup().await;

    assert!(matches!(load.await.unwrap(), Err(PoolError::NotInitialized)));
    assert!(pool.is_empty());
    assert_eq!(pool.factory().builds(), 1);
    assert_eq!(pool.factory().torn_down(), vec![0]);
}

// ═══════════════════════════════════════════════════════════════════════════════
// POOL CELL
// ═══════════════════════════════════════════════════════════════════════════════

static CELL: PoolCell<TestFactory> = PoolCell::new();

#[tokio::test]
async fn cell_lifecycle() {
    assert!(matches!(CELL.get(), Err(PoolError::NotInitialized)));

    let source = Arc::new(StaticSource::new(vec![config("a", "v1")]));
    let first = CELL
        .initialize(|| {
            ResourcePool::initialize(TestFactory::new(), source.clone(), PoolSettings::default())
        })
        .await
        .unwrap();

    // A second initialize returns the same pool without running `make`.
    let second = CELL
        .initialize(|| async { Err::<Arc<TestPool>, _>(PoolError::Cancelled) })
        .await
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &CELL.get().unwrap()));

    CELL.cleanup().await;
    assert!(!CELL.is_initialized());
    assert!(first.is_closed());
    assert!(matches!(CELL.get(), Err(PoolError::NotInitialized)));

    // A fresh initialize after cleanup starts over.
    let third = CELL
        .initialize(|| {
            ResourcePool::initialize(TestFactory::new(), source.clone(), PoolSettings::default())
        })
        .await
        .unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(third.keys(), vec!["a"]);
    CELL.cleanup().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cell_initialize_builds_once() {
    let cell: Arc<PoolCell<TestFactory>> = Arc::new(PoolCell::new());
    let source = Arc::new(StaticSource::new(vec![config("a", "v1")]));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let cell = Arc::clone(&cell);
            let source = source.clone();
            tokio::spawn(async move {
                cell.initialize(|| {
                    ResourcePool::initialize(TestFactory::new(), source, PoolSettings::default())
                })
                .await
                .unwrap()
            })
        })
        .collect();

    let pools = futures::future::join_all(tasks).await;
    let first = pools[0].as_ref().unwrap();
    for pool in &pools {
        assert!(Arc::ptr_eq(first, pool.as_ref().unwrap()));
    }
    assert_eq!(first.factory().builds(), 1);
}

#[tokio::test]
async fn cell_initialize_failure_leaves_cell_empty() {
    let cell = PoolCell::<TestFactory>::new();
    let source = Arc::new(StaticSource::new(vec![config("a", "v1")]));
    source.set_available(false);

    let result = cell
        .initialize(|| {
            ResourcePool::initialize(TestFactory::new(), source.clone(), PoolSettings::default())
        })
        .await;

    assert!(result.is_err());
    assert!(!cell.is_initialized());
}
