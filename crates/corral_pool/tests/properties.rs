//! Property-based checks on permit accounting.
//!
//! Random schedules of checkouts, cancellations and refreshes run against a
//! single slot with a limit of three, on a paused clock so the schedules are
//! deterministic. The properties:
//!
//! - no more than three checkouts ever hold the handle at once
//! - the slot's available permits stay within `[0, 3]`
//! - once every task finishes, all three permits are free again


use core::sync::atomic::{AtomicUsize, Ordering};
use core::time::Duration;
use corral_pool::CancellationToken;
use std::sync::Arc;
use test_utils::{TestPool, available, config, pool_with};

const LIMIT: usize = 3;

/// One simulated consumer.
#[derive(Debug, Clone)]
struct Client {
    start_ms: u64,
    hold_ms: u64,
    /// Cancel the checkout this many ms after starting, if set.
    cancel_after_ms: Option<u64>,
}

/// One full schedule.
#[derive(Debug, Clone)]
struct Schedule {
    clients: Vec<Client>,
    /// Start a fingerprint-changing refresh at this time, if set.
    refresh_at_ms: Option<u64>,
}

async fn run_client(
    pool: Arc<TestPool>,
    client: Client,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
) {
    tokio::time::sleep(Duration::from_millis(client.start_ms)).await;

    let cancel = CancellationToken::new();
    if let Some(after) = client.cancel_after_ms {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(after)).await;
            cancel.cancel();
        });
    }

    let Ok(checkout) = pool.checkout_with("m1", &cancel).await else {
        return;
    };
    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
    peak.fetch_max(now, Ordering::SeqCst);
    assert!(available(&pool, "m1") <= LIMIT);

    tokio::time::sleep(Duration::from_millis(client.hold_ms)).await;
    active.fetch_sub(1, Ordering::SeqCst);
    drop(checkout);
}

async fn run_schedule(schedule: Schedule) -> (usize, usize) {
    let (pool, source) = pool_with(vec![config("m1", "v1")]).await;
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for client in schedule.clients {
        tasks.push(tokio::spawn(run_client(
            Arc::clone(&pool),
            client,
            Arc::clone(&active),
            Arc::clone(&peak),
        )));
    }
    if let Some(at) = schedule.refresh_at_ms {
        let pool = Arc::clone(&pool);
        tasks.push(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(at)).await;
            source.upsert(config("m1", "v2"));
            pool.refresh_one("m1").await.unwrap();
        }));
    }

    for task in futures::future::join_all(tasks).await {
        task.unwrap();
    }
    (peak.load(Ordering::SeqCst), available(&pool, "m1"))
}

mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_client() -> impl Strategy<Value = Client> {
        (0..20u64, 0..10u64, prop::option::of(0..15u64)).prop_map(
            |(start_ms, hold_ms, cancel_after_ms)| Client {
                start_ms,
                hold_ms,
                cancel_after_ms,
            },
        )
    }

    fn arb_schedule() -> impl Strategy<Value = Schedule> {
        (
            prop::collection::vec(arb_client(), 1..=12usize),
            prop::option::of(0..25u64),
        )
            .prop_map(|(clients, refresh_at_ms)| Schedule {
                clients,
                refresh_at_ms,
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        /// Concurrent holders never exceed the limit and every permit comes back.
        #[test]
        fn prop_permits_stay_bounded_and_return(schedule in arb_schedule()) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .start_paused(true)
                .build()
                .expect("tokio runtime");
            let (peak, settled) = rt.block_on(run_schedule(schedule));

            prop_assert!(peak <= LIMIT, "peak of {} concurrent holders", peak);
            prop_assert_eq!(settled, LIMIT);
        }
    }
}
