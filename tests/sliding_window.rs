//! End-to-end sliding-window behavior against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use floodgate::clock::ManualClock;
use floodgate::ratelimit::{RateLimitRule, RateLimiter, RequestIdentity};
use floodgate::store::MemoryCounterStore;

fn identity() -> RequestIdentity {
    RequestIdentity::new("203.0.113.9", "/api/orders", "get")
}

/// The worked scenario: limit 5 per 60s, five requests at t=0..4, a sixth
/// at t=5, then traffic into the next window at t=61 and t=90.
#[tokio::test]
async fn five_per_minute_scenario() {
    // Slot-aligned start so the window boundaries land where the walkthrough
    // expects them.
    let clock = Arc::new(ManualClock::at_unix_secs(1_200_000));
    let limiter = RateLimiter::with_clock(MemoryCounterStore::new(), clock.clone());
    let rule = RateLimitRule {
        limit: 5,
        period: 60,
    };

    // t = 0..4: all admitted.
    for tick in 0..5 {
        assert!(
            limiter.process_request(&identity(), &rule).await.unwrap(),
            "request at t={tick} should be admitted"
        );
        clock.advance(Duration::from_secs(1));
    }
    assert_eq!(
        limiter.check_availability(&identity(), &rule).await.unwrap(),
        0
    );

    // t = 5: current slot full, fast reject.
    assert!(!limiter.process_request(&identity(), &rule).await.unwrap());

    // t = 61: new window; previous window's five requests still fill the
    // estimate exactly, but no further.
    clock.advance(Duration::from_secs(56));
    assert!(limiter.process_request(&identity(), &rule).await.unwrap());

    // t = 90: halfway through the window the previous count has partially
    // rolled off.
    clock.advance(Duration::from_secs(29));
    assert!(limiter.process_request(&identity(), &rule).await.unwrap());
}

/// Firing many concurrent requests for one identity admits exactly `limit`
/// of them; the per-bucket write exclusion prevents lost updates.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_requests_never_over_admit() {
    let clock = Arc::new(ManualClock::at_unix_secs(1_000_000));
    let limiter = Arc::new(RateLimiter::with_clock(
        MemoryCounterStore::new(),
        clock,
    ));
    let rule = RateLimitRule {
        limit: 10,
        period: 60,
    };

    let mut handles = Vec::new();
    for _ in 0..32 {
        let limiter = limiter.clone();
        handles.push(tokio::spawn(async move {
            limiter.process_request(&identity(), &rule).await.unwrap()
        }));
    }

    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 10);
}

/// Unrelated identities proceed independently even under concurrency.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_identities_do_not_interfere() {
    let clock = Arc::new(ManualClock::at_unix_secs(1_000_000));
    let limiter = Arc::new(RateLimiter::with_clock(
        MemoryCounterStore::new(),
        clock,
    ));
    let rule = RateLimitRule {
        limit: 3,
        period: 60,
    };

    let mut handles = Vec::new();
    for client in 0..8 {
        let limiter = limiter.clone();
        handles.push(tokio::spawn(async move {
            let identity =
                RequestIdentity::new(format!("198.51.100.{client}"), "/api/orders", "get");
            let mut admitted = 0;
            for _ in 0..5 {
                if limiter.process_request(&identity, &rule).await.unwrap() {
                    admitted += 1;
                }
            }
            admitted
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), 3);
    }
}
