//! Request governance: a global concurrency ceiling plus per-source pacing.
//!
//! The slot is claimed first and pacing is applied while holding it,
//! so spacing is measured against the moments calls can actually
//! start. Pacing before the slot would let grants queue up behind a
//! saturated ceiling and then fire back to back once slots free. Both
//! waits are timer-based, never spins.

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Shared governor for all source fetches of one engine.
#[derive(Clone)]
pub struct Governor {
    slots: Arc<Semaphore>,
    /// Keyed GCRA limiter, one lane per source id. `None` when spacing
    /// is zero.
    pacer: Option<Arc<DefaultKeyedRateLimiter<String>>>,
}

/// An in-flight fetch slot. The slot is returned to the governor when
/// the permit drops, on every exit path including task abort.
pub struct Permit {
    _slot: OwnedSemaphorePermit,
}

impl Governor {
    /// Builds a governor allowing `max_in_flight` concurrent fetches and
    /// at most one request per `spacing` per source.
    pub fn new(max_in_flight: usize, spacing: Duration) -> Self {
        let pacer = Quota::with_period(spacing)
            .map(|quota| Arc::new(RateLimiter::keyed(quota)));
        Self {
            slots: Arc::new(Semaphore::new(max_in_flight)),
            pacer,
        }
    }

    /// Claims a slot, then waits until this source may issue a request.
    pub async fn acquire(&self, source_id: &str) -> Permit {
        let slot = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .expect("governor semaphore is never closed");
        if let Some(pacer) = &self.pacer {
            pacer.until_key_ready(&source_id.to_string()).await;
        }
        Permit { _slot: slot }
    }

    /// Slots currently available, for tests and diagnostics.
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn permit_drop_releases_slot() {
        let governor = Governor::new(2, Duration::ZERO);
        let a = governor.acquire("shop-a").await;
        let b = governor.acquire("shop-b").await;
        assert_eq!(governor.available_slots(), 0);
        drop(a);
        assert_eq!(governor.available_slots(), 1);
        drop(b);
        assert_eq!(governor.available_slots(), 2);
    }

    #[tokio::test]
    async fn ceiling_blocks_excess_acquisitions() {
        let governor = Governor::new(1, Duration::ZERO);
        let held = governor.acquire("shop-a").await;

        let waiter = {
            let governor = governor.clone();
            tokio::spawn(async move {
                let _permit = governor.acquire("shop-b").await;
            })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(held);
        waiter.await.expect("waiter completes once a slot frees");
    }

    #[tokio::test]
    async fn same_source_requests_are_spaced() {
        let governor = Governor::new(4, Duration::from_millis(200));
        let start = Instant::now();
        drop(governor.acquire("shop-a").await);
        drop(governor.acquire("shop-a").await);
        assert!(start.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn distinct_sources_are_not_spaced_against_each_other() {
        let governor = Governor::new(4, Duration::from_millis(200));
        let start = Instant::now();
        drop(governor.acquire("shop-a").await);
        drop(governor.acquire("shop-b").await);
        assert!(start.elapsed() < Duration::from_millis(150));
    }

    #[tokio::test]
    async fn spacing_holds_across_a_saturated_ceiling() {
        // Two same-source acquisitions queued behind a busy ceiling
        // must still come out spaced once slots free.
        let governor = Governor::new(1, Duration::from_millis(100));
        let blocker = governor.acquire("other-shop").await;

        let waiters: Vec<_> = (0..2)
            .map(|_| {
                let governor = governor.clone();
                tokio::spawn(async move {
                    let permit = governor.acquire("shop-a").await;
                    let granted_at = Instant::now();
                    drop(permit);
                    granted_at
                })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(150)).await;
        drop(blocker);

        let mut grants = Vec::new();
        for waiter in waiters {
            grants.push(waiter.await.expect("waiter completes"));
        }
        grants.sort();
        let gap = grants[1].duration_since(grants[0]);
        assert!(gap >= Duration::from_millis(60), "gap was {gap:?}");
    }

    #[tokio::test]
    async fn zero_spacing_disables_pacing() {
        let governor = Governor::new(4, Duration::ZERO);
        let start = Instant::now();
        for _ in 0..5 {
            drop(governor.acquire("shop-a").await);
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
