//! Live session accounting.
//!
//! Sessions never read these counters; they only back `/health`, the
//! connection limit, and the shutdown drain.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Counts live and total sessions.
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    active: AtomicUsize,
    total: AtomicU64,
    idle: Notify,
}

impl ConnectionTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a slot if fewer than `limit` sessions are live.
    ///
    /// The slot is released when the returned guard is dropped.
    pub fn try_acquire(self: &Arc<Self>, limit: usize) -> Option<ConnectionGuard> {
        self.active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < limit).then_some(n + 1)
            })
            .ok()?;
        let _ = self.total.fetch_add(1, Ordering::Relaxed);
        Some(ConnectionGuard {
            tracker: Arc::clone(self),
        })
    }

    /// Live sessions.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Sessions accepted since start.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Resolve once no session holds a slot.
    pub async fn drained(&self) {
        loop {
            let idle = self.idle.notified();
            if self.active() == 0 {
                return;
            }
            idle.await;
        }
    }
}

/// Holds one slot in a [`ConnectionTracker`].
#[derive(Debug)]
pub struct ConnectionGuard {
    tracker: Arc<ConnectionTracker>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if self.tracker.active.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.tracker.idle.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_and_release() {
        let tracker = Arc::new(ConnectionTracker::new());
        assert_eq!(tracker.active(), 0);

        let g1 = tracker.try_acquire(10).unwrap();
        let g2 = tracker.try_acquire(10).unwrap();
        assert_eq!(tracker.active(), 2);

        drop(g1);
        assert_eq!(tracker.active(), 1);
        drop(g2);
        assert_eq!(tracker.active(), 0);
        assert_eq!(tracker.total(), 2);
    }

    #[test]
    fn limit_is_enforced() {
        let tracker = Arc::new(ConnectionTracker::new());
        let _g = tracker.try_acquire(1).unwrap();
        assert!(tracker.try_acquire(1).is_none());
        assert_eq!(tracker.active(), 1);
        assert_eq!(tracker.total(), 1);
    }

    #[test]
    fn slot_is_reusable_after_release() {
        let tracker = Arc::new(ConnectionTracker::new());
        let g = tracker.try_acquire(1).unwrap();
        drop(g);
        assert!(tracker.try_acquire(1).is_some());
    }

    #[test]
    fn zero_limit_refuses_everything() {
        let tracker = Arc::new(ConnectionTracker::new());
        assert!(tracker.try_acquire(0).is_none());
        assert_eq!(tracker.total(), 0);
    }

    #[tokio::test]
    async fn drained_resolves_when_last_guard_drops() {
        let tracker = Arc::new(ConnectionTracker::new());
        tracker.drained().await;

        let g1 = tracker.try_acquire(10).unwrap();
        let g2 = tracker.try_acquire(10).unwrap();
        let waiter = {
            let tracker = Arc::clone(&tracker);
            tokio::spawn(async move { tracker.drained().await })
        };

        drop(g1);
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(g2);
        tokio::time::timeout(std::time::Duration::from_secs(5), waiter)
            .await
            .expect("drain never resolved")
            .unwrap();
    }
}
