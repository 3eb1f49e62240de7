//! Countdown latch for exact-unit run termination.
//!
//! The scheduler knows the total number of stage executions in advance
//! (`images x pipeline length`), so the run ends after exactly that many
//! units rather than when the queue looks empty — an empty-queue check
//! would race with items in flight between a pop and the matching push.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared countdown of outstanding stage executions.
pub struct CountdownLatch {
    remaining: AtomicUsize,
}

impl CountdownLatch {
    /// Create a latch armed with `total` units.
    pub fn new(total: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(total),
        }
    }

    /// Subtract `units` and return the remaining count.
    ///
    /// Saturates at zero so a structural miscount cannot wrap; the
    /// scheduler's post-run drain check catches the discrepancy instead.
    pub fn count_down(&self, units: usize) -> usize {
        let mut current = self.remaining.load(Ordering::Acquire);
        loop {
            let next = current.saturating_sub(units);
            match self.remaining.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(observed) => current = observed,
            }
        }
    }

    /// Units still outstanding.
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_count_down_reaches_zero() {
        let latch = CountdownLatch::new(3);
        assert_eq!(latch.count_down(1), 2);
        assert_eq!(latch.count_down(1), 1);
        assert_eq!(latch.count_down(1), 0);
        assert_eq!(latch.remaining(), 0);
    }

    #[test]
    fn test_count_down_forfeited_units() {
        // A failed item at stage 1 of 4 forfeits its 3 outstanding units
        let latch = CountdownLatch::new(8);
        assert_eq!(latch.count_down(4), 4);
        assert_eq!(latch.count_down(1), 3);
    }

    #[test]
    fn test_count_down_saturates() {
        let latch = CountdownLatch::new(2);
        assert_eq!(latch.count_down(5), 0);
        assert_eq!(latch.count_down(1), 0);
    }

    #[tokio::test]
    async fn test_concurrent_count_down_is_exact() {
        let latch = Arc::new(CountdownLatch::new(1000));
        let mut handles = Vec::new();
        for _ in 0..10 {
            let latch = Arc::clone(&latch);
            handles.push(tokio::spawn(async move {
                let mut zero_hits = 0;
                for _ in 0..100 {
                    if latch.count_down(1) == 0 {
                        zero_hits += 1;
                    }
                }
                zero_hits
            }));
        }
        let mut total_zero_hits = 0;
        for handle in handles {
            total_zero_hits += handle.await.unwrap();
        }
        // Exactly one count_down observes the transition to zero
        assert_eq!(total_zero_hits, 1);
        assert_eq!(latch.remaining(), 0);
    }
}
