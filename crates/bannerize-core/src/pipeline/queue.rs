//! The shared work queue coordinating scheduler and workers.
//!
//! An unbounded FIFO with concurrent push and blocking pop. A tokio
//! semaphore carries one permit per ready item, so `pop` parks without
//! spinning while the queue is transiently empty (items are in flight
//! between one worker's pop and its subsequent push). Closing the queue
//! wakes every blocked pop with `None`.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use tokio::sync::Semaphore;

/// Thread-safe FIFO of work items, bounded only by memory.
pub struct SharedQueue<T> {
    items: Mutex<VecDeque<T>>,
    ready: Semaphore,
}

impl<T> SharedQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            ready: Semaphore::new(0),
        }
    }

    /// Append an item; never blocks on capacity.
    pub fn push(&self, item: T) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(item);
        self.ready.add_permits(1);
    }

    /// Remove and return exactly one item, waiting until one is
    /// available. Returns `None` once the queue has been closed and
    /// drained.
    ///
    /// Two concurrent calls never return the same item: the permit is
    /// acquired before the item exists to the caller, and removal runs
    /// under the lock.
    pub async fn pop(&self) -> Option<T> {
        match self.ready.acquire().await {
            Ok(permit) => {
                permit.forget();
                self.items
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .pop_front()
            }
            // Closed: hand out whatever is still queued, then None.
            Err(_) => self
                .items
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front(),
        }
    }

    /// Close the queue: blocked `pop` calls wake, drain any remaining
    /// items, and then observe `None`.
    pub fn close(&self) {
        self.ready.close();
    }

    /// Number of items currently queued (not counting in-flight items
    /// held by workers).
    pub fn len(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the queue is momentarily empty. Not a termination signal:
    /// an empty queue can still have items in flight.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for SharedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_push_pop_fifo() {
        let queue = SharedQueue::new();
        queue.push(1);
        queue.push(2);
        queue.push(3);

        assert_eq!(queue.pop().await, Some(1));
        assert_eq!(queue.pop().await, Some(2));
        assert_eq!(queue.pop().await, Some(3));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_pop_blocks_until_push() {
        let queue = Arc::new(SharedQueue::new());

        let popper = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop().await })
        };

        tokio::task::yield_now().await;
        queue.push(42);

        assert_eq!(popper.await.unwrap(), Some(42));
    }

    #[tokio::test]
    async fn test_close_wakes_blocked_pop() {
        let queue: Arc<SharedQueue<u32>> = Arc::new(SharedQueue::new());

        let popper = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop().await })
        };

        tokio::task::yield_now().await;
        queue.close();

        assert_eq!(popper.await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_concurrent_pops_never_share_an_item() {
        let queue = Arc::new(SharedQueue::new());
        for i in 0..100 {
            queue.push(i);
        }
        queue.close();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let queue = Arc::clone(&queue);
            handles.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Some(item) = queue.pop().await {
                    seen.push(item);
                }
                seen
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }
}
