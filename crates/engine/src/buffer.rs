//! Bounded payload queue with overflow latching
//!
//! Every output connection owns one `PayloadBuffer`. Producers (input
//! dispatch) enqueue without blocking and drop on overflow; the single
//! write loop per connection consumes front-to-back. A latching overflow
//! flag with a low watermark keeps overflow observable without log spam:
//! at most one "buffer full" notice per overflow episode.

use std::collections::VecDeque;

use parking_lot::Mutex;
use sluice_payload::Payload;
use tokio::sync::Notify;

/// Share of the capacity below which an overflow episode ends
const LOW_WATERMARK_RATIO: f64 = 0.8;

/// Bounded FIFO of payload handles
///
/// # Design
///
/// - Capacity is fixed at construction; `enqueue` returns false on a full
///   queue and never blocks a producer
/// - All mutating operations serialize on one internal mutex; safe for a
///   concurrent producer/consumer pair
/// - Stores handles, not bytes - enqueue and dequeue are O(1), and the
///   same payload may sit in several buffers at once
/// - `ready()` lets the consumer suspend until the queue is non-empty;
///   producers signal on enqueue, and registration happens before the
///   emptiness check so wakeups are never lost
#[derive(Debug)]
pub struct PayloadBuffer {
    inner: Mutex<Inner>,
    capacity: usize,
    low_watermark: usize,
    not_empty: Notify,
}

#[derive(Debug)]
struct Inner {
    queue: VecDeque<Payload>,
    latched: bool,
}

impl PayloadBuffer {
    /// Create a buffer with the given capacity (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::with_capacity(capacity),
                latched: false,
            }),
            capacity,
            low_watermark: (capacity as f64 * LOW_WATERMARK_RATIO) as usize,
            not_empty: Notify::new(),
        }
    }

    /// Append a payload; returns false and leaves state unchanged when full
    pub fn enqueue(&self, payload: Payload) -> bool {
        {
            let mut inner = self.inner.lock();
            if inner.queue.len() == self.capacity {
                return false;
            }
            inner.queue.push_back(payload);
        }
        self.not_empty.notify_one();
        true
    }

    /// Get the oldest payload without removing it
    pub fn front(&self) -> Option<Payload> {
        self.inner.lock().queue.front().cloned()
    }

    /// Remove the oldest payload; no-op on an empty queue
    pub fn pop_front(&self) {
        self.inner.lock().queue.pop_front();
    }

    /// Empty the queue
    pub fn clear(&self) {
        self.inner.lock().queue.clear();
    }

    /// Get the current occupancy
    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    /// Check whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().queue.is_empty()
    }

    /// Check whether the queue is at capacity
    pub fn is_full(&self) -> bool {
        let inner = self.inner.lock();
        inner.queue.len() == self.capacity
    }

    /// Get the fixed capacity
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Update the overflow latch against the current occupancy
    ///
    /// Returns true exactly when the buffer enters a new overflow episode
    /// (full and not already latched) - the caller logs one warning per
    /// episode. The latch releases once occupancy is at or below the low
    /// watermark (`⌊0.8 · capacity⌋`), arming the next episode.
    pub fn note_occupancy(&self) -> bool {
        let mut inner = self.inner.lock();
        let occupancy = inner.queue.len();

        let mut new_episode = false;
        if occupancy == self.capacity && !inner.latched {
            inner.latched = true;
            new_episode = true;
        }

        if inner.latched && occupancy <= self.low_watermark {
            inner.latched = false;
        }

        new_episode
    }

    /// Check whether an overflow episode is in progress
    pub fn is_latched(&self) -> bool {
        self.inner.lock().latched
    }

    /// Wait until the queue is non-empty
    ///
    /// Intended for the single consumer. Returns immediately when
    /// payloads are already queued.
    pub async fn ready(&self) {
        loop {
            let notified = self.not_empty.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if !self.is_empty() {
                return;
            }

            notified.await;
        }
    }
}

#[cfg(test)]
#[path = "buffer_test.rs"]
mod buffer_test;
