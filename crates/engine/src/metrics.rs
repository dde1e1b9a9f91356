//! Channel-level metrics
//!
//! Atomic counters for the dispatch core. All operations use relaxed
//! ordering; the values are eventually consistent, not real-time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics for one channel engine
///
/// # Thread Safety
///
/// All methods are safe to call from any worker concurrently; reads may
/// observe slightly stale values.
#[derive(Debug, Default)]
pub struct ChannelMetrics {
    /// Payloads received across all input connections
    payloads_received: AtomicU64,

    /// Bytes received across all input connections
    bytes_received: AtomicU64,

    /// Payload enqueues onto output buffers (one per mapped output)
    payloads_dispatched: AtomicU64,

    /// Payloads dropped on a full output buffer
    payloads_dropped: AtomicU64,

    /// Transmit completions that succeeded
    payloads_transmitted: AtomicU64,

    /// Overflow episodes across all output buffers
    overflow_episodes: AtomicU64,

    /// Failed connect/accept attempts
    connect_failures: AtomicU64,
}

impl ChannelMetrics {
    /// Create a metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            payloads_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            payloads_dispatched: AtomicU64::new(0),
            payloads_dropped: AtomicU64::new(0),
            payloads_transmitted: AtomicU64::new(0),
            overflow_episodes: AtomicU64::new(0),
            connect_failures: AtomicU64::new(0),
        }
    }

    /// Record a payload received on an input
    #[inline]
    pub fn record_received(&self, bytes: u64) {
        self.payloads_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record one enqueue onto an output buffer
    #[inline]
    pub fn record_dispatched(&self) {
        self.payloads_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a payload dropped on a full output buffer
    #[inline]
    pub fn record_dropped(&self) {
        self.payloads_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful transmit completion
    #[inline]
    pub fn record_transmitted(&self) {
        self.payloads_transmitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the start of an overflow episode
    #[inline]
    pub fn record_overflow_episode(&self) {
        self.overflow_episodes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed connect or accept attempt
    #[inline]
    pub fn record_connect_failure(&self) {
        self.connect_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time copy of all counters
    pub fn snapshot(&self) -> ChannelSnapshot {
        ChannelSnapshot {
            payloads_received: self.payloads_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            payloads_dispatched: self.payloads_dispatched.load(Ordering::Relaxed),
            payloads_dropped: self.payloads_dropped.load(Ordering::Relaxed),
            payloads_transmitted: self.payloads_transmitted.load(Ordering::Relaxed),
            overflow_episodes: self.overflow_episodes.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of channel metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelSnapshot {
    /// Payloads received across all inputs
    pub payloads_received: u64,
    /// Bytes received across all inputs
    pub bytes_received: u64,
    /// Enqueues onto output buffers
    pub payloads_dispatched: u64,
    /// Overflow drops
    pub payloads_dropped: u64,
    /// Successful transmits
    pub payloads_transmitted: u64,
    /// Overflow episodes
    pub overflow_episodes: u64,
    /// Failed connect/accept attempts
    pub connect_failures: u64,
}

/// Handle for reading channel metrics externally
///
/// Remains valid after `start` consumes the engine's runtime; clone it
/// before starting and poll `snapshot` from reporting code.
#[derive(Debug, Clone)]
pub struct ChannelMetricsHandle {
    metrics: Arc<ChannelMetrics>,
}

impl ChannelMetricsHandle {
    pub(crate) fn new(metrics: Arc<ChannelMetrics>) -> Self {
        Self { metrics }
    }

    /// Get a point-in-time copy of all counters
    pub fn snapshot(&self) -> ChannelSnapshot {
        self.metrics.snapshot()
    }
}
