//! Payload buffer tests
//!
//! Covers the bounded FIFO contracts, the overflow latch with its low
//! watermark, and the consumer-side readiness notification.

use bytes::Bytes;
use sluice_payload::{Payload, StreamId};

use super::*;

fn payload(seq: u64) -> Payload {
    Payload::new(StreamId::new(100), seq, Bytes::from_static(b"payload"))
}

#[test]
fn test_new_buffer_is_empty() {
    let buffer = PayloadBuffer::new(4);
    assert!(buffer.is_empty());
    assert!(!buffer.is_full());
    assert_eq!(buffer.len(), 0);
    assert_eq!(buffer.capacity(), 4);
}

#[test]
fn test_zero_capacity_is_clamped() {
    let buffer = PayloadBuffer::new(0);
    assert_eq!(buffer.capacity(), 1);
    assert!(buffer.enqueue(payload(1)));
    assert!(!buffer.enqueue(payload(2)));
}

#[test]
fn test_enqueue_until_full() {
    let buffer = PayloadBuffer::new(2);

    assert!(buffer.enqueue(payload(1)));
    assert!(buffer.enqueue(payload(2)));
    assert!(buffer.is_full());

    // Full queue rejects and is left unchanged
    assert!(!buffer.enqueue(payload(3)));
    assert_eq!(buffer.len(), 2);
    assert_eq!(buffer.front().unwrap().sequence(), 1);
}

#[test]
fn test_fifo_order() {
    let buffer = PayloadBuffer::new(4);
    for seq in 1..=3 {
        buffer.enqueue(payload(seq));
    }

    for expected in 1..=3 {
        assert_eq!(buffer.front().unwrap().sequence(), expected);
        buffer.pop_front();
    }
    assert!(buffer.is_empty());
}

#[test]
fn test_front_does_not_remove() {
    let buffer = PayloadBuffer::new(2);
    buffer.enqueue(payload(1));

    assert_eq!(buffer.front().unwrap().sequence(), 1);
    assert_eq!(buffer.front().unwrap().sequence(), 1);
    assert_eq!(buffer.len(), 1);
}

#[test]
fn test_pop_front_on_empty_is_noop() {
    let buffer = PayloadBuffer::new(2);
    buffer.pop_front();
    assert!(buffer.is_empty());
}

#[test]
fn test_clear() {
    let buffer = PayloadBuffer::new(4);
    for seq in 1..=4 {
        buffer.enqueue(payload(seq));
    }

    buffer.clear();
    assert!(buffer.is_empty());
    assert!(buffer.front().is_none());

    // Cleared buffer accepts new payloads
    assert!(buffer.enqueue(payload(5)));
}

#[test]
fn test_overflow_latch_one_episode() {
    let buffer = PayloadBuffer::new(2);
    buffer.enqueue(payload(1));
    buffer.enqueue(payload(2));

    // First consultation of a full buffer starts the episode
    assert!(buffer.note_occupancy());
    assert!(buffer.is_latched());

    // Further consultations while latched stay silent
    assert!(!buffer.note_occupancy());
    assert!(!buffer.note_occupancy());
}

#[test]
fn test_latch_releases_below_watermark() {
    // Capacity 2 -> low watermark 1
    let buffer = PayloadBuffer::new(2);
    buffer.enqueue(payload(1));
    buffer.enqueue(payload(2));
    assert!(buffer.note_occupancy());

    // Draining to the watermark releases the latch
    buffer.pop_front();
    assert!(!buffer.note_occupancy());
    assert!(!buffer.is_latched());

    // A new fill starts a fresh episode
    buffer.enqueue(payload(3));
    assert!(buffer.note_occupancy());
}

#[test]
fn test_latch_holds_above_watermark() {
    // Capacity 10 -> low watermark 8
    let buffer = PayloadBuffer::new(10);
    for seq in 0..10 {
        buffer.enqueue(payload(seq));
    }
    assert!(buffer.note_occupancy());

    // Occupancy 9 is above the watermark; the episode continues
    buffer.pop_front();
    assert!(!buffer.note_occupancy());
    assert!(buffer.is_latched());

    // Occupancy 8 reaches the watermark; the episode ends
    buffer.pop_front();
    assert!(!buffer.note_occupancy());
    assert!(!buffer.is_latched());
}

#[tokio::test]
async fn test_ready_returns_immediately_when_queued() {
    let buffer = PayloadBuffer::new(2);
    buffer.enqueue(payload(1));
    buffer.ready().await;
    assert_eq!(buffer.front().unwrap().sequence(), 1);
}

#[tokio::test]
async fn test_ready_wakes_on_enqueue() {
    use std::sync::Arc;
    use std::time::Duration;

    let buffer = Arc::new(PayloadBuffer::new(2));

    let consumer = {
        let buffer = Arc::clone(&buffer);
        tokio::spawn(async move {
            buffer.ready().await;
            buffer.front().unwrap().sequence()
        })
    };

    // Give the consumer a chance to park before producing
    tokio::time::sleep(Duration::from_millis(10)).await;
    buffer.enqueue(payload(42));

    let sequence = tokio::time::timeout(Duration::from_secs(1), consumer)
        .await
        .expect("consumer timed out")
        .expect("consumer panicked");
    assert_eq!(sequence, 42);
}

#[test]
fn test_concurrent_producer_consumer() {
    use std::sync::Arc;
    use std::thread;

    let buffer = Arc::new(PayloadBuffer::new(8));
    let total = 1000u64;

    let producer = {
        let buffer = Arc::clone(&buffer);
        thread::spawn(move || {
            let mut seq = 0;
            while seq < total {
                if buffer.enqueue(payload(seq)) {
                    seq += 1;
                } else {
                    thread::yield_now();
                }
            }
        })
    };

    let consumer = {
        let buffer = Arc::clone(&buffer);
        thread::spawn(move || {
            let mut received = Vec::with_capacity(total as usize);
            while received.len() < total as usize {
                match buffer.front() {
                    Some(p) => {
                        buffer.pop_front();
                        received.push(p.sequence());
                    }
                    None => thread::yield_now(),
                }
            }
            received
        })
    };

    producer.join().unwrap();
    let received = consumer.join().unwrap();

    // FIFO order survives the concurrent handoff
    let expected: Vec<u64> = (0..total).collect();
    assert_eq!(received, expected);
}
