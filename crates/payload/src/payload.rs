//! Payload - shared-ownership handle for one framed media unit
//!
//! A `Payload` is what transports deliver on receive and accept on
//! transmit. It uses `bytes::Bytes` for reference-counted buffer sharing,
//! enabling zero-copy fan-out to multiple output connections.

use bytes::Bytes;

use crate::StreamId;

/// One framed unit of media bytes
///
/// # Design
///
/// - `data` uses `bytes::Bytes`, which is reference-counted
/// - Cloning a `Payload` is O(1) - just increments the reference count
/// - Multiple output buffers can hold the same payload simultaneously
/// - The byte region is released when the last holder drops it
///
/// The engine treats the bytes as opaque; only the stream id participates
/// in routing decisions.
#[derive(Debug, Clone)]
pub struct Payload {
    /// Stream this payload belongs to
    stream_id: StreamId,

    /// Monotonic sequence number assigned by the origin
    sequence: u64,

    /// Opaque byte region - zero-copy via Bytes
    data: Bytes,
}

impl Payload {
    /// Create a payload from its parts
    #[inline]
    pub fn new(stream_id: StreamId, sequence: u64, data: Bytes) -> Self {
        Self {
            stream_id,
            sequence,
            data,
        }
    }

    /// Get the id of the stream this payload belongs to
    #[inline]
    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    /// Get the origin-assigned sequence number
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Get the payload size in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check whether the payload carries no bytes
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the raw byte region
    #[inline]
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(seq: u64) -> Payload {
        Payload::new(StreamId::new(100), seq, Bytes::from_static(b"0123456789"))
    }

    #[test]
    fn test_accessors() {
        let p = payload(7);
        assert_eq!(p.stream_id(), StreamId::new(100));
        assert_eq!(p.sequence(), 7);
        assert_eq!(p.len(), 10);
        assert!(!p.is_empty());
    }

    #[test]
    fn test_clone_shares_bytes() {
        let p = payload(1);
        let q = p.clone();

        // Both handles see the same underlying region
        assert_eq!(p.data().as_ptr(), q.data().as_ptr());
        assert_eq!(q.len(), p.len());
    }

    #[test]
    fn test_empty_payload() {
        let p = Payload::new(StreamId::new(1), 0, Bytes::new());
        assert_eq!(p.len(), 0);
        assert!(p.is_empty());
    }
}
