//! Stream identifier type
//!
//! `StreamId` is a lightweight, Copy identifier for logical media streams.

use std::fmt;

use serde::Deserialize;

/// Identifier of a logical media stream within a channel
///
/// Every payload carries the id of the stream it belongs to; the routing
/// map relates stream ids to connection names. Designed to be `Copy` and
/// fit in a register.
///
/// # Example
///
/// ```
/// use sluice_payload::StreamId;
///
/// let id = StreamId::new(100);
/// let copy = id; // Copy, not move
/// assert_eq!(id, copy);
/// assert_eq!(id.value(), 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct StreamId(u16);

impl StreamId {
    /// Create a stream id from its numeric value
    #[inline]
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Get the numeric value of this stream id
    #[inline]
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Get the value as usize (for array indexing)
    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for StreamId {
    #[inline]
    fn from(value: u16) -> Self {
        Self::new(value)
    }
}

impl From<StreamId> for u16 {
    #[inline]
    fn from(id: StreamId) -> Self {
        id.0
    }
}
