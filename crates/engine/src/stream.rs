//! Stream registry entries
//!
//! A `Stream` holds the per-stream traffic counters and the media
//! metadata declared at configuration time. The metadata is passed
//! through to operators and transports untouched - the engine routes on
//! the stream id alone.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;
use sluice_payload::{PayloadKind, StreamId};

/// Speaker layout of an audio stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelGrouping {
    /// Single channel
    Mono,
    /// Left and right
    Stereo,
    /// 5.1 surround
    FivePointOne,
    /// 7.1 surround
    SevenPointOne,
}

impl ChannelGrouping {
    /// Get the snake_case name of this grouping
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mono => "mono",
            Self::Stereo => "stereo",
            Self::FivePointOne => "five_point_one",
            Self::SevenPointOne => "seven_point_one",
        }
    }
}

impl fmt::Display for ChannelGrouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audio sampling rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SampleRate {
    /// 48 kHz
    #[serde(rename = "48000")]
    Hz48000,
    /// 96 kHz
    #[serde(rename = "96000")]
    Hz96000,
}

impl SampleRate {
    /// Get the rate in hertz
    pub fn as_hz(self) -> u32 {
        match self {
            Self::Hz48000 => 48_000,
            Self::Hz96000 => 96_000,
        }
    }
}

impl fmt::Display for SampleRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Hz", self.as_hz())
    }
}

/// Media metadata of a stream, by payload type
///
/// None of these attributes are interpreted by the engine; they travel
/// with the stream for the benefit of endpoints and diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamKind {
    /// Uncompressed video frames
    Video {
        /// Frame width in pixels
        width: u32,
        /// Frame height in pixels
        height: u32,
        /// Bytes per pixel
        bytes_per_pixel: u32,
        /// Frame rate numerator
        rate_numerator: u32,
        /// Frame rate denominator
        rate_denominator: u32,
    },
    /// PCM audio sample groups
    Audio {
        /// Speaker layout
        grouping: ChannelGrouping,
        /// Sampling rate
        sample_rate: SampleRate,
        /// Bytes per sample
        bytes_per_sample: u32,
        /// RFC 5646 language tag
        language: String,
    },
    /// Ancillary data
    Ancillary,
}

impl StreamKind {
    /// Get the payload classification of this kind
    pub fn payload_kind(&self) -> PayloadKind {
        match self {
            Self::Video { .. } => PayloadKind::Video,
            Self::Audio { .. } => PayloadKind::Audio,
            Self::Ancillary => PayloadKind::Ancillary,
        }
    }
}

/// Per-stream traffic counters
///
/// Updated from completion handlers with relaxed ordering; the values are
/// eventually consistent, not real-time. `transmitted` counts transmit
/// *attempts* - it is incremented when a payload is handed to the
/// transport, so its value may momentarily exceed the number of
/// completions, and with several outputs it aggregates across all of
/// them. Tests and operators should lean on per-output observations for
/// exact delivery accounting.
#[derive(Debug, Default)]
pub struct StreamCounters {
    received: AtomicU64,
    transmitted: AtomicU64,
    errors: AtomicU64,
}

impl StreamCounters {
    const fn new() -> Self {
        Self {
            received: AtomicU64::new(0),
            transmitted: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }
}

/// Point-in-time copy of a stream's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    /// Payloads received on the stream's input connection
    pub received: u64,
    /// Transmit attempts across all output connections
    pub transmitted: u64,
    /// Receive failures, transmit failures, and overflow drops
    pub errors: u64,
}

/// A logical media stream registered with a channel
#[derive(Debug)]
pub struct Stream {
    id: StreamId,
    kind: StreamKind,
    counters: StreamCounters,
}

impl Stream {
    /// Create a stream entry
    pub fn new(id: StreamId, kind: StreamKind) -> Self {
        Self {
            id,
            kind,
            counters: StreamCounters::new(),
        }
    }

    /// Get the stream id
    #[inline]
    pub fn id(&self) -> StreamId {
        self.id
    }

    /// Get the media metadata
    #[inline]
    pub fn kind(&self) -> &StreamKind {
        &self.kind
    }

    /// Get the payload classification
    #[inline]
    pub fn payload_kind(&self) -> PayloadKind {
        self.kind.payload_kind()
    }

    /// Record a received payload; returns the updated count
    #[inline]
    pub fn record_received(&self) -> u64 {
        self.counters.received.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Record a transmit attempt; returns the updated count
    #[inline]
    pub fn record_transmit_attempt(&self) -> u64 {
        self.counters.transmitted.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Record a receive error, transmit error, or overflow drop
    #[inline]
    pub fn record_error(&self) {
        self.counters.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of the counters
    pub fn counters(&self) -> CounterSnapshot {
        CounterSnapshot {
            received: self.counters.received.load(Ordering::Relaxed),
            transmitted: self.counters.transmitted.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_stream() -> Stream {
        Stream::new(
            StreamId::new(100),
            StreamKind::Video {
                width: 1920,
                height: 1080,
                bytes_per_pixel: 4,
                rate_numerator: 60000,
                rate_denominator: 1001,
            },
        )
    }

    #[test]
    fn test_payload_kind_projection() {
        assert_eq!(video_stream().payload_kind(), PayloadKind::Video);
        assert_eq!(
            Stream::new(StreamId::new(1), StreamKind::Ancillary).payload_kind(),
            PayloadKind::Ancillary
        );
    }

    #[test]
    fn test_counters_start_at_zero() {
        let stream = video_stream();
        assert_eq!(stream.counters(), CounterSnapshot::default());
    }

    #[test]
    fn test_record_received_returns_running_count() {
        let stream = video_stream();
        assert_eq!(stream.record_received(), 1);
        assert_eq!(stream.record_received(), 2);
        assert_eq!(stream.counters().received, 2);
    }

    #[test]
    fn test_record_all_counters() {
        let stream = video_stream();
        stream.record_received();
        stream.record_transmit_attempt();
        stream.record_transmit_attempt();
        stream.record_error();

        let snapshot = stream.counters();
        assert_eq!(snapshot.received, 1);
        assert_eq!(snapshot.transmitted, 2);
        assert_eq!(snapshot.errors, 1);
    }

    #[test]
    fn test_sample_rate_hz() {
        assert_eq!(SampleRate::Hz48000.as_hz(), 48_000);
        assert_eq!(SampleRate::Hz96000.to_string(), "96000Hz");
    }

    #[test]
    fn test_concurrent_counter_updates() {
        use std::sync::Arc;
        use std::thread;

        let stream = Arc::new(video_stream());
        let mut handles = vec![];

        for _ in 0..4 {
            let stream = Arc::clone(&stream);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    stream.record_received();
                    stream.record_transmit_attempt();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = stream.counters();
        assert_eq!(snapshot.received, 4000);
        assert_eq!(snapshot.transmitted, 4000);
    }
}
