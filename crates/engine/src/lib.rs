//! Sluice - Channel engine
//!
//! The concurrent dispatch and buffering core of a media-routing
//! pipeline: it multiplexes logical media streams across a heterogeneous
//! set of bidirectional connections, fanning every received payload out
//! to the output connections mapped to its stream.
//!
//! # Architecture
//!
//! ```text
//! [Inputs]                 [Channel]                       [Outputs]
//!   cam_in ──┐                                           ┌──→ mix_out
//!   mic_in ──┼──→ read pumps ──→ routing map ──→ bounded ┼──→ monitor_out
//!            │        (per input)   lookup      buffers  └──→ record_out
//!            │                                  (per output, write pump each)
//! ```
//!
//! # Key Design
//!
//! - **Capability transports**: connections are driven through the
//!   [`Transport`] trait; the engine never downcasts, and push-style
//!   reception is a capability flag rather than a type test
//! - **Zero-copy fan-out**: payload handles are cloned into each mapped
//!   output buffer, bytes are shared
//! - **Bounded queueing**: every output has a fixed-capacity buffer;
//!   overflow drops the payload for that output and warns once per
//!   overflow episode (latched to a low watermark)
//! - **One executor**: `start` builds the worker runtime itself - a pool
//!   of N workers, or the calling thread when N is zero - and all pumps
//!   run on it
//! - **Cooperative shutdown**: an idempotent `shutdown` cancels the
//!   active sentinel; `start` returns with every connection closed
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sluice_engine::{Channel, ConnectionMode, TransportKind};
//! use sluice_payload::StreamId;
//!
//! let mut channel = Channel::new("overlay");
//! channel.add_video_stream(StreamId::new(100), 1920, 1080, 4, 60000, 1001)?;
//! channel.add_input(TransportKind::Tcp, "cam_in", "0.0.0.0", 5000,
//!     ConnectionMode::Server, 32, cam_transport)?;
//! channel.add_output(TransportKind::Media, "mix_out", "10.0.0.5", 6000,
//!     ConnectionMode::Client, 32, mix_transport)?;
//! channel.map_stream(StreamId::new(100), "cam_in")?;
//! channel.map_stream(StreamId::new(100), "mix_out")?;
//! channel.validate_configuration()?;
//!
//! let channel = Arc::new(channel);
//! let on_fatal = Arc::new(|e: &_| eprintln!("fatal: {e}"));
//! channel.start(on_fatal, 4)?; // blocks until shutdown
//! ```

mod buffer;
mod channel;
mod config;
mod connection;
mod error;
mod metrics;
mod stream;
mod transport;

#[cfg(test)]
mod test_transport;

pub use buffer::PayloadBuffer;
pub use channel::{Channel, FatalHandler, ShutdownHandle, TransportFactory};
pub use config::{
    ChannelSpec, ConnectionSpec, DispatchPolicy, EngineOptions, RouteSpec, StreamSpec,
};
pub use connection::Connection;
pub use error::{ChannelError, ConfigError, ConfigResult};
pub use metrics::{ChannelMetrics, ChannelMetricsHandle, ChannelSnapshot};
pub use stream::{ChannelGrouping, CounterSnapshot, SampleRate, Stream, StreamKind};
pub use transport::{
    ConnectionMode, ConnectionStatus, Endpoint, StatusCell, Transport, TransportError,
    TransportKind, TransportResult,
};

// Re-export the relational types for convenience
pub use sluice_payload::{Payload, PayloadKind, StreamId};
pub use sluice_routing::{Direction, DirectionFilter, RoutingMap};

/// Default bounded queue size for connection buffers
pub const DEFAULT_BUFFER_CAPACITY: usize = 32;
