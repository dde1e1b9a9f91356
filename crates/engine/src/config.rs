//! Declarative channel configuration
//!
//! A serde-deserializable mirror of the builder API, so a channel can be
//! described in a TOML or JSON document and applied through
//! `Channel::from_spec`. The spec shares all validation with the builder
//! path - unknown names, duplicate streams, and input conflicts surface
//! as the same configuration errors.
//!
//! # Example
//!
//! ```toml
//! name = "overlay"
//!
//! [options]
//! worker_count = 4
//! inline_handlers = false
//!
//! [[connections]]
//! name = "cam_in"
//! kind = "tcp"
//! mode = "server"
//! direction = "in"
//! host = "0.0.0.0"
//! port = 5000
//! buffer_capacity = 32
//!
//! [[streams]]
//! kind = "video"
//! id = 100
//! width = 1920
//! height = 1080
//! bytes_per_pixel = 4
//! rate_numerator = 60000
//! rate_denominator = 1001
//!
//! [[routes]]
//! stream = 100
//! connections = ["cam_in", "mix_out"]
//! ```

use serde::Deserialize;
use sluice_payload::StreamId;
use sluice_routing::Direction;

use crate::stream::{ChannelGrouping, SampleRate};
use crate::transport::{ConnectionMode, TransportKind};
use crate::DEFAULT_BUFFER_CAPACITY;

/// How completion handlers continue on the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Continue directly on the completion task - lower latency, longer
    /// uninterrupted handler chains
    Inline,
    /// Yield to the executor after every completion - bounds handler
    /// chains so one busy connection cannot starve the others
    Posted,
}

/// Engine-wide runtime options
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Size of the worker pool; 0 runs on the calling thread
    pub worker_count: usize,

    /// Invoke completion handlers inline instead of reposting them
    pub inline_handlers: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            worker_count: 0,
            inline_handlers: false,
        }
    }
}

impl EngineOptions {
    /// Get the dispatch policy implied by `inline_handlers`
    pub fn dispatch_policy(&self) -> DispatchPolicy {
        if self.inline_handlers {
            DispatchPolicy::Inline
        } else {
            DispatchPolicy::Posted
        }
    }
}

/// Declarative description of one connection
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionSpec {
    /// Unique connection name
    pub name: String,

    /// Transport variant
    pub kind: TransportKind,

    /// Client or server mode
    pub mode: ConnectionMode,

    /// Payload flow direction
    pub direction: Direction,

    /// Remote or bind host
    pub host: String,

    /// Remote or bind port
    pub port: u16,

    /// Bounded queue size for this connection
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
}

fn default_buffer_capacity() -> usize {
    DEFAULT_BUFFER_CAPACITY
}

/// Declarative description of one stream
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StreamSpec {
    /// Video stream declaration
    Video {
        /// Stream id
        id: StreamId,
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
    /// Audio stream declaration
    Audio {
        /// Stream id
        id: StreamId,
        /// Speaker layout
        grouping: ChannelGrouping,
        /// Sampling rate
        sample_rate: SampleRate,
        /// Bytes per sample
        bytes_per_sample: u32,
        /// RFC 5646 language tag
        language: String,
    },
    /// Ancillary stream declaration
    Ancillary {
        /// Stream id
        id: StreamId,
    },
}

impl StreamSpec {
    /// Get the declared stream id
    pub fn id(&self) -> StreamId {
        match self {
            Self::Video { id, .. } | Self::Audio { id, .. } | Self::Ancillary { id } => *id,
        }
    }
}

/// Declarative description of one route
#[derive(Debug, Clone, Deserialize)]
pub struct RouteSpec {
    /// Stream to route
    pub stream: StreamId,

    /// Connections carrying the stream (inputs and outputs)
    pub connections: Vec<String>,
}

/// Complete declarative channel description
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelSpec {
    /// Channel name, used in logs
    pub name: String,

    /// Runtime options
    #[serde(default)]
    pub options: EngineOptions,

    /// Connections to register
    pub connections: Vec<ConnectionSpec>,

    /// Streams to declare
    pub streams: Vec<StreamSpec>,

    /// Stream-to-connection routes
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: &str = r#"
        name = "overlay"

        [options]
        worker_count = 4
        inline_handlers = true

        [[connections]]
        name = "cam_in"
        kind = "tcp"
        mode = "server"
        direction = "in"
        host = "0.0.0.0"
        port = 5000

        [[connections]]
        name = "mix_out"
        kind = "media"
        mode = "client"
        direction = "out"
        host = "10.0.0.5"
        port = 6000
        buffer_capacity = 8

        [[streams]]
        kind = "video"
        id = 100
        width = 1920
        height = 1080
        bytes_per_pixel = 4
        rate_numerator = 60000
        rate_denominator = 1001

        [[streams]]
        kind = "audio"
        id = 200
        grouping = "stereo"
        sample_rate = "48000"
        bytes_per_sample = 2
        language = "en"

        [[routes]]
        stream = 100
        connections = ["cam_in", "mix_out"]
    "#;

    #[test]
    fn test_deserialize_full_spec() {
        let spec: ChannelSpec = toml::from_str(SPEC).unwrap();

        assert_eq!(spec.name, "overlay");
        assert_eq!(spec.options.worker_count, 4);
        assert_eq!(spec.options.dispatch_policy(), DispatchPolicy::Inline);

        assert_eq!(spec.connections.len(), 2);
        let cam = &spec.connections[0];
        assert_eq!(cam.kind, TransportKind::Tcp);
        assert_eq!(cam.mode, ConnectionMode::Server);
        assert_eq!(cam.direction, Direction::In);
        assert_eq!(cam.buffer_capacity, DEFAULT_BUFFER_CAPACITY);
        assert_eq!(spec.connections[1].buffer_capacity, 8);

        assert_eq!(spec.streams.len(), 2);
        assert_eq!(spec.streams[0].id(), StreamId::new(100));
        assert!(matches!(spec.streams[1], StreamSpec::Audio { .. }));

        assert_eq!(spec.routes.len(), 1);
        assert_eq!(spec.routes[0].connections, ["cam_in", "mix_out"]);
    }

    #[test]
    fn test_options_default_to_posted_caller_thread() {
        let spec: ChannelSpec = toml::from_str(
            r#"
            name = "bare"
            connections = []
            streams = []
            "#,
        )
        .unwrap();

        assert_eq!(spec.options.worker_count, 0);
        assert_eq!(spec.options.dispatch_policy(), DispatchPolicy::Posted);
        assert!(spec.routes.is_empty());
    }

    #[test]
    fn test_unknown_transport_kind_is_rejected() {
        let result: Result<ConnectionSpec, _> = toml::from_str(
            r#"
            name = "cam_in"
            kind = "carrier-pigeon"
            mode = "client"
            direction = "in"
            host = "127.0.0.1"
            port = 5000
            "#,
        );
        assert!(result.is_err());
    }
}
