//! Engine error types

use sluice_payload::StreamId;
use sluice_routing::RoutingError;
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Errors raised while configuring a channel
///
/// All configuration errors are synchronous and fatal to `start`; the
/// caller corrects the configuration and retries.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A stream id that was never declared
    #[error("an unrecognized stream [{stream}] was specified")]
    UnknownStream {
        /// The undeclared stream id
        stream: StreamId,
    },

    /// A connection name that was never declared
    #[error("unknown connection '{name}'")]
    UnknownConnection {
        /// The undeclared connection name
        name: String,
    },

    /// A stream id declared twice
    #[error("stream [{stream}] is already defined")]
    DuplicateStream {
        /// The repeated stream id
        stream: StreamId,
    },

    /// A connection with no stream bound
    #[error("connection '{name}' has no stream assigned")]
    NoStreams {
        /// The unmapped connection
        name: String,
    },

    /// An input stream with nowhere to go
    #[error("stream [{stream}] has an input connection but no output connections")]
    NoOutputs {
        /// The stream without outputs
        stream: StreamId,
    },

    /// Routing map rejection (duplicate names, input conflicts, ...)
    #[error(transparent)]
    Routing(#[from] RoutingError),
}

impl ConfigError {
    /// Create an UnknownStream error
    #[inline]
    pub fn unknown_stream(stream: StreamId) -> Self {
        Self::UnknownStream { stream }
    }

    /// Create an UnknownConnection error
    #[inline]
    pub fn unknown_connection(name: impl Into<String>) -> Self {
        Self::UnknownConnection { name: name.into() }
    }

    /// Create a DuplicateStream error
    #[inline]
    pub fn duplicate_stream(stream: StreamId) -> Self {
        Self::DuplicateStream { stream }
    }

    /// Create a NoStreams error
    #[inline]
    pub fn no_streams(name: impl Into<String>) -> Self {
        Self::NoStreams { name: name.into() }
    }

    /// Create a NoOutputs error
    #[inline]
    pub fn no_outputs(stream: StreamId) -> Self {
        Self::NoOutputs { stream }
    }
}

/// Errors raised by the channel runtime entry points
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Configuration was invalid at start
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The worker runtime could not be built
    #[error("failed to build worker runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::unknown_stream(StreamId::new(100));
        assert!(err.to_string().contains("[100]"));

        let err = ConfigError::no_streams("mix_out");
        assert!(err.to_string().contains("mix_out"));
        assert!(err.to_string().contains("no stream assigned"));

        let err = ConfigError::no_outputs(StreamId::new(200));
        assert!(err.to_string().contains("no output connections"));
    }

    #[test]
    fn test_routing_error_passthrough() {
        let routing = RoutingError::unknown_connection("ghost");
        let err = ConfigError::from(routing);
        assert!(err.to_string().contains("ghost"));
    }
}
