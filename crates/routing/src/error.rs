//! Routing error types

use sluice_payload::StreamId;
use thiserror::Error;

/// Result type for routing operations
pub type Result<T> = std::result::Result<T, RoutingError>;

/// Errors that can occur while building the routing map
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Connection name not registered with the map
    #[error("cannot map unknown connection '{name}'")]
    UnknownConnection {
        /// Name of the missing connection
        name: String,
    },

    /// Connection name registered twice
    #[error("connection '{name}' is already registered")]
    DuplicateConnection {
        /// Name registered a second time
        name: String,
    },

    /// The same (connection, stream) pair bound twice
    #[error("stream [{stream}] is already mapped to connection '{name}'")]
    DuplicateBinding {
        /// Connection the pair already exists for
        name: String,
        /// Stream of the repeated pair
        stream: StreamId,
    },

    /// A stream already has an input connection
    #[error(
        "stream [{stream}] is already assigned to input connection '{existing}' \
         and cannot also be assigned to connection '{rejected}'; \
         only a single input connection is allowed per stream"
    )]
    InputConflict {
        /// Stream with the conflicting bindings
        stream: StreamId,
        /// Input connection already bound to the stream
        existing: String,
        /// Input connection whose binding was rejected
        rejected: String,
    },
}

impl RoutingError {
    /// Create an UnknownConnection error
    #[inline]
    pub fn unknown_connection(name: impl Into<String>) -> Self {
        Self::UnknownConnection { name: name.into() }
    }

    /// Create a DuplicateConnection error
    #[inline]
    pub fn duplicate_connection(name: impl Into<String>) -> Self {
        Self::DuplicateConnection { name: name.into() }
    }

    /// Create a DuplicateBinding error
    #[inline]
    pub fn duplicate_binding(name: impl Into<String>, stream: StreamId) -> Self {
        Self::DuplicateBinding {
            name: name.into(),
            stream,
        }
    }

    /// Create an InputConflict error
    #[inline]
    pub fn input_conflict(
        stream: StreamId,
        existing: impl Into<String>,
        rejected: impl Into<String>,
    ) -> Self {
        Self::InputConflict {
            stream,
            existing: existing.into(),
            rejected: rejected.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_connection_error() {
        let err = RoutingError::unknown_connection("cam_in");
        assert!(err.to_string().contains("cam_in"));
        assert!(err.to_string().contains("unknown connection"));
    }

    #[test]
    fn test_duplicate_connection_error() {
        let err = RoutingError::duplicate_connection("mix_out");
        assert!(err.to_string().contains("mix_out"));
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn test_duplicate_binding_error() {
        let err = RoutingError::duplicate_binding("mix_out", StreamId::new(100));
        assert!(err.to_string().contains("mix_out"));
        assert!(err.to_string().contains("100"));
    }

    #[test]
    fn test_input_conflict_error_names_both_connections() {
        let err = RoutingError::input_conflict(StreamId::new(100), "cam_in", "backup_in");
        let msg = err.to_string();
        assert!(msg.contains("cam_in"));
        assert!(msg.contains("backup_in"));
        assert!(msg.contains("single input"));
    }
}
