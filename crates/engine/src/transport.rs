//! Transport capability - the contract every concrete transport fulfils
//!
//! The engine drives connections exclusively through the [`Transport`]
//! trait: open (connect or accept), receive, transmit, disconnect. Framing
//! is entirely the transport's responsibility - every receive completion
//! delivers one whole payload with its stream id already populated, and
//! the engine never parses bytes.
//!
//! Transports come in two reception styles, surfaced as a capability flag
//! rather than a type test:
//!
//! - **Pull** (`auto_receive() == false`, e.g. a framed TCP codec): the
//!   engine re-arms `receive` after every completion.
//! - **Push** (`auto_receive() == true`, e.g. a media SDK that delivers
//!   payloads from its own completion thread): the engine installs a
//!   handler once when the connection opens and never re-arms.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use async_trait::async_trait;
use serde::Deserialize;
use sluice_payload::Payload;
use thiserror::Error;
use tokio::sync::mpsc;

/// Result type for transport operations
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Errors surfaced by transport completions
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connect or accept failed
    #[error("connection failed: {reason}")]
    ConnectionFailed {
        /// Transport-specific failure description
        reason: String,
    },

    /// The connection dropped out of the open state
    #[error("connection lost: {reason}")]
    ConnectionLost {
        /// Transport-specific failure description
        reason: String,
    },

    /// A single receive completion failed; the connection remains open
    #[error("receive failed: {reason}")]
    Receive {
        /// Transport-specific failure description
        reason: String,
    },

    /// A single transmit completion failed; the connection remains open
    #[error("transmit failed: {reason}")]
    Transmit {
        /// Transport-specific failure description
        reason: String,
    },

    /// Operation attempted while the connection is not open
    #[error("connection is not open")]
    NotOpen,

    /// The transport was disconnected
    #[error("connection closed")]
    Closed,
}

impl TransportError {
    /// Create a ConnectionFailed error
    #[inline]
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            reason: reason.into(),
        }
    }

    /// Create a ConnectionLost error
    #[inline]
    pub fn connection_lost(reason: impl Into<String>) -> Self {
        Self::ConnectionLost {
            reason: reason.into(),
        }
    }

    /// Create a transient receive error
    #[inline]
    pub fn receive(reason: impl Into<String>) -> Self {
        Self::Receive {
            reason: reason.into(),
        }
    }

    /// Create a transient transmit error
    #[inline]
    pub fn transmit(reason: impl Into<String>) -> Self {
        Self::Transmit {
            reason: reason.into(),
        }
    }

    /// Whether this error means the connection left the open state
    ///
    /// The pipelines use this to decide between continuing the loop
    /// (transient completion failure) and tearing the connection down for
    /// a reopen attempt.
    #[inline]
    pub fn is_connection_loss(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::ConnectionLost { .. } | Self::Closed
        )
    }
}

/// Transport variant of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Length-framed TCP; the engine re-arms receive per completion
    Tcp,
    /// Media-transport SDK; payloads are pushed once the connection opens
    Media,
}

impl TransportKind {
    /// Get the lowercase name of this kind
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Media => "media",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a connection dials out or waits for a peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    /// Actively connects to the remote endpoint
    Client,
    /// Waits for the remote endpoint to connect
    Server,
}

impl ConnectionMode {
    /// Get the lowercase name of this mode
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Server => "server",
        }
    }
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote or local endpoint of a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Host name or address
    pub host: String,
    /// Port number
    pub port: u16,
}

impl Endpoint {
    /// Create an endpoint from host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Connection lifecycle state
///
/// Legal transitions: Closed → Connecting → Open → Closed; any state may
/// fall to Error on a fatal transport failure, from which only a
/// disconnect (back to Closed) is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionStatus {
    /// Not connected
    Closed = 0,
    /// Connect or accept in flight
    Connecting = 1,
    /// Ready for receive and transmit
    Open = 2,
    /// Fatal transport failure; awaiting disconnect
    Error = 3,
}

impl ConnectionStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Closed,
            1 => Self::Connecting,
            2 => Self::Open,
            _ => Self::Error,
        }
    }

    /// Get the lowercase name of this status
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic-readable connection status cell
///
/// Read on every dispatch, written on open and close completions; relaxed
/// ordering is sufficient because the status is advisory - the pipelines
/// tolerate a stale read by retrying through the reopen path.
#[derive(Debug)]
pub struct StatusCell(AtomicU8);

impl StatusCell {
    /// Create a cell in the Closed state
    pub const fn new() -> Self {
        Self(AtomicU8::new(ConnectionStatus::Closed as u8))
    }

    /// Read the current status
    #[inline]
    pub fn get(&self) -> ConnectionStatus {
        ConnectionStatus::from_u8(self.0.load(Ordering::Relaxed))
    }

    /// Store a new status
    #[inline]
    pub fn set(&self, status: ConnectionStatus) {
        self.0.store(status as u8, Ordering::Relaxed);
    }

    /// Move from `from` to `to`; returns false if another writer got there first
    #[inline]
    pub fn transition(&self, from: ConnectionStatus, to: ConnectionStatus) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Asynchronous operation set every concrete transport exposes
///
/// Implementations live outside the engine (framed TCP codec, media SDK
/// bindings, in-memory doubles). Each operation resolves exactly once per
/// invocation; status bookkeeping is the engine's concern, not the
/// transport's.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establish the connection to the remote endpoint (Client mode)
    async fn connect(&self) -> TransportResult<()>;

    /// Wait for the remote endpoint to connect (Server mode)
    async fn accept(&self) -> TransportResult<()>;

    /// Receive the next whole payload (pull transports)
    async fn receive(&self) -> TransportResult<Payload>;

    /// Transmit one payload
    async fn transmit(&self, payload: Payload) -> TransportResult<()>;

    /// Tear the connection down; valid from any state
    fn disconnect(&self);

    /// Whether the transport pushes payloads on its own once open
    ///
    /// Push transports get a handler installed via
    /// [`install_receive_handler`](Self::install_receive_handler) when the
    /// connection opens and are never re-armed; `receive` is not called
    /// on them.
    fn auto_receive(&self) -> bool {
        false
    }

    /// Install the completion handler for push transports
    ///
    /// Pull transports ignore this; the default does nothing.
    fn install_receive_handler(&self, _handler: mpsc::Sender<TransportResult<Payload>>) {}
}
