//! Engine-side connection record
//!
//! A `Connection` binds a name, a direction, and a status cell to the
//! transport that backs it. The engine owns the lifecycle bookkeeping;
//! the transport only performs I/O.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sluice_routing::Direction;

use crate::transport::{
    ConnectionMode, ConnectionStatus, Endpoint, StatusCell, Transport, TransportKind,
    TransportResult,
};

/// A named, directional endpoint backed by a concrete transport
///
/// Identity (name, kind, mode, direction, endpoint) is fixed at
/// registration; only the status changes at runtime. The status cell is
/// atomic-readable because every dispatch consults it while open and
/// close completions write it.
pub struct Connection {
    name: String,
    kind: TransportKind,
    mode: ConnectionMode,
    direction: Direction,
    endpoint: Endpoint,
    status: StatusCell,
    transport: Arc<dyn Transport>,

    /// Guards the single read or write pump across reopen cycles
    pump_active: AtomicBool,
}

impl Connection {
    pub(crate) fn new(
        name: impl Into<String>,
        kind: TransportKind,
        mode: ConnectionMode,
        direction: Direction,
        endpoint: Endpoint,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            mode,
            direction,
            endpoint,
            status: StatusCell::new(),
            transport,
            pump_active: AtomicBool::new(false),
        }
    }

    /// Get the unique connection name
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the transport variant
    #[inline]
    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Get the connection mode
    #[inline]
    pub fn mode(&self) -> ConnectionMode {
        self.mode
    }

    /// Get the connection direction
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Get the remote endpoint
    #[inline]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Read the current status
    #[inline]
    pub fn status(&self) -> ConnectionStatus {
        self.status.get()
    }

    /// Get the backing transport
    #[inline]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Claim the Closed → Connecting transition
    ///
    /// Exactly one caller wins when several paths notice a closed
    /// connection at once; the losers skip the open attempt.
    pub(crate) fn begin_opening(&self) -> bool {
        self.status
            .transition(ConnectionStatus::Closed, ConnectionStatus::Connecting)
    }

    /// Drive the transport open from the Connecting state
    ///
    /// Client mode connects, server mode accepts. On success the status
    /// becomes Open; on failure it becomes Error and the caller decides
    /// what to do with the returned error.
    pub(crate) async fn open_transport(&self) -> TransportResult<()> {
        tracing::debug!(connection = %self.name, endpoint = %self.endpoint, mode = %self.mode, "opening connection");

        let result = match self.mode {
            ConnectionMode::Client => self.transport.connect().await,
            ConnectionMode::Server => self.transport.accept().await,
        };

        match result {
            Ok(()) => {
                self.status.set(ConnectionStatus::Open);
                Ok(())
            }
            Err(e) => {
                self.status.set(ConnectionStatus::Error);
                Err(e)
            }
        }
    }

    /// Tear the connection down; valid from any state
    pub(crate) fn disconnect(&self) {
        self.transport.disconnect();
        self.status.set(ConnectionStatus::Closed);
        tracing::info!(connection = %self.name, "connection closed");
    }

    /// Try to claim the pump slot; false when a pump is already running
    pub(crate) fn claim_pump(&self) -> bool {
        !self.pump_active.swap(true, Ordering::AcqRel)
    }

    /// Release the pump slot so a reopen can start a fresh pump
    pub(crate) fn release_pump(&self) {
        self.pump_active.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("mode", &self.mode)
            .field("direction", &self.direction)
            .field("endpoint", &self.endpoint)
            .field("status", &self.status.get())
            .finish()
    }
}
