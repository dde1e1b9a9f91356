//! Channel - the concurrent dispatch and buffering core
//!
//! A `Channel` owns a set of connections, a stream registry, one bounded
//! payload buffer per connection, and the routing map that relates them.
//! At runtime it drives a read pump per input connection and a write pump
//! per output connection on a shared worker runtime:
//!
//! ```text
//! [Inputs]            [Channel]                         [Outputs]
//!   cam_in ──receive──→ dispatch ──clone──→ [buffer]──transmit──→ mix_out
//!   mic_in ──receive──→    │    └──clone──→ [buffer]──transmit──→ monitor_out
//!                   routing map lookup
//! ```
//!
//! # Key Design
//!
//! - **Payload fan-out is zero-copy**: payload handles are cloned into
//!   each mapped output buffer; bytes are never copied
//! - **Overflow never blocks**: a full output buffer drops the payload
//!   for that output and reports once per overflow episode
//! - **Ordering**: one pump per connection keeps per-input dispatch order
//!   and per-output transmit order; nothing is promised across inputs
//! - **Cooperative shutdown**: every pump guards on a cancellation token;
//!   `shutdown` is idempotent and completes before `start` returns

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sluice_payload::{Payload, StreamId};
use sluice_routing::{Direction, DirectionFilter, RoutingMap};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::buffer::PayloadBuffer;
use crate::config::{ChannelSpec, ConnectionSpec, DispatchPolicy, EngineOptions, StreamSpec};
use crate::connection::Connection;
use crate::error::{ChannelError, ConfigError, ConfigResult};
use crate::metrics::{ChannelMetrics, ChannelMetricsHandle};
use crate::stream::{ChannelGrouping, SampleRate, Stream, StreamKind};
use crate::transport::{
    ConnectionMode, ConnectionStatus, Endpoint, Transport, TransportError, TransportKind,
};

/// Queue depth between a push transport's completion thread and its read pump
const PUSH_COMPLETION_DEPTH: usize = 64;

/// Sink for non-recoverable transport errors
///
/// Invoked from worker context whenever a connection fails to open or
/// falls out of the open state; the engine keeps attempting reopens, so
/// the handler decides whether the process should give up.
pub type FatalHandler = Arc<dyn Fn(&TransportError) + Send + Sync>;

/// Factory the declarative configuration path uses to back connections
pub trait TransportFactory {
    /// Create the transport for one declared connection
    fn create(&self, spec: &ConnectionSpec) -> Arc<dyn Transport>;
}

impl<F> TransportFactory for F
where
    F: Fn(&ConnectionSpec) -> Arc<dyn Transport>,
{
    fn create(&self, spec: &ConnectionSpec) -> Arc<dyn Transport> {
        self(spec)
    }
}

/// Cloneable handle that can shut a running channel down from outside
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    name: String,
    active: CancellationToken,
}

impl ShutdownHandle {
    /// Request channel shutdown; idempotent
    pub fn shutdown(&self) {
        if !self.active.is_cancelled() {
            tracing::debug!(channel = %self.name, "channel is shutting down");
            self.active.cancel();
        }
    }

    /// Check whether shutdown has been requested
    pub fn is_shutdown(&self) -> bool {
        self.active.is_cancelled()
    }
}

/// The channel engine
///
/// Built in two phases: configuration (`add_input`, `add_output`,
/// `add_*_stream`, `map_stream`, `validate_configuration`) mutates the
/// channel; the runtime phase (`start` / `run`) shares it immutably
/// across worker tasks, so all relational state is lock-free on the hot
/// path.
pub struct Channel {
    name: String,
    options: EngineOptions,

    /// Connections in registration order
    connections: Vec<Arc<Connection>>,

    /// Connection lookup by name
    by_name: HashMap<String, Arc<Connection>>,

    /// One bounded payload buffer per connection
    buffers: HashMap<String, Arc<PayloadBuffer>>,

    /// Stream registry
    streams: HashMap<StreamId, Arc<Stream>>,

    /// Stream ids in registration order, for diagnostics
    stream_order: Vec<StreamId>,

    /// Stream↔connection relation
    routing: RoutingMap,

    metrics: Arc<ChannelMetrics>,

    /// The active sentinel: pumps run while this is not cancelled
    active: CancellationToken,

    /// All spawned pumps and open tasks, joined at shutdown
    pumps: TaskTracker,

    started: AtomicBool,
}

impl Channel {
    /// Create a channel with default options
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_options(name, EngineOptions::default())
    }

    /// Create a channel with explicit options
    pub fn with_options(name: impl Into<String>, options: EngineOptions) -> Self {
        Self {
            name: name.into(),
            options,
            connections: Vec::new(),
            by_name: HashMap::new(),
            buffers: HashMap::new(),
            streams: HashMap::new(),
            stream_order: Vec::new(),
            routing: RoutingMap::new(),
            metrics: Arc::new(ChannelMetrics::new()),
            active: CancellationToken::new(),
            pumps: TaskTracker::new(),
            started: AtomicBool::new(false),
        }
    }

    /// Build a channel from a declarative spec
    ///
    /// Applies the spec through the builder API, so it shares all
    /// validation with it. The factory supplies a transport for every
    /// declared connection.
    pub fn from_spec(spec: &ChannelSpec, transports: &dyn TransportFactory) -> ConfigResult<Self> {
        let mut channel = Self::with_options(&spec.name, spec.options.clone());

        for conn in &spec.connections {
            let transport = transports.create(conn);
            match conn.direction {
                Direction::In => channel.add_input(
                    conn.kind,
                    &conn.name,
                    &conn.host,
                    conn.port,
                    conn.mode,
                    conn.buffer_capacity,
                    transport,
                )?,
                Direction::Out => channel.add_output(
                    conn.kind,
                    &conn.name,
                    &conn.host,
                    conn.port,
                    conn.mode,
                    conn.buffer_capacity,
                    transport,
                )?,
            };
        }

        for stream in &spec.streams {
            match stream {
                StreamSpec::Video {
                    id,
                    width,
                    height,
                    bytes_per_pixel,
                    rate_numerator,
                    rate_denominator,
                } => channel.add_video_stream(
                    *id,
                    *width,
                    *height,
                    *bytes_per_pixel,
                    *rate_numerator,
                    *rate_denominator,
                )?,
                StreamSpec::Audio {
                    id,
                    grouping,
                    sample_rate,
                    bytes_per_sample,
                    language,
                } => channel.add_audio_stream(
                    *id,
                    *grouping,
                    *sample_rate,
                    *bytes_per_sample,
                    language.clone(),
                )?,
                StreamSpec::Ancillary { id } => channel.add_ancillary_stream(*id)?,
            };
        }

        for route in &spec.routes {
            for name in &route.connections {
                channel.map_stream(route.stream, name)?;
            }
        }

        Ok(channel)
    }

    /// Get the channel name
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the engine options
    #[inline]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Get a metrics handle that stays valid while the channel runs
    pub fn metrics_handle(&self) -> ChannelMetricsHandle {
        ChannelMetricsHandle::new(Arc::clone(&self.metrics))
    }

    /// Get a handle that can shut the channel down from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            name: self.name.clone(),
            active: self.active.clone(),
        }
    }

    /// Look up a connection by name
    pub fn connection(&self, name: &str) -> Option<&Arc<Connection>> {
        self.by_name.get(name)
    }

    /// Look up a stream by id
    pub fn stream(&self, id: StreamId) -> Option<&Arc<Stream>> {
        self.streams.get(&id)
    }

    pub(crate) fn connection_buffer(&self, name: &str) -> Option<&Arc<PayloadBuffer>> {
        self.buffers.get(name)
    }

    // ------------------------------------------------------------------
    // Configuration phase
    // ------------------------------------------------------------------

    /// Register an input connection and its bounded buffer
    #[allow(clippy::too_many_arguments)]
    pub fn add_input(
        &mut self,
        kind: TransportKind,
        name: &str,
        host: &str,
        port: u16,
        mode: ConnectionMode,
        buffer_capacity: usize,
        transport: Arc<dyn Transport>,
    ) -> ConfigResult<Arc<Connection>> {
        self.add_connection(Direction::In, kind, name, host, port, mode, buffer_capacity, transport)
    }

    /// Register an output connection and its bounded buffer
    #[allow(clippy::too_many_arguments)]
    pub fn add_output(
        &mut self,
        kind: TransportKind,
        name: &str,
        host: &str,
        port: u16,
        mode: ConnectionMode,
        buffer_capacity: usize,
        transport: Arc<dyn Transport>,
    ) -> ConfigResult<Arc<Connection>> {
        self.add_connection(Direction::Out, kind, name, host, port, mode, buffer_capacity, transport)
    }

    #[allow(clippy::too_many_arguments)]
    fn add_connection(
        &mut self,
        direction: Direction,
        kind: TransportKind,
        name: &str,
        host: &str,
        port: u16,
        mode: ConnectionMode,
        buffer_capacity: usize,
        transport: Arc<dyn Transport>,
    ) -> ConfigResult<Arc<Connection>> {
        self.routing.register_connection(name, direction)?;

        let connection = Arc::new(Connection::new(
            name,
            kind,
            mode,
            direction,
            Endpoint::new(host, port),
            transport,
        ));

        self.buffers
            .insert(name.to_owned(), Arc::new(PayloadBuffer::new(buffer_capacity)));
        self.by_name.insert(name.to_owned(), Arc::clone(&connection));
        self.connections.push(Arc::clone(&connection));

        tracing::debug!(
            channel = %self.name,
            connection = %name,
            kind = %kind,
            mode = %mode,
            direction = %direction,
            buffer_capacity,
            "connection registered"
        );

        Ok(connection)
    }

    /// Declare a video stream
    pub fn add_video_stream(
        &mut self,
        id: StreamId,
        width: u32,
        height: u32,
        bytes_per_pixel: u32,
        rate_numerator: u32,
        rate_denominator: u32,
    ) -> ConfigResult<Arc<Stream>> {
        self.add_stream(
            id,
            StreamKind::Video {
                width,
                height,
                bytes_per_pixel,
                rate_numerator,
                rate_denominator,
            },
        )
    }

    /// Declare an audio stream
    pub fn add_audio_stream(
        &mut self,
        id: StreamId,
        grouping: ChannelGrouping,
        sample_rate: SampleRate,
        bytes_per_sample: u32,
        language: impl Into<String>,
    ) -> ConfigResult<Arc<Stream>> {
        self.add_stream(
            id,
            StreamKind::Audio {
                grouping,
                sample_rate,
                bytes_per_sample,
                language: language.into(),
            },
        )
    }

    /// Declare an ancillary data stream
    pub fn add_ancillary_stream(&mut self, id: StreamId) -> ConfigResult<Arc<Stream>> {
        self.add_stream(id, StreamKind::Ancillary)
    }

    fn add_stream(&mut self, id: StreamId, kind: StreamKind) -> ConfigResult<Arc<Stream>> {
        if self.streams.contains_key(&id) {
            return Err(ConfigError::duplicate_stream(id));
        }

        let stream = Arc::new(Stream::new(id, kind));
        self.streams.insert(id, Arc::clone(&stream));
        self.stream_order.push(id);
        Ok(stream)
    }

    /// Associate a stream with a connection, in both lookup directions
    ///
    /// # Errors
    ///
    /// Unknown stream id, unknown connection name, a repeated pair, or a
    /// second input connection for the stream (the error names both the
    /// existing and the rejected connection).
    pub fn map_stream(&mut self, stream: StreamId, connection_name: &str) -> ConfigResult<()> {
        if !self.streams.contains_key(&stream) {
            return Err(ConfigError::unknown_stream(stream));
        }
        if !self.by_name.contains_key(connection_name) {
            return Err(ConfigError::unknown_connection(connection_name));
        }

        self.routing.bind(connection_name, stream)?;
        Ok(())
    }

    /// Verify the configured topology before starting
    ///
    /// Every connection must carry at least one stream, and every stream
    /// with an input must have at least one output to go to.
    pub fn validate_configuration(&self) -> ConfigResult<()> {
        for connection in &self.connections {
            if !self.routing.is_bound(connection.name()) {
                return Err(ConfigError::no_streams(connection.name()));
            }
        }

        for &id in &self.stream_order {
            if self.routing.input_of(id).is_some()
                && self
                    .routing
                    .connections_of(id, DirectionFilter::Out)
                    .is_empty()
            {
                return Err(ConfigError::no_outputs(id));
            }
        }

        Ok(())
    }

    /// Render the configured topology for operator inspection
    ///
    /// Diagnostic only; not used on the dispatch path.
    pub fn show_configuration(&self) -> String {
        let mut out = String::new();

        for (heading, direction) in [("# Inputs", Direction::In), ("# Outputs", Direction::Out)] {
            let _ = writeln!(out, "{heading}");
            for connection in self
                .connections
                .iter()
                .filter(|c| c.direction() == direction)
            {
                let _ = writeln!(
                    out,
                    "  [{:<12}] {} {} {}",
                    connection.name(),
                    connection.kind(),
                    connection.mode(),
                    connection.endpoint(),
                );
                for &stream in self.routing.streams_of(connection.name()) {
                    let kind = self
                        .streams
                        .get(&stream)
                        .map(|s| s.payload_kind().as_str())
                        .unwrap_or("unknown");
                    let _ = writeln!(out, "    stream: {stream} ({kind})");
                }
            }
            let _ = writeln!(out);
        }

        out
    }

    // ------------------------------------------------------------------
    // Runtime phase
    // ------------------------------------------------------------------

    /// Open all connections and run the channel until shutdown
    ///
    /// Builds the worker runtime itself: `worker_count == 0` runs on the
    /// calling thread, anything larger gets a dedicated pool. Blocks
    /// until [`shutdown`](Self::shutdown) completes; afterwards every
    /// connection status is Closed.
    pub fn start(
        self: &Arc<Self>,
        on_fatal: FatalHandler,
        worker_count: usize,
    ) -> Result<(), ChannelError> {
        let runtime = if worker_count == 0 {
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?
        } else {
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(worker_count)
                .enable_all()
                .build()?
        };

        runtime.block_on(self.run(on_fatal));
        Ok(())
    }

    /// The async core of [`start`](Self::start)
    ///
    /// Drivable directly from an embedding runtime. Returns once shutdown
    /// has disconnected every connection and joined every pump.
    pub async fn run(self: &Arc<Self>, on_fatal: FatalHandler) {
        if self.started.swap(true, Ordering::AcqRel) {
            tracing::warn!(channel = %self.name, "channel already started");
            return;
        }

        tracing::info!(
            channel = %self.name,
            connections = self.connections.len(),
            streams = self.streams.len(),
            workers = self.options.worker_count,
            "waiting for channel connections to be ready"
        );

        self.open_connections(&on_fatal);
        self.active.cancelled().await;

        for connection in &self.connections {
            connection.disconnect();
        }

        self.pumps.close();
        self.pumps.wait().await;

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            channel = %self.name,
            payloads_received = snapshot.payloads_received,
            payloads_transmitted = snapshot.payloads_transmitted,
            payloads_dropped = snapshot.payloads_dropped,
            overflow_episodes = snapshot.overflow_episodes,
            "channel shut down"
        );
    }

    /// Request shutdown; idempotent
    ///
    /// The first call cancels the active sentinel; `run` then disconnects
    /// all connections and joins the pumps before returning. Later calls
    /// observe the cancelled sentinel and do nothing.
    pub fn shutdown(&self) {
        if !self.active.is_cancelled() {
            tracing::debug!(channel = %self.name, "channel is shutting down");
            self.active.cancel();
        }
    }

    #[inline]
    fn is_active(&self) -> bool {
        !self.active.is_cancelled()
    }

    /// Open every connection still in the Closed state
    ///
    /// Called at startup and whenever a pump finds a connection out of
    /// the open state. Exactly one open attempt runs per connection at a
    /// time; completions start the connection's pump.
    fn open_connections(self: &Arc<Self>, on_fatal: &FatalHandler) {
        if !self.is_active() {
            return;
        }

        for connection in &self.connections {
            if connection.status() != ConnectionStatus::Closed || !connection.begin_opening() {
                continue;
            }

            let channel = Arc::clone(self);
            let connection = Arc::clone(connection);
            let on_fatal = Arc::clone(on_fatal);
            self.pumps.spawn(async move {
                tokio::select! {
                    _ = channel.active.cancelled() => {}
                    result = connection.open_transport() => match result {
                        Ok(()) => {
                            tracing::info!(connection = %connection.name(), "connection established");
                            channel.on_connection_open(connection, on_fatal);
                        }
                        Err(e) => {
                            channel.metrics.record_connect_failure();
                            tracing::error!(
                                connection = %connection.name(),
                                error = %e,
                                "connection failed"
                            );
                            on_fatal(&e);
                        }
                    }
                }
            });
        }
    }

    /// Completion actions once a connection reaches the Open state
    fn on_connection_open(self: &Arc<Self>, connection: Arc<Connection>, on_fatal: FatalHandler) {
        if !self.is_active() {
            return;
        }

        match connection.direction() {
            Direction::In => {
                // Payloads queued before the input became ready are stale;
                // every output mapped to one of its streams starts clean.
                for &stream in self.routing.streams_of(connection.name()) {
                    for output in self.routing.connections_of(stream, DirectionFilter::Out) {
                        if let Some(buffer) = self.buffers.get(output) {
                            buffer.clear();
                        }
                    }
                }
                self.spawn_read_pump(connection, on_fatal);
            }
            Direction::Out => self.spawn_write_pump(connection, on_fatal),
        }
    }

    fn spawn_read_pump(self: &Arc<Self>, connection: Arc<Connection>, on_fatal: FatalHandler) {
        if !connection.claim_pump() {
            return;
        }

        let channel = Arc::clone(self);
        self.pumps.spawn(async move {
            let reopen = channel.read_pump(&connection, &on_fatal).await;
            connection.release_pump();
            if reopen {
                channel.open_connections(&on_fatal);
            }
        });
    }

    fn spawn_write_pump(self: &Arc<Self>, connection: Arc<Connection>, on_fatal: FatalHandler) {
        if !connection.claim_pump() {
            return;
        }

        let channel = Arc::clone(self);
        self.pumps.spawn(async move {
            let reopen = channel.write_pump(&connection, &on_fatal).await;
            connection.release_pump();
            if reopen {
                channel.open_connections(&on_fatal);
            }
        });
    }

    /// Receive loop for one input connection
    ///
    /// Pull transports are re-armed per completion; push transports get a
    /// handler installed once and deliver through it. Returns true when
    /// the connection should be reopened.
    async fn read_pump(
        self: &Arc<Self>,
        connection: &Arc<Connection>,
        on_fatal: &FatalHandler,
    ) -> bool {
        if connection.transport().auto_receive() {
            let (tx, mut rx) = mpsc::channel(PUSH_COMPLETION_DEPTH);
            connection.transport().install_receive_handler(tx);

            loop {
                tokio::select! {
                    _ = self.active.cancelled() => return false,
                    completion = rx.recv() => {
                        let Some(completion) = completion else {
                            // The transport dropped its handler side
                            return self.on_receive_loss(
                                connection,
                                &TransportError::Closed,
                                on_fatal,
                            );
                        };
                        match self.dispatch(connection, completion, on_fatal).await {
                            PumpStep::Continue => {}
                            PumpStep::Reopen => return true,
                        }
                    }
                }
            }
        } else {
            loop {
                tokio::select! {
                    _ = self.active.cancelled() => return false,
                    completion = connection.transport().receive() => {
                        match self.dispatch(connection, completion, on_fatal).await {
                            PumpStep::Continue => {}
                            PumpStep::Reopen => return true,
                        }
                    }
                }
            }
        }
    }

    /// Handle one receive completion: count, route, enqueue
    async fn dispatch(
        self: &Arc<Self>,
        connection: &Arc<Connection>,
        completion: Result<Payload, TransportError>,
        on_fatal: &FatalHandler,
    ) -> PumpStep {
        let payload = match completion {
            Ok(payload) => payload,
            Err(e) => {
                // The completion carries no payload, so the failure is
                // attributed to every stream this input carries.
                for &stream in self.routing.streams_of(connection.name()) {
                    if let Some(stream) = self.streams.get(&stream) {
                        stream.record_error();
                    }
                }

                if e.is_connection_loss() || connection.status() != ConnectionStatus::Open {
                    if self.on_receive_loss(connection, &e, on_fatal) {
                        return PumpStep::Reopen;
                    }
                    return PumpStep::Continue;
                }

                tracing::warn!(
                    connection = %connection.name(),
                    error = %e,
                    "error receiving a payload"
                );
                return PumpStep::Continue;
            }
        };

        let Some(stream) = self.streams.get(&payload.stream_id()) else {
            tracing::warn!(
                connection = %connection.name(),
                stream = %payload.stream_id(),
                "payload for unknown stream discarded"
            );
            return PumpStep::Continue;
        };

        let received = stream.record_received();
        self.metrics.record_received(payload.len() as u64);

        for output_name in self
            .routing
            .connections_of(stream.id(), DirectionFilter::Out)
        {
            let Some(output) = self.by_name.get(output_name) else {
                continue;
            };

            if output.status() != ConnectionStatus::Open {
                self.open_connections(on_fatal);
                continue;
            }

            let Some(buffer) = self.buffers.get(output_name) else {
                continue;
            };

            if buffer.note_occupancy() {
                self.metrics.record_overflow_episode();
                tracing::warn!(
                    connection = %output_name,
                    capacity = buffer.capacity(),
                    "transmit buffer is full; one or more payloads will be discarded"
                );
            }

            if buffer.is_full() {
                stream.record_error();
                self.metrics.record_dropped();
            }

            if buffer.enqueue(payload.clone()) {
                self.metrics.record_dispatched();
                tracing::trace!(
                    stream = %stream.id(),
                    received,
                    sequence = payload.sequence(),
                    size = payload.len(),
                    queued = buffer.len(),
                    capacity = buffer.capacity(),
                    connection = %output_name,
                    "payload queued for transmission"
                );
            }
        }

        if self.options.dispatch_policy() == DispatchPolicy::Posted {
            tokio::task::yield_now().await;
        }

        PumpStep::Continue
    }

    /// Common handling for an input that left the open state
    ///
    /// Returns true when a reopen should be attempted.
    fn on_receive_loss(
        &self,
        connection: &Arc<Connection>,
        error: &TransportError,
        on_fatal: &FatalHandler,
    ) -> bool {
        if !self.is_active() {
            return false;
        }

        tracing::warn!(
            connection = %connection.name(),
            error = %error,
            "input connection is not ready"
        );
        on_fatal(error);
        connection.disconnect();
        true
    }

    /// Transmit loop for one output connection
    ///
    /// Suspends on the buffer's readiness notifier instead of spinning.
    /// Returns true when the connection should be reopened.
    async fn write_pump(
        self: &Arc<Self>,
        connection: &Arc<Connection>,
        on_fatal: &FatalHandler,
    ) -> bool {
        let Some(buffer) = self.buffers.get(connection.name()) else {
            return false;
        };

        loop {
            tokio::select! {
                _ = self.active.cancelled() => return false,
                _ = buffer.ready() => {}
            }

            let Some(payload) = buffer.front() else {
                continue;
            };
            let Some(stream) = self.streams.get(&payload.stream_id()) else {
                buffer.pop_front();
                continue;
            };

            // Counts the attempt while the transmit is in flight
            let transmitted = stream.record_transmit_attempt();
            tracing::trace!(
                stream = %stream.id(),
                transmitted,
                sequence = payload.sequence(),
                size = payload.len(),
                queued = buffer.len(),
                capacity = buffer.capacity(),
                connection = %connection.name(),
                "transmitting payload"
            );

            let result = tokio::select! {
                _ = self.active.cancelled() => return false,
                result = connection.transport().transmit(payload.clone()) => result,
            };

            // The in-flight payload is consumed regardless of outcome
            buffer.pop_front();

            match result {
                Ok(()) => {
                    self.metrics.record_transmitted();
                    tracing::trace!(
                        stream = %stream.id(),
                        sequence = payload.sequence(),
                        connection = %connection.name(),
                        "transmitted payload"
                    );
                }
                Err(e) => {
                    stream.record_error();

                    if e.is_connection_loss() || connection.status() != ConnectionStatus::Open {
                        if !self.is_active() {
                            return false;
                        }
                        tracing::warn!(
                            connection = %connection.name(),
                            error = %e,
                            "output connection is not ready"
                        );
                        on_fatal(&e);
                        connection.disconnect();
                        return true;
                    }

                    tracing::warn!(
                        connection = %connection.name(),
                        error = %e,
                        "error transmitting a payload"
                    );
                }
            }

            if self.options.dispatch_policy() == DispatchPolicy::Posted {
                tokio::task::yield_now().await;
            }
        }
    }
}

/// Outcome of one dispatch step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PumpStep {
    Continue,
    Reopen,
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.active.cancel();
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("connections", &self.connections.len())
            .field("streams", &self.streams.len())
            .field("bindings", &self.routing.binding_count())
            .finish()
    }
}

#[cfg(test)]
#[path = "channel_test.rs"]
mod channel_test;
