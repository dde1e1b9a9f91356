//! In-memory transport doubles for engine tests
//!
//! `TestTransport` implements the transport capability over tokio
//! channels so tests can feed receive completions, gate transmit
//! completions, and hold connects open to exercise every engine path
//! without sockets.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use sluice_payload::Payload;
use tokio::sync::{mpsc, Mutex as AsyncMutex, Semaphore};

use crate::transport::{Transport, TransportError, TransportResult};

/// Effectively-unlimited permit count for ungated operations
const UNGATED: usize = 1 << 20;

pub(crate) struct TestTransport {
    auto: bool,
    fail_open: bool,

    /// Permits consumed by connect/accept; pre-loaded unless gated
    open_gate: Semaphore,

    /// Receive completions for pull transports
    feed_tx: mpsc::UnboundedSender<TransportResult<Payload>>,
    feed_rx: AsyncMutex<mpsc::UnboundedReceiver<TransportResult<Payload>>>,

    /// Handler installed by the engine for push transports
    push_handler: Mutex<Option<mpsc::Sender<TransportResult<Payload>>>>,

    /// Permits consumed by transmit completions; pre-loaded unless gated
    transmit_gate: Semaphore,

    /// Transmit attempts observed, including blocked ones
    attempts: AtomicUsize,

    /// Successfully transmitted payloads
    sent: Mutex<Vec<Payload>>,

    disconnected: AtomicBool,
}

impl TestTransport {
    fn with_style(auto: bool) -> Self {
        let (feed_tx, feed_rx) = mpsc::unbounded_channel();
        Self {
            auto,
            fail_open: false,
            open_gate: Semaphore::new(UNGATED),
            feed_tx,
            feed_rx: AsyncMutex::new(feed_rx),
            push_handler: Mutex::new(None),
            transmit_gate: Semaphore::new(UNGATED),
            attempts: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            disconnected: AtomicBool::new(false),
        }
    }

    /// A pull-style transport (engine re-arms receive per completion)
    pub fn pull() -> Self {
        Self::with_style(false)
    }

    /// A push-style transport (engine installs a handler once)
    pub fn push() -> Self {
        Self::with_style(true)
    }

    /// Make connect/accept fail
    pub fn fail_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Hold connect/accept open until [`allow_open`](Self::allow_open)
    pub fn gated_open(self) -> Self {
        self.open_gate.forget_permits(UNGATED);
        self
    }

    /// Hold transmits in flight until [`release_transmits`](Self::release_transmits)
    pub fn gated_transmit(self) -> Self {
        self.transmit_gate.forget_permits(UNGATED);
        self
    }

    /// Erase to the trait object the engine consumes
    pub fn into_transport(self) -> Arc<dyn Transport> {
        Arc::new(self)
    }

    /// Let one pending connect/accept complete
    pub fn allow_open(&self) {
        self.open_gate.add_permits(1);
    }

    /// Let `count` pending or future transmits complete
    pub fn release_transmits(&self, count: usize) {
        self.transmit_gate.add_permits(count);
    }

    /// Deliver a receive completion carrying a payload
    pub fn feed(&self, payload: Payload) {
        self.feed_completion(Ok(payload));
    }

    /// Deliver a receive completion carrying an error
    pub fn feed_error(&self, error: TransportError) {
        self.feed_completion(Err(error));
    }

    fn feed_completion(&self, completion: TransportResult<Payload>) {
        if self.auto {
            let handler = self.push_handler.lock();
            handler
                .as_ref()
                .expect("receive handler not installed")
                .try_send(completion)
                .expect("push completion queue full");
        } else {
            let _ = self.feed_tx.send(completion);
        }
    }

    /// Number of transmit attempts observed, including blocked ones
    pub fn transmit_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Sequence numbers of successfully transmitted payloads, in order
    pub fn sent_sequences(&self) -> Vec<u64> {
        self.sent.lock().iter().map(Payload::sequence).collect()
    }

    /// Number of successfully transmitted payloads
    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }

    /// Whether the engine has installed the push completion handler
    pub fn has_receive_handler(&self) -> bool {
        self.push_handler.lock().is_some()
    }
}

#[async_trait]
impl Transport for TestTransport {
    async fn connect(&self) -> TransportResult<()> {
        self.open().await
    }

    async fn accept(&self) -> TransportResult<()> {
        self.open().await
    }

    async fn receive(&self) -> TransportResult<Payload> {
        if self.auto {
            return Err(TransportError::NotOpen);
        }

        match self.feed_rx.lock().await.recv().await {
            Some(completion) => completion,
            None => Err(TransportError::Closed),
        }
    }

    async fn transmit(&self, payload: Payload) -> TransportResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let permit = self
            .transmit_gate
            .acquire()
            .await
            .map_err(|_| TransportError::Closed)?;
        permit.forget();

        self.sent.lock().push(payload);
        Ok(())
    }

    fn disconnect(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
    }

    fn auto_receive(&self) -> bool {
        self.auto
    }

    fn install_receive_handler(&self, handler: mpsc::Sender<TransportResult<Payload>>) {
        *self.push_handler.lock() = Some(handler);
    }
}

impl TestTransport {
    async fn open(&self) -> TransportResult<()> {
        if self.fail_open {
            return Err(TransportError::connection_failed("test open failure"));
        }

        let permit = self
            .open_gate
            .acquire()
            .await
            .map_err(|_| TransportError::Closed)?;
        permit.forget();

        self.disconnected.store(false, Ordering::SeqCst);
        Ok(())
    }
}
