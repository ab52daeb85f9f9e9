//! Shared doubles for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use websocket_bridge::host::HostLoop;
use websocket_bridge::transport::{Transport, TransportListener, TransportRequest, TransportSession};
use websocket_bridge::{
    ClientOptions, ConnectionHandle, HostListener, ResponseHeaders, Result, WebSocketClient,
    host_queue,
};

// ============================================================================
// Notifications
// ============================================================================

/// One host notification as seen by [`RecordingListener`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Note {
    Open { protocol: String, headers: String },
    Text(String),
    Binary(Vec<u8>),
    Closed(u16, String),
    Error(String),
}

/// Host listener that records every call.
#[derive(Debug, Default)]
pub struct RecordingListener {
    notes: Mutex<Vec<(Note, ConnectionHandle)>>,
}

impl RecordingListener {
    pub fn notes(&self) -> Vec<Note> {
        self.notes.lock().iter().map(|(note, _)| note.clone()).collect()
    }

    pub fn handles(&self) -> Vec<ConnectionHandle> {
        self.notes.lock().iter().map(|(_, handle)| *handle).collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notes()
            .into_iter()
            .filter_map(|note| match note {
                Note::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.notes.lock().len()
    }

    fn record(&self, note: Note, handle: ConnectionHandle) {
        self.notes.lock().push((note, handle));
    }
}

impl HostListener for RecordingListener {
    fn on_open(&self, protocol: &str, headers: &str, handle: ConnectionHandle) {
        self.record(
            Note::Open {
                protocol: protocol.to_string(),
                headers: headers.to_string(),
            },
            handle,
        );
    }

    fn on_string_message(&self, text: &str, handle: ConnectionHandle) {
        self.record(Note::Text(text.to_string()), handle);
    }

    fn on_binary_message(&self, bytes: &[u8], handle: ConnectionHandle) {
        self.record(Note::Binary(bytes.to_vec()), handle);
    }

    fn on_closed(&self, code: u16, reason: &str, handle: ConnectionHandle) {
        self.record(Note::Closed(code, reason.to_string()), handle);
    }

    fn on_error(&self, message: &str, handle: ConnectionHandle) {
        self.record(Note::Error(message.to_string()), handle);
    }
}

// ============================================================================
// LoopbackTransport
// ============================================================================

/// What the configurator handed to the transport.
#[derive(Debug, Clone)]
pub struct OpenRecord {
    pub uri: String,
    pub headers: Vec<(String, String)>,
    pub tls: bool,
    pub tcp_no_delay: bool,
    pub timeout: Option<Duration>,
}

impl OpenRecord {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// In-process transport whose sessions echo every message.
///
/// Nothing happens until the test drives a session.
#[derive(Default)]
pub struct LoopbackTransport {
    compression: bool,
    opened: Mutex<Vec<(OpenRecord, Arc<LoopbackSession>)>>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compression() -> Self {
        Self {
            compression: true,
            ..Self::default()
        }
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().len()
    }

    pub fn record(&self) -> Option<OpenRecord> {
        self.opened.lock().last().map(|(record, _)| record.clone())
    }

    pub fn session(&self) -> Option<Arc<LoopbackSession>> {
        self.opened.lock().last().map(|(_, session)| Arc::clone(session))
    }
}

impl Transport for LoopbackTransport {
    fn open(
        &self,
        request: TransportRequest,
        listener: Arc<dyn TransportListener>,
    ) -> Result<Arc<dyn TransportSession>> {
        let record = OpenRecord {
            uri: request.request.uri().to_string(),
            headers: request
                .request
                .headers()
                .iter()
                .map(|(n, v)| (n.as_str().to_string(), v.to_str().unwrap_or_default().to_string()))
                .collect(),
            tls: request.tls.is_some(),
            tcp_no_delay: request.tcp_no_delay,
            timeout: request.timeout,
        };

        let session = Arc::new(LoopbackSession::new(listener));
        self.opened.lock().push((record, Arc::clone(&session)));
        Ok(session)
    }

    fn supports_compression(&self) -> bool {
        self.compression
    }
}

// ============================================================================
// LoopbackSession
// ============================================================================

enum Outgoing {
    Text(String),
    Binary(Vec<u8>),
}

impl Outgoing {
    fn len(&self) -> u64 {
        match self {
            Self::Text(text) => text.len() as u64,
            Self::Binary(bytes) => bytes.len() as u64,
        }
    }
}

#[derive(Default)]
struct LoopState {
    open: bool,
    ended: bool,
    queued: Vec<Outgoing>,
    close: Option<(u16, String)>,
    close_calls: Vec<(u16, String)>,
}

/// One echo connection.
pub struct LoopbackSession {
    listener: Arc<dyn TransportListener>,
    state: Mutex<LoopState>,
}

impl LoopbackSession {
    fn new(listener: Arc<dyn TransportListener>) -> Self {
        Self {
            listener,
            state: Mutex::new(LoopState::default()),
        }
    }

    /// Completes the handshake and flushes queued sends as echoes.
    pub fn accept(&self, protocol: &str, headers: ResponseHeaders) {
        let queued = {
            let mut state = self.state.lock();
            state.open = true;
            std::mem::take(&mut state.queued)
        };

        self.listener.on_open(protocol.to_string(), headers);
        for message in queued {
            self.echo(message);
        }
    }

    /// Delivers a message from the peer.
    pub fn peer_text(&self, text: &str) {
        self.listener.on_text(text.to_string());
    }

    /// Simulates a peer close frame followed by the socket closing.
    pub fn peer_close(&self, code: u16, reason: &str) {
        self.listener.on_closing(self, code, reason.to_string());
        self.finish_close();
    }

    /// Completes a pending close handshake.
    pub fn finish_close(&self) {
        let close = {
            let mut state = self.state.lock();
            if state.ended {
                return;
            }
            state.ended = true;
            state.close.take()
        };

        let (code, reason) = close.unwrap_or((1006, String::new()));
        self.listener.on_closed(code, reason);
    }

    /// Fails the connection.
    pub fn fail(&self, message: &str) {
        self.state.lock().ended = true;
        self.listener.on_failure(message.to_string());
    }

    /// Every `close` call the session received, in order.
    pub fn close_calls(&self) -> Vec<(u16, String)> {
        self.state.lock().close_calls.clone()
    }

    fn push(&self, message: Outgoing) -> bool {
        let mut state = self.state.lock();
        if state.ended {
            return false;
        }
        if !state.open {
            state.queued.push(message);
            return true;
        }
        drop(state);

        self.echo(message);
        true
    }

    fn echo(&self, message: Outgoing) {
        match message {
            Outgoing::Text(text) => self.listener.on_text(text),
            Outgoing::Binary(bytes) => self.listener.on_binary(bytes),
        }
    }
}

impl TransportSession for LoopbackSession {
    fn send_text(&self, text: String) -> bool {
        self.push(Outgoing::Text(text))
    }

    fn send_binary(&self, bytes: Vec<u8>) -> bool {
        self.push(Outgoing::Binary(bytes))
    }

    fn close(&self, code: u16, reason: &str) -> bool {
        let mut state = self.state.lock();
        if state.ended {
            return false;
        }
        state.close_calls.push((code, reason.to_string()));
        state.close.get_or_insert_with(|| (code, reason.to_string()));
        true
    }

    fn queue_size(&self) -> u64 {
        self.state.lock().queued.iter().map(Outgoing::len).sum()
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// A client wired to a fresh host queue.
pub struct Harness {
    pub client: WebSocketClient,
    pub listener: Arc<RecordingListener>,
    pub host_loop: HostLoop,
}

impl Harness {
    pub fn run(&mut self) -> usize {
        self.host_loop.run_pending()
    }
}

pub fn harness(transport: Arc<dyn Transport>, options: ClientOptions) -> Harness {
    let listener = Arc::new(RecordingListener::default());
    let (queue, host_loop) = host_queue();

    let client = WebSocketClient::builder()
        .handle(7, 0xc0ffee)
        .listener(listener.clone())
        .executor(Arc::new(queue))
        .options(options)
        .transport(transport)
        .asset_root(env!("CARGO_MANIFEST_DIR"))
        .build()
        .expect("client");

    Harness {
        client,
        listener,
        host_loop,
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
