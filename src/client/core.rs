//! The host-facing WebSocket client.
//!
//! A [`WebSocketClient`] owns one logical connection. It is connected at
//! most once; reconnecting means building a new client.
//!
//! # Lifecycle
//!
//! | Call | Effect |
//! |------|--------|
//! | `connect` | configures and opens the transport |
//! | `send_text` / `send_binary` | forwards to the session |
//! | `close` / `close_normal` | starts the close handshake |
//! | `destroy` / drop | invalidates the handle; the socket is left alone |
//!
//! # Example
//!
//! ```no_run
//! # use websocket_bridge::WebSocketClient;
//! # fn example(client: &WebSocketClient) -> websocket_bridge::Result<()> {
//! client.connect("wss://echo.example.com/socket", "chat", None)?;
//! client.send_text("hello");
//! client.close_normal();
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::host::{EventDispatcher, HandleRegistry, HostExecutor, HostListener, ReadyState, SessionState};
use crate::identifiers::ConnectionHandle;
use crate::protocol::{CLOSE_NORMAL, CLOSE_NORMAL_REASON};
use crate::tls::{AssetResolver, TrustManager};
use crate::transport::{Transport, TransportSession};

use super::builder::ClientBuilder;
use super::configurator::ConnectionConfigurator;
use super::options::{ClientOptions, ConnectionConfig};

// ============================================================================
// Types
// ============================================================================

/// Validated pieces handed over by [`ClientBuilder`].
pub(crate) struct ClientParts {
    pub handle: ConnectionHandle,
    pub listener: Arc<dyn HostListener>,
    pub executor: Arc<dyn HostExecutor>,
    pub options: ClientOptions,
    pub transport: Arc<dyn Transport>,
    pub assets: Arc<dyn AssetResolver>,
    pub trust: TrustManager,
}

/// Where the client is in its single connect attempt.
enum ConnectPhase {
    /// `connect` not yet called.
    Idle,
    /// `connect` called but configuration failed.
    Aborted,
    /// Session handed out by the transport.
    Connected(Arc<dyn TransportSession>),
}

// ============================================================================
// WebSocketClient
// ============================================================================

/// One host-owned WebSocket connection.
pub struct WebSocketClient {
    registry: Arc<HandleRegistry>,
    dispatcher: EventDispatcher,
    state: Arc<Mutex<SessionState>>,
    options: ClientOptions,
    transport: Arc<dyn Transport>,
    assets: Arc<dyn AssetResolver>,
    trust: TrustManager,
    phase: Mutex<ConnectPhase>,
}

// ============================================================================
// WebSocketClient - Display
// ============================================================================

impl fmt::Debug for WebSocketClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketClient")
            .field("handle", &self.handle())
            .field("ready_state", &self.ready_state())
            .field("buffered_amount", &self.buffered_amount())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// WebSocketClient - Public API
// ============================================================================

impl WebSocketClient {
    /// Creates a configuration builder for the client.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Opens the connection.
    ///
    /// `subprotocol` may list several protocols separated by `", "` (see
    /// [`join_protocols`](super::options::join_protocols)); empty means
    /// none. `ca_bundle_path` is only used for `wss://`.
    ///
    /// Configuration failures are scheduled for the host's `on_error`
    /// before this returns, and also returned here.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyConnected`] on any call after the first
    /// - [`Error::InvalidUrl`], [`Error::InvalidHeader`],
    ///   [`Error::TlsConfig`] if configuration fails
    pub fn connect(&self, url: &str, subprotocol: &str, ca_bundle_path: Option<&str>) -> Result<()> {
        let mut phase = self.phase.lock();
        if !matches!(*phase, ConnectPhase::Idle) {
            warn!(%url, "connect called twice on one client");
            return Err(Error::AlreadyConnected);
        }

        let config = ConnectionConfig::new(&self.options, url, subprotocol, ca_bundle_path);
        let configurator =
            ConnectionConfigurator::new(self.transport.as_ref(), self.assets.as_ref(), &self.trust);

        match configurator.connect(&config, &self.dispatcher) {
            Ok(session) => {
                debug!(%url, "Connect issued");
                *phase = ConnectPhase::Connected(session);
                Ok(())
            }
            Err(e) => {
                *phase = ConnectPhase::Aborted;
                Err(e)
            }
        }
    }

    /// Sends a text message.
    ///
    /// Returns `false` (and logs) if there is no session or it has ended.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        match self.session() {
            Some(session) => session.send_text(text.into()),
            None => {
                warn!("send_text before connect, message dropped");
                false
            }
        }
    }

    /// Sends a binary message.
    ///
    /// Returns `false` (and logs) if there is no session or it has ended.
    pub fn send_binary(&self, bytes: impl Into<Vec<u8>>) -> bool {
        match self.session() {
            Some(session) => session.send_binary(bytes.into()),
            None => {
                warn!("send_binary before connect, message dropped");
                false
            }
        }
    }

    /// Starts the close handshake.
    ///
    /// Does not invalidate the handle; the host still receives
    /// `on_closed`. Before the connection opens the close is queued.
    pub fn close(&self, code: u16, reason: &str) -> bool {
        match self.session() {
            Some(session) => {
                self.state.lock().begin_close();
                debug!(code, %reason, "Close requested");
                session.close(code, reason)
            }
            None => {
                warn!(code, "close before connect ignored");
                false
            }
        }
    }

    /// Closes with 1000 `"normal closure"`.
    #[inline]
    pub fn close_normal(&self) -> bool {
        self.close(CLOSE_NORMAL, CLOSE_NORMAL_REASON)
    }

    /// Returns the bytes queued for sending; 0 before a session exists.
    #[must_use]
    pub fn buffered_amount(&self) -> u64 {
        self.session().map_or(0, |session| session.queue_size())
    }

    /// Detaches the host: no notification is issued after this returns.
    ///
    /// The socket is not closed. Returns `true` on the first call.
    pub fn destroy(&self) -> bool {
        self.registry.invalidate()
    }

    /// Returns the live handle, or `None` after [`destroy`](Self::destroy).
    #[inline]
    #[must_use]
    pub fn handle(&self) -> Option<ConnectionHandle> {
        self.registry.snapshot()
    }

    /// Returns the connection state as last seen by the host context.
    #[inline]
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        self.state.lock().ready_state()
    }

    /// Returns the negotiated subprotocol (empty if none or not yet open).
    #[must_use]
    pub fn protocol(&self) -> String {
        self.state.lock().protocol().to_string()
    }

    /// Returns the negotiated extensions (empty if none or not yet open).
    #[must_use]
    pub fn extensions(&self) -> String {
        self.state.lock().extensions().to_string()
    }

    /// Returns the constructor-time options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }
}

// ============================================================================
// WebSocketClient - Internal API
// ============================================================================

impl WebSocketClient {
    pub(crate) fn new(parts: ClientParts) -> Self {
        let registry = Arc::new(HandleRegistry::new(parts.handle));
        let state = Arc::new(Mutex::new(SessionState::default()));
        let dispatcher = EventDispatcher::new(
            Arc::clone(&registry),
            parts.listener,
            parts.executor,
            Arc::clone(&state),
        );

        debug!(handle = %parts.handle, "Client created");

        Self {
            registry,
            dispatcher,
            state,
            options: parts.options,
            transport: parts.transport,
            assets: parts.assets,
            trust: parts.trust,
            phase: Mutex::new(ConnectPhase::Idle),
        }
    }

    fn session(&self) -> Option<Arc<dyn TransportSession>> {
        match &*self.phase.lock() {
            ConnectPhase::Connected(session) => Some(Arc::clone(session)),
            ConnectPhase::Idle | ConnectPhase::Aborted => None,
        }
    }
}

impl Drop for WebSocketClient {
    fn drop(&mut self) {
        self.registry.invalidate();
    }
}

// ============================================================================
// Tests
// ============================================================================
