//! WebSocket transport layer.
//!
//! The transport owns the socket. It runs on the process-wide work pool
//! and pushes every event into a [`TransportListener`]; the client talks
//! back to it through a [`TransportSession`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   TransportRequest   ┌──────────────────────┐
//! │ Configurator     │─────────────────────►│ Transport::open      │
//! └──────────────────┘                      │  (work pool task)    │
//!                                           │                      │
//! ┌──────────────────┐  send/close/queue    │  event loop          │
//! │ WebSocketClient  │─────────────────────►│  TransportSession    │
//! └──────────────────┘                      │                      │
//! ┌──────────────────┐  on_open/on_text/... │                      │
//! │ EventDispatcher  │◄─────────────────────│  TransportListener   │
//! └──────────────────┘                      └──────────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | tokio-tungstenite transport and event loop |
//! | `pool` | Process-wide work pool |

// ============================================================================
// Submodules
// ============================================================================

/// tokio-tungstenite transport.
pub mod connection;

/// Process-wide work pool.
pub mod pool;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rustls::ClientConfig;
use tokio_tungstenite::tungstenite::handshake::client::Request;

use crate::error::Result;
use crate::protocol::ResponseHeaders;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{TungsteniteSession, TungsteniteTransport};
pub use pool::work_pool;

// ============================================================================
// TransportRequest
// ============================================================================

/// Everything the transport needs to open one connection.
pub struct TransportRequest {
    /// Upgrade request, including extra headers.
    pub request: Request,

    /// TLS configuration; `Some` for `wss://`.
    pub tls: Option<Arc<ClientConfig>>,

    /// Disable Nagle's algorithm on the TCP socket.
    pub tcp_no_delay: bool,

    /// Handshake and per-write timeout; `None` disables both.
    pub timeout: Option<Duration>,
}

impl fmt::Debug for TransportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportRequest")
            .field("uri", self.request.uri())
            .field("headers", &self.request.headers().len())
            .field("tls", &self.tls.is_some())
            .field("tcp_no_delay", &self.tcp_no_delay)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ============================================================================
// Transport
// ============================================================================

/// Opens WebSocket connections.
pub trait Transport: Send + Sync {
    /// Starts connecting and returns the session immediately.
    ///
    /// All outcomes after this point, including handshake failures, are
    /// delivered to `listener`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the connect attempt cannot be started.
    fn open(
        &self,
        request: TransportRequest,
        listener: Arc<dyn TransportListener>,
    ) -> Result<Arc<dyn TransportSession>>;

    /// Returns `true` if the transport can inflate `permessage-deflate`
    /// frames.
    fn supports_compression(&self) -> bool {
        false
    }
}

// ============================================================================
// TransportSession
// ============================================================================

/// Handle to one live (or connecting) connection.
///
/// Sends and closes issued before the handshake completes are queued and
/// flushed once the connection opens.
pub trait TransportSession: Send + Sync {
    /// Queues a text message. Returns `false` if the connection is gone.
    fn send_text(&self, text: String) -> bool;

    /// Queues a binary message. Returns `false` if the connection is gone.
    fn send_binary(&self, bytes: Vec<u8>) -> bool;

    /// Starts the close handshake. Returns `false` if the connection is gone.
    fn close(&self, code: u16, reason: &str) -> bool;

    /// Returns the bytes queued but not yet written.
    fn queue_size(&self) -> u64;
}

// ============================================================================
// TransportListener
// ============================================================================

/// Receives transport events, possibly on transport worker threads.
///
/// For one connection, calls are never concurrent and arrive in emission
/// order. Exactly one of `on_closed` or `on_failure` ends the sequence.
pub trait TransportListener: Send + Sync {
    /// The upgrade completed.
    fn on_open(&self, protocol: String, headers: ResponseHeaders);

    /// A text message arrived.
    fn on_text(&self, text: String);

    /// A binary message arrived.
    fn on_binary(&self, bytes: Vec<u8>);

    /// The peer sent a close frame.
    fn on_closing(&self, session: &dyn TransportSession, code: u16, reason: String);

    /// The connection closed cleanly.
    fn on_closed(&self, code: u16, reason: String);

    /// The connection failed.
    fn on_failure(&self, message: String);
}
