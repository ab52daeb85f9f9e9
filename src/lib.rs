//! WebSocket Bridge - host-facing WebSocket client adapter.
//!
//! This library connects a host runtime (a game engine, a scripting VM,
//! an FFI caller) to WebSocket servers and reports every connection
//! event back on the host's own serial context.
//!
//! # Architecture
//!
//! Each connection is split across two contexts:
//!
//! - **Worker side (tokio)**: handshake, TLS, frame I/O on a shared pool
//! - **Host side**: notifications drained from a queue the host owns
//!
//! Key design principles:
//!
//! - Each [`WebSocketClient`] owns one connection, connected at most once
//! - Every event crosses to the host as one task, in arrival order
//! - A [`ConnectionHandle`] gates delivery; `destroy` silences it for good
//! - TLS trust comes from a host-supplied CA bundle or the platform roots
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use websocket_bridge::{ClientOptions, HostListener, WebSocketClient, host_queue};
//!
//! # fn example(listener: Arc<dyn HostListener>) -> websocket_bridge::Result<()> {
//! let (queue, mut host_loop) = host_queue();
//!
//! let client = WebSocketClient::builder()
//!     .handle(1, 0x5eed)
//!     .listener(listener)
//!     .executor(Arc::new(queue))
//!     .options(ClientOptions::new().with_header("User-Agent", "demo"))
//!     .build()?;
//!
//! client.connect("wss://echo.example.com/", "chat", Some("assets/cacert.pem"))?;
//! client.send_text("hello");
//!
//! // Once per host frame:
//! host_loop.run_pending();
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`WebSocketClient`], builder, options, configurator |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`host`] | Host listener, executor, handle registry, dispatcher |
//! | [`identifiers`] | Type-safe handle wrappers |
//! | [`protocol`] | Pending events and response headers |
//! | [`tls`] | CA bundle loading and certificate validation |
//! | [`transport`] | WebSocket transport layer (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Host-facing client.
///
/// Use [`WebSocketClient::builder()`] to create a configured client.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Host integration: listener, executor and delivery gate.
pub mod host;

/// Type-safe identifiers for host handles.
///
/// Newtype wrappers prevent mixing the identifier and the callback token.
pub mod identifiers;

/// Event and handshake types shared by transport and host.
pub mod protocol;

/// Trust store loading and server certificate validation.
pub mod tls;

/// WebSocket transport layer.
///
/// Internal module handling the worker pool and connection event loop.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{ClientBuilder, ClientOptions, ConnectionConfig, WebSocketClient, join_protocols};

// Error types
pub use error::{Error, Result};

// Host types
pub use host::{HostExecutor, HostListener, HostLoop, HostQueue, ReadyState, host_queue};

// Identifier types
pub use identifiers::{CallbackToken, ConnectionHandle, ConnectionId};

// Protocol types
pub use protocol::{PendingEvent, ResponseHeaders};
