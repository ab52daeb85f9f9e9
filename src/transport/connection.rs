//! tokio-tungstenite transport and event loop.
//!
//! [`TungsteniteTransport::open`] spawns one task per connection on the
//! work pool. The task performs the handshake, reports `on_open`, then
//! runs a `select!` loop over:
//!
//! - incoming frames from the peer
//! - commands from the [`TungsteniteSession`] (send, close)
//!
//! Commands issued while the handshake is still running stay queued in
//! the channel and are handled once the loop starts.
//!
//! # Terminal Events
//!
//! | Situation | Listener call |
//! |-----------|---------------|
//! | stream ends after a close frame | `on_closed(code, reason)` of that frame |
//! | stream ends without one | `on_closed(1006, "")` |
//! | handshake, read or write error | `on_failure(message)` |
//! | handshake or a write exceeds the timeout | `on_failure("... timed out ...")` |
//!
//! The timeout never applies to reads once the connection is open; a quiet
//! connection stays up until either side closes it.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream, connect_async_tls_with_config};
use tracing::{debug, trace, warn};

use crate::error::{Result, non_empty_message};
use crate::protocol::{CLOSE_ABNORMAL, CLOSE_NO_STATUS, ResponseHeaders};

use super::pool::work_pool;
use super::{Transport, TransportListener, TransportRequest, TransportSession};

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

type WsWrite = SplitSink<WsStream, Message>;

/// Commands from the session to the event loop.
enum SessionCommand {
    /// Write a data frame; `len` bytes were counted as queued.
    Send { message: Message, len: u64 },

    /// Start the close handshake.
    Close { code: u16, reason: String },
}

/// Result of one write attempt.
enum WriteOutcome {
    Written,
    /// Socket already closing; the read side reports the end.
    Closed,
    Failed(String),
}

// ============================================================================
// TungsteniteTransport
// ============================================================================

/// [`Transport`] backed by tokio-tungstenite on the work pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteTransport;

impl TungsteniteTransport {
    /// Creates the transport.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Transport for TungsteniteTransport {
    fn open(
        &self,
        request: TransportRequest,
        listener: Arc<dyn TransportListener>,
    ) -> Result<Arc<dyn TransportSession>> {
        let runtime = work_pool()?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let session = Arc::new(TungsteniteSession {
            command_tx,
            queued: AtomicU64::new(0),
        });

        runtime.spawn(run_connection(
            request,
            listener,
            Arc::clone(&session),
            command_rx,
        ));

        Ok(session)
    }
}

// ============================================================================
// TungsteniteSession
// ============================================================================

/// Session handle for a tokio-tungstenite connection.
pub struct TungsteniteSession {
    command_tx: mpsc::UnboundedSender<SessionCommand>,
    queued: AtomicU64,
}

impl TungsteniteSession {
    fn enqueue(&self, message: Message, len: u64) -> bool {
        self.queued.fetch_add(len, Ordering::SeqCst);

        if self
            .command_tx
            .send(SessionCommand::Send { message, len })
            .is_err()
        {
            self.queued.fetch_sub(len, Ordering::SeqCst);
            return false;
        }

        true
    }
}

impl TransportSession for TungsteniteSession {
    fn send_text(&self, text: String) -> bool {
        let len = text.len() as u64;
        self.enqueue(Message::text(text), len)
    }

    fn send_binary(&self, bytes: Vec<u8>) -> bool {
        let len = bytes.len() as u64;
        self.enqueue(Message::binary(bytes), len)
    }

    fn close(&self, code: u16, reason: &str) -> bool {
        self.command_tx
            .send(SessionCommand::Close {
                code,
                reason: reason.to_string(),
            })
            .is_ok()
    }

    fn queue_size(&self) -> u64 {
        self.queued.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for TungsteniteSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TungsteniteSession")
            .field("queued", &self.queue_size())
            .field("closed", &self.command_tx.is_closed())
            .finish()
    }
}

// ============================================================================
// Connection Task
// ============================================================================

async fn run_connection(
    request: TransportRequest,
    listener: Arc<dyn TransportListener>,
    session: Arc<TungsteniteSession>,
    command_rx: mpsc::UnboundedReceiver<SessionCommand>,
) {
    let TransportRequest {
        request,
        tls,
        tcp_no_delay,
        timeout: io_timeout,
    } = request;

    let uri = request.uri().to_string();
    debug!(%uri, tls = tls.is_some(), tcp_no_delay, ?io_timeout, "Connecting");

    let connector = tls.map(Connector::Rustls);
    let connect = connect_async_tls_with_config(request, None, tcp_no_delay, connector);

    let connected = match io_timeout {
        Some(limit) => match timeout(limit, connect).await {
            Ok(result) => result,
            Err(_) => {
                warn!(%uri, "Connect timed out");
                listener.on_failure(format!("connect timed out after {} ms", limit.as_millis()));
                return;
            }
        },
        None => connect.await,
    };

    let (ws_stream, response) = match connected {
        Ok(pair) => pair,
        Err(e) => {
            warn!(%uri, error = %e, "Handshake failed");
            listener.on_failure(failure_message(&e));
            return;
        }
    };

    let headers = ResponseHeaders::from_header_map(response.headers());
    let protocol = headers.protocol().unwrap_or_default().to_string();

    debug!(%uri, %protocol, "WebSocket opened");
    listener.on_open(protocol, headers);

    run_event_loop(ws_stream, listener, session, command_rx, io_timeout).await;

    debug!(%uri, "Event loop terminated");
}

async fn run_event_loop(
    ws_stream: WsStream,
    listener: Arc<dyn TransportListener>,
    session: Arc<TungsteniteSession>,
    mut command_rx: mpsc::UnboundedReceiver<SessionCommand>,
    io_timeout: Option<Duration>,
) {
    let (mut ws_write, mut ws_read) = ws_stream.split();

    let mut last_close: Option<(u16, String)> = None;
    let mut close_sent = false;

    loop {
        tokio::select! {
            message = ws_read.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        trace!(len = text.len(), "Text frame received");
                        listener.on_text(text.as_str().to_owned());
                    }

                    Some(Ok(Message::Binary(bytes))) => {
                        trace!(len = bytes.len(), "Binary frame received");
                        listener.on_binary(bytes.to_vec());
                    }

                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (u16::from(f.code), f.reason.as_str().to_owned()))
                            .unwrap_or((CLOSE_NO_STATUS, String::new()));

                        debug!(code, %reason, "Close frame received");
                        last_close = Some((code, reason.clone()));
                        listener.on_closing(session.as_ref(), code, reason);
                    }

                    // Ping/Pong are answered by tungstenite.
                    Some(Ok(_)) => {}

                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket read failed");
                        listener.on_failure(failure_message(&e));
                        return;
                    }

                    None => {
                        let (code, reason) =
                            last_close.take().unwrap_or((CLOSE_ABNORMAL, String::new()));
                        debug!(code, %reason, "WebSocket closed");
                        listener.on_closed(code, reason);
                        return;
                    }
                }
            }

            command = command_rx.recv() => {
                let outcome = match command {
                    Some(SessionCommand::Send { message, len }) => {
                        let outcome = write(&mut ws_write, message, io_timeout).await;
                        session.queued.fetch_sub(len, Ordering::SeqCst);
                        outcome
                    }

                    Some(SessionCommand::Close { code, reason }) => {
                        if close_sent {
                            trace!(code, "Close already sent");
                            WriteOutcome::Written
                        } else {
                            close_sent = true;
                            debug!(code, %reason, "Sending close frame");
                            let frame = CloseFrame {
                                code: CloseCode::from(code),
                                reason: reason.into(),
                            };
                            write(&mut ws_write, Message::Close(Some(frame)), io_timeout).await
                        }
                    }

                    None => {
                        debug!("Command channel closed");
                        WriteOutcome::Closed
                    }
                };

                match outcome {
                    WriteOutcome::Written => {}
                    WriteOutcome::Closed => trace!("Write skipped, connection closing"),
                    WriteOutcome::Failed(message) => {
                        warn!(error = %message, "WebSocket write failed");
                        listener.on_failure(message);
                        return;
                    }
                }
            }
        }
    }
}

async fn write(ws_write: &mut WsWrite, message: Message, io_timeout: Option<Duration>) -> WriteOutcome {
    let result = match io_timeout {
        Some(limit) => match timeout(limit, ws_write.send(message)).await {
            Ok(result) => result,
            Err(_) => {
                return WriteOutcome::Failed(format!(
                    "write timed out after {} ms",
                    limit.as_millis()
                ));
            }
        },
        None => ws_write.send(message).await,
    };

    match result {
        Ok(()) => WriteOutcome::Written,
        Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => WriteOutcome::Closed,
        Err(e) => WriteOutcome::Failed(failure_message(&e)),
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Describes a tungstenite error for the host.
///
/// Falls back to the variant name when the error has no text, and to the
/// generic placeholder after that.
fn failure_message(err: &WsError) -> String {
    let text = err.to_string();
    if !text.trim().is_empty() {
        return text;
    }

    let debug = format!("{err:?}");
    let kind = debug.split(['(', ' ', '{']).next().unwrap_or_default();
    non_empty_message(kind)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;

    use parking_lot::Mutex;

    use crate::error::Error;
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;

    #[test]
    fn test_failure_message_uses_display() {
        let err = WsError::Io(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer"));
        assert!(failure_message(&err).contains("reset by peer"));
        assert!(!failure_message(&WsError::ConnectionClosed).is_empty());
    }

    #[test]
    fn test_socket_failure_reaches_host_as_transport_error() {
        let err = WsError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"));
        let error = Error::transport(failure_message(&err));
        assert!(error.is_transport_error());
        assert!(error.notification_message().contains("broken pipe"));
    }

    #[test]
    fn test_session_counts_queued_bytes() {
        let (command_tx, mut command_rx) = mpsc::unbounded_channel();
        let session = TungsteniteSession {
            command_tx,
            queued: AtomicU64::new(0),
        };

        assert!(session.send_text("hello".into()));
        assert!(session.send_binary(vec![0; 10]));
        assert_eq!(session.queue_size(), 15);
        assert!(session.close(1000, "bye"));

        assert!(matches!(
            command_rx.try_recv(),
            Ok(SessionCommand::Send { len: 5, .. })
        ));
        assert!(matches!(
            command_rx.try_recv(),
            Ok(SessionCommand::Send { len: 10, .. })
        ));
        assert!(matches!(
            command_rx.try_recv(),
            Ok(SessionCommand::Close { code: 1000, .. })
        ));
    }

    #[test]
    fn test_session_after_loop_gone() {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        drop(command_rx);
        let session = TungsteniteSession {
            command_tx,
            queued: AtomicU64::new(0),
        };

        assert!(!session.send_text("late".into()));
        assert!(!session.close(1000, ""));
        assert_eq!(session.queue_size(), 0);
    }

    #[tokio::test]
    async fn test_refused_connection_reports_failure() {
        #[derive(Default)]
        struct Failures(Mutex<Vec<String>>);

        impl TransportListener for Failures {
            fn on_open(&self, _: String, _: ResponseHeaders) {
                panic!("must not open");
            }
            fn on_text(&self, _: String) {}
            fn on_binary(&self, _: Vec<u8>) {}
            fn on_closing(&self, _: &dyn TransportSession, _: u16, _: String) {}
            fn on_closed(&self, _: u16, _: String) {}
            fn on_failure(&self, message: String) {
                self.0.lock().push(message);
            }
        }

        // Bind then drop to get a port nobody listens on.
        let port = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
            listener.local_addr().expect("addr").port()
        };

        let request = format!("ws://127.0.0.1:{port}/")
            .into_client_request()
            .expect("request");

        let failures = Arc::new(Failures::default());
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let session = Arc::new(TungsteniteSession {
            command_tx,
            queued: AtomicU64::new(0),
        });

        run_connection(
            TransportRequest {
                request,
                tls: None,
                tcp_no_delay: true,
                timeout: Some(Duration::from_secs(5)),
            },
            failures.clone(),
            session,
            command_rx,
        )
        .await;

        let failures = failures.0.lock();
        assert_eq!(failures.len(), 1);
        assert!(!failures[0].is_empty());
    }
}
