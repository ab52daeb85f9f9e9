//! Transport event types.
//!
//! Events are produced by the transport (on its own worker threads) and
//! consumed exactly once by the [`EventDispatcher`](crate::host::EventDispatcher)
//! on the host context. They are never persisted.
//!
//! # Event Types
//!
//! | Event | Host notification |
//! |-------|-------------------|
//! | `Opened` | `on_open` |
//! | `TextMessage` | `on_string_message` |
//! | `BinaryMessage` | `on_binary_message` |
//! | `Closing` | none (acknowledged on the transport, host sees `Closed`) |
//! | `Closed` | `on_closed` |
//! | `Failed` | `on_error` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::error::non_empty_message;

// ============================================================================
// Close Codes
// ============================================================================

/// Normal closure (RFC 6455 section 7.4.1).
pub const CLOSE_NORMAL: u16 = 1000;

/// Reason sent with [`CLOSE_NORMAL`] when the host does not supply one.
pub const CLOSE_NORMAL_REASON: &str = "normal closure";

/// Reported when the peer's close frame carried no status code.
pub const CLOSE_NO_STATUS: u16 = 1005;

/// Reported when the connection dropped without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;

// ============================================================================
// PendingEvent
// ============================================================================

/// One transport event awaiting delivery to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingEvent {
    /// Upgrade completed.
    Opened {
        /// Negotiated subprotocol (empty if none).
        protocol: String,
        /// Response headers in `Name: value\n` form.
        headers: String,
    },

    /// Text frame received.
    TextMessage(String),

    /// Binary frame received.
    BinaryMessage(Vec<u8>),

    /// Peer started the close handshake.
    Closing {
        /// Close status code.
        code: u16,
        /// Close reason.
        reason: String,
    },

    /// Close handshake finished; the connection is gone.
    Closed {
        /// Close status code.
        code: u16,
        /// Close reason.
        reason: String,
    },

    /// Transport failure; the connection is gone.
    Failed {
        /// Non-empty failure description.
        message: String,
    },
}

impl PendingEvent {
    /// Creates a failure event, substituting a placeholder for blank text.
    #[inline]
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: non_empty_message(message),
        }
    }

    /// Returns a short name for logging.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Opened { .. } => "opened",
            Self::TextMessage(_) => "text",
            Self::BinaryMessage(_) => "binary",
            Self::Closing { .. } => "closing",
            Self::Closed { .. } => "closed",
            Self::Failed { .. } => "failed",
        }
    }

    /// Returns `true` if no further events follow this one.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed { .. } | Self::Failed { .. })
    }
}

impl fmt::Display for PendingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Opened { protocol, .. } => write!(f, "opened (protocol={protocol:?})"),
            Self::TextMessage(text) => write!(f, "text ({} bytes)", text.len()),
            Self::BinaryMessage(bytes) => write!(f, "binary ({} bytes)", bytes.len()),
            Self::Closing { code, reason } => write!(f, "closing {code} {reason:?}"),
            Self::Closed { code, reason } => write!(f, "closed {code} {reason:?}"),
            Self::Failed { message } => write!(f, "failed: {message}"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
