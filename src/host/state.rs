//! Connection state as seen from the host context.
//!
//! # State Machine
//!
//! ```text
//! Connecting ──Opened──▶ Open ──Closing / close()──▶ Closing ──Closed──▶ Closed
//!      │                   │                                             ▲
//!      └───────────────────┴────────────── Failed / Closed ─────────────┘
//! ```
//!
//! `Closed` is absorbing.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::protocol::{PendingEvent, ResponseHeaders};

// ============================================================================
// ReadyState
// ============================================================================

/// Lifecycle of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReadyState {
    /// Handshake in progress (or not yet started).
    #[default]
    Connecting,

    /// Upgrade completed; messages flow.
    Open,

    /// Close handshake started by either side.
    Closing,

    /// Connection gone.
    Closed,
}

impl ReadyState {
    /// Returns the numeric value used by browser-style WebSocket APIs.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Connecting => 0,
            Self::Open => 1,
            Self::Closing => 2,
            Self::Closed => 3,
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "CONNECTING",
            Self::Open => "OPEN",
            Self::Closing => "CLOSING",
            Self::Closed => "CLOSED",
        };
        f.write_str(name)
    }
}

// ============================================================================
// SessionState
// ============================================================================

/// Ready state plus what the server agreed to at open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    ready_state: ReadyState,
    protocol: String,
    extensions: String,
}

impl SessionState {
    /// Returns the ready state.
    #[inline]
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    /// Returns the negotiated subprotocol (empty if none).
    #[inline]
    #[must_use]
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Returns the negotiated extensions (empty if none).
    #[inline]
    #[must_use]
    pub fn extensions(&self) -> &str {
        &self.extensions
    }

    /// Records a locally initiated close.
    pub fn begin_close(&mut self) {
        if matches!(self.ready_state, ReadyState::Connecting | ReadyState::Open) {
            self.ready_state = ReadyState::Closing;
        }
    }

    /// Advances the state for a delivered event.
    pub fn apply(&mut self, event: &PendingEvent) {
        if self.ready_state == ReadyState::Closed {
            return;
        }

        match event {
            PendingEvent::Opened { protocol, headers } => {
                self.protocol.clone_from(protocol);
                self.extensions = ResponseHeaders::parse(headers)
                    .extensions()
                    .unwrap_or_default()
                    .to_string();
                if self.ready_state == ReadyState::Connecting {
                    self.ready_state = ReadyState::Open;
                }
            }
            PendingEvent::Closing { .. } => self.ready_state = ReadyState::Closing,
            PendingEvent::Closed { .. } | PendingEvent::Failed { .. } => {
                self.ready_state = ReadyState::Closed;
            }
            PendingEvent::TextMessage(_) | PendingEvent::BinaryMessage(_) => {}
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
