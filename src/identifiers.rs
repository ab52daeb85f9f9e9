//! Type-safe identifiers for the host-side owner of a connection.
//!
//! The host refers to its side of a connection by two opaque integers: a
//! connection identifier and a callback token. This crate never
//! dereferences either value; it only hands them back on every
//! notification so the host can route the call.
//!
//! Zero is the host's "empty" sentinel. Both newtypes wrap [`NonZeroU64`],
//! so an emptied handle is expressed as `Option<ConnectionHandle>::None`
//! and a half-cleared handle cannot be represented.
//!
//! # Example
//!
//! ```
//! use websocket_bridge::ConnectionHandle;
//!
//! let handle = ConnectionHandle::from_raw(7, 0xdead_beef).expect("non-zero");
//! assert_eq!(handle.identifier().as_u64(), 7);
//! assert!(ConnectionHandle::from_raw(0, 1).is_none());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

// ============================================================================
// ConnectionId
// ============================================================================

/// Host-assigned connection identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(NonZeroU64);

impl ConnectionId {
    /// Creates an identifier, returning `None` for the empty sentinel (0).
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Returns the raw value passed back to the host.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// CallbackToken
// ============================================================================

/// Host-assigned callback token (typically the address of the host object).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackToken(NonZeroU64);

impl CallbackToken {
    /// Creates a token, returning `None` for the empty sentinel (0).
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Returns the raw value passed back to the host.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for CallbackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

// ============================================================================
// ConnectionHandle
// ============================================================================

/// The (identifier, callback token) pair naming the host-side owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionHandle {
    identifier: ConnectionId,
    callback_token: CallbackToken,
}

impl ConnectionHandle {
    /// Creates a handle from its two typed halves.
    #[inline]
    #[must_use]
    pub const fn new(identifier: ConnectionId, callback_token: CallbackToken) -> Self {
        Self {
            identifier,
            callback_token,
        }
    }

    /// Creates a handle from raw host integers.
    ///
    /// Returns `None` if either value is the empty sentinel.
    #[inline]
    #[must_use]
    pub const fn from_raw(identifier: u64, callback_token: u64) -> Option<Self> {
        match (ConnectionId::new(identifier), CallbackToken::new(callback_token)) {
            (Some(identifier), Some(callback_token)) => Some(Self::new(identifier, callback_token)),
            _ => None,
        }
    }

    /// Returns the connection identifier.
    #[inline]
    #[must_use]
    pub const fn identifier(&self) -> ConnectionId {
        self.identifier
    }

    /// Returns the callback token.
    #[inline]
    #[must_use]
    pub const fn callback_token(&self) -> CallbackToken {
        self.callback_token
    }

    /// Returns both halves as raw host integers.
    #[inline]
    #[must_use]
    pub const fn to_raw(&self) -> (u64, u64) {
        (self.identifier.as_u64(), self.callback_token.as_u64())
    }
}

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.identifier, self.callback_token)
    }
}

// ============================================================================
// Tests
// ============================================================================
