//! Error types for the WebSocket bridge.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use websocket_bridge::{Result, WebSocketClient};
//!
//! fn open(client: &WebSocketClient) -> Result<()> {
//!     client.connect("wss://echo.example.com/socket", "", None)?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants | Reported to host |
//! |----------|----------|------------------|
//! | Configuration | [`Error::InvalidUrl`], [`Error::InvalidHeader`], [`Error::TlsConfig`], [`Error::Config`] | once, via `on_error` |
//! | Lifecycle | [`Error::AlreadyConnected`] | never |
//! | Transport | [`Error::Transport`] | via `on_error`, terminal |
//! | External | [`Error::Io`], [`Error::Json`] | depends on call site |
//!
//! Socket and TLS library errors are flattened to text at the point they
//! occur and arrive as [`Error::Transport`] or [`Error::TlsConfig`].
//!
//! Errors that reach the host are turned into text with
//! [`Error::notification_message`], which never yields an empty string.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Message delivered to the host for a malformed connection URL.
pub const INVALID_URL_MESSAGE: &str = "invalid url";

/// Placeholder delivered when an underlying failure carries no text.
pub const UNKNOWN_ERROR_MESSAGE: &str = "unknown error";

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Malformed connection URL.
    ///
    /// Returned when the URL cannot be parsed or uses a scheme other than
    /// `ws`, `wss`, `http` or `https`.
    #[error("Invalid URL: {url}")]
    InvalidUrl {
        /// The URL as supplied by the host.
        url: String,
    },

    /// Header name or value rejected while building the upgrade request.
    #[error("Invalid header: {message}")]
    InvalidHeader {
        /// Description of the rejected header.
        message: String,
    },

    /// Trust store load/parse or crypto provider failure.
    ///
    /// Fatal for the connect attempt that produced it.
    #[error("TLS configuration error: {message}")]
    TlsConfig {
        /// Description of the TLS failure.
        message: String,
    },

    /// Client configuration error.
    ///
    /// Returned when the client builder or options are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// `connect` was called more than once on the same client.
    #[error("Client already connected; create a new client to reconnect")]
    AlreadyConnected,

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Socket or protocol failure reported by the transport.
    #[error("Transport failure: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an invalid URL error.
    #[inline]
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an invalid header error.
    #[inline]
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Creates a TLS configuration error.
    #[inline]
    pub fn tls_config(message: impl Into<String>) -> Self {
        Self::TlsConfig {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a transport failure.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error aborts a connect attempt before a
    /// session exists.
    #[inline]
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl { .. }
                | Self::InvalidHeader { .. }
                | Self::TlsConfig { .. }
                | Self::Config { .. }
        )
    }

    /// Returns `true` if this is a post-connect transport failure.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Returns the text delivered to the host's `on_error` entry point.
    ///
    /// URL errors always read `"invalid url"`. Other variants carry the
    /// underlying message without the category prefix. The result is
    /// never empty.
    #[must_use]
    pub fn notification_message(&self) -> String {
        let message = match self {
            Self::InvalidUrl { .. } => return INVALID_URL_MESSAGE.to_string(),
            Self::InvalidHeader { message }
            | Self::TlsConfig { message }
            | Self::Config { message }
            | Self::Transport { message } => message.clone(),
            Self::AlreadyConnected => self.to_string(),
            Self::Io(e) => e.to_string(),
            Self::Json(e) => e.to_string(),
        };

        non_empty_message(message)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Replaces a blank message with [`UNKNOWN_ERROR_MESSAGE`].
#[inline]
#[must_use]
pub fn non_empty_message(message: impl Into<String>) -> String {
    let message = message.into();
    if message.trim().is_empty() {
        UNKNOWN_ERROR_MESSAGE.to_string()
    } else {
        message
    }
}

// ============================================================================
// Tests
// ============================================================================
