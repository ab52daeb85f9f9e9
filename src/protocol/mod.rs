//! Event and handshake types exchanged between transport and host.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `event` | [`PendingEvent`] and close codes |
//! | `headers` | [`ResponseHeaders`] text format |

// ============================================================================
// Submodules
// ============================================================================

/// Transport event types.
pub mod event;

/// Handshake response header text.
pub mod headers;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::{CLOSE_ABNORMAL, CLOSE_NO_STATUS, CLOSE_NORMAL, CLOSE_NORMAL_REASON, PendingEvent};
pub use headers::{ResponseHeaders, SEC_WEBSOCKET_EXTENSIONS, SEC_WEBSOCKET_PROTOCOL};
