//! The host's notification entry points.

// ============================================================================
// Imports
// ============================================================================

use crate::identifiers::ConnectionHandle;

// ============================================================================
// HostListener
// ============================================================================

/// One-way notifications into the host.
///
/// Every call runs on the host's serial context and carries the live
/// [`ConnectionHandle`] last. No call is made after the handle has been
/// invalidated.
pub trait HostListener: Send + Sync {
    /// The upgrade completed.
    ///
    /// `protocol` is the negotiated subprotocol (empty if none);
    /// `headers` is the response header text, one `Name: value` per line.
    fn on_open(&self, protocol: &str, headers: &str, handle: ConnectionHandle);

    /// A text message arrived.
    fn on_string_message(&self, text: &str, handle: ConnectionHandle);

    /// A binary message arrived.
    fn on_binary_message(&self, bytes: &[u8], handle: ConnectionHandle);

    /// The connection closed.
    fn on_closed(&self, code: u16, reason: &str, handle: ConnectionHandle);

    /// The connection failed or could not be configured.
    ///
    /// `message` is never empty.
    fn on_error(&self, message: &str, handle: ConnectionHandle);
}
