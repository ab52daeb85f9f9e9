//! Host-facing client.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`WebSocketClient`] | Connect, send, close, destroy |
//! | [`ClientBuilder`] | Fluent configuration builder |
//! | [`ClientOptions`] | Constructor-time options |
//! | [`ConnectionConfig`] | Frozen per-connect settings |
//! | [`ConnectionConfigurator`] | Turns settings into a transport session |

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder for clients.
pub mod builder;

/// Connection setup.
pub mod configurator;

/// Client implementation.
pub mod core;

/// Client options.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ClientBuilder;
pub use configurator::{ConnectionConfigurator, PERMESSAGE_DEFLATE_OFFER, normalize_url, origin_of};
pub use core::WebSocketClient;
pub use options::{ClientOptions, ConnectionConfig, DEFAULT_TIMEOUT_MS, join_protocols};
