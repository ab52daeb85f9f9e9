//! Host-side plumbing: liveness, scheduling and notification.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `dispatcher` | [`EventDispatcher`], transport events to host calls |
//! | `executor` | [`HostExecutor`] seam and the channel-backed [`host_queue`] |
//! | `listener` | [`HostListener`], the five host entry points |
//! | `registry` | [`HandleRegistry`], the lock-guarded handle |
//! | `state` | [`ReadyState`] and negotiated values |

// ============================================================================
// Submodules
// ============================================================================

/// Transport-to-host event marshalling.
pub mod dispatcher;

/// Host serial context.
pub mod executor;

/// Host notification entry points.
pub mod listener;

/// Handle liveness guard.
pub mod registry;

/// Connection state.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use dispatcher::EventDispatcher;
pub use executor::{HostExecutor, HostLoop, HostQueue, HostTask, host_queue};
pub use listener::HostListener;
pub use registry::HandleRegistry;
pub use state::{ReadyState, SessionState};
