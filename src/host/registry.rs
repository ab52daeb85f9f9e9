//! Liveness guard for the host-side connection owner.
//!
//! [`HandleRegistry`] holds the [`ConnectionHandle`] behind one re-entrant
//! lock. Every dispatch reads it under that lock and keeps the lock for
//! the whole host call, so once [`invalidate`](HandleRegistry::invalidate)
//! returns no further notification can use the handle.
//!
//! Because the lock is re-entrant, a host may call `destroy()` from inside
//! one of its own notifications. The in-progress notification finishes;
//! nothing after it is delivered.

// ============================================================================
// Imports
// ============================================================================

use std::cell::Cell;
use std::fmt;

use parking_lot::ReentrantMutex;
use tracing::debug;

use crate::identifiers::ConnectionHandle;

// ============================================================================
// HandleRegistry
// ============================================================================

/// Lock-guarded `Option<ConnectionHandle>`.
pub struct HandleRegistry {
    handle: ReentrantMutex<Cell<Option<ConnectionHandle>>>,
}

impl HandleRegistry {
    /// Creates a registry holding a live handle.
    #[inline]
    #[must_use]
    pub fn new(handle: ConnectionHandle) -> Self {
        Self {
            handle: ReentrantMutex::new(Cell::new(Some(handle))),
        }
    }

    /// Empties the handle.
    ///
    /// Returns `true` if this call performed the invalidation, `false` if
    /// the handle was already empty.
    pub fn invalidate(&self) -> bool {
        let guard = self.handle.lock();
        let previous = guard.take();

        if let Some(handle) = previous {
            debug!(%handle, "Connection handle invalidated");
        }

        previous.is_some()
    }

    /// Returns the current handle, if still live.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> Option<ConnectionHandle> {
        self.handle.lock().get()
    }

    /// Returns `true` if the handle has not been invalidated.
    #[inline]
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.snapshot().is_some()
    }

    /// Runs `f` with the live handle while holding the lock.
    ///
    /// Returns `None` without calling `f` if the handle is empty.
    pub fn with_live<R>(&self, f: impl FnOnce(ConnectionHandle) -> R) -> Option<R> {
        let guard = self.handle.lock();
        let handle = guard.get()?;
        Some(f(handle))
    }
}

impl fmt::Debug for HandleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleRegistry")
            .field("handle", &self.snapshot())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
