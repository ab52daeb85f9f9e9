//! Process-wide work pool.
//!
//! All connections share one multi-threaded tokio runtime. It is built on
//! first use and lives until the process exits; there is no shutdown.
//! Transport callbacks run on its worker threads.

// ============================================================================
// Imports
// ============================================================================

use std::sync::OnceLock;

use parking_lot::Mutex;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Name given to work pool threads.
const THREAD_NAME: &str = "websocket-bridge-worker";

// ============================================================================
// Globals
// ============================================================================

static WORK_POOL: OnceLock<Runtime> = OnceLock::new();

/// Serializes first-time construction so a losing racer never builds (and
/// then drops) a second runtime.
static INIT_LOCK: Mutex<()> = Mutex::new(());

// ============================================================================
// Public Functions
// ============================================================================

/// Returns the work pool, building it on first call.
///
/// # Errors
///
/// Returns [`Error::Io`](crate::Error::Io) if the runtime cannot be built.
pub fn work_pool() -> Result<&'static Runtime> {
    if let Some(runtime) = WORK_POOL.get() {
        return Ok(runtime);
    }

    let _guard = INIT_LOCK.lock();
    if let Some(runtime) = WORK_POOL.get() {
        return Ok(runtime);
    }

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .thread_name(THREAD_NAME)
        .build()?;

    debug!("Work pool started");

    Ok(WORK_POOL.get_or_init(|| runtime))
}

// ============================================================================
// Tests
// ============================================================================
