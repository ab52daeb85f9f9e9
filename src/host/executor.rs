//! The host's single serial execution context.
//!
//! Transport events arrive on work-pool threads; host notifications must
//! run on one host-owned context, one at a time, in submission order.
//! [`HostExecutor`] is that seam. [`host_queue`] provides a channel-backed
//! implementation: the [`HostQueue`] half is handed to clients, and the
//! host drains the [`HostLoop`] half from its own thread.
//!
//! # Example
//!
//! ```
//! use websocket_bridge::host::{HostExecutor, host_queue};
//!
//! let (queue, mut host_loop) = host_queue();
//! queue.post(Box::new(|| println!("on the host thread")));
//! assert_eq!(host_loop.run_pending(), 1);
//! ```

// ============================================================================
// Imports
// ============================================================================

use tokio::sync::mpsc;
use tracing::trace;

// ============================================================================
// Types
// ============================================================================

/// One unit of work for the host context.
pub type HostTask = Box<dyn FnOnce() + Send + 'static>;

// ============================================================================
// HostExecutor
// ============================================================================

/// Schedules tasks onto the host's serial context.
///
/// Implementations must run tasks one at a time in the order they were
/// posted. Posting never blocks.
pub trait HostExecutor: Send + Sync {
    /// Enqueues a task.
    fn post(&self, task: HostTask);
}

// ============================================================================
// HostQueue / HostLoop
// ============================================================================

/// Creates a connected queue / loop pair.
#[must_use]
pub fn host_queue() -> (HostQueue, HostLoop) {
    let (task_tx, task_rx) = mpsc::unbounded_channel();
    (HostQueue { task_tx }, HostLoop { task_rx })
}

/// Sending half; cheap to clone and share between clients.
#[derive(Debug, Clone)]
pub struct HostQueue {
    task_tx: mpsc::UnboundedSender<HostTask>,
}

impl HostExecutor for HostQueue {
    fn post(&self, task: HostTask) {
        if self.task_tx.send(task).is_err() {
            trace!("Host loop gone, task dropped");
        }
    }
}

/// Receiving half, driven by the host thread.
#[derive(Debug)]
pub struct HostLoop {
    task_rx: mpsc::UnboundedReceiver<HostTask>,
}

impl HostLoop {
    /// Runs every task already queued, without waiting.
    ///
    /// Returns the number of tasks run.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.task_rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Waits for the next task and runs it.
    ///
    /// Returns `false` once every [`HostQueue`] is dropped and the queue
    /// is empty.
    pub async fn run_next(&mut self) -> bool {
        match self.task_rx.recv().await {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Blocking variant of [`run_next`](Self::run_next) for plain threads.
    ///
    /// Must not be called from inside an async runtime.
    pub fn blocking_run_next(&mut self) -> bool {
        match self.task_rx.blocking_recv() {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
