//! Marshals transport events onto the host context.
//!
//! Every transport callback becomes one [`PendingEvent`] posted as one
//! task to the [`HostExecutor`]. On the host context the task:
//!
//! 1. advances the shared [`SessionState`]
//! 2. takes the [`HandleRegistry`] lock
//! 3. drops the event if the handle is empty, otherwise makes exactly one
//!    [`HostListener`] call with the handle
//!
//! Steps 2 and 3 run under one lock acquisition. A panic in the host call
//! is caught here and logged; it never reaches the transport.

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, trace, warn};

use crate::error::Error;
use crate::identifiers::ConnectionHandle;
use crate::protocol::{PendingEvent, ResponseHeaders};
use crate::transport::{TransportListener, TransportSession};

use super::executor::HostExecutor;
use super::listener::HostListener;
use super::registry::HandleRegistry;
use super::state::SessionState;

// ============================================================================
// EventDispatcher
// ============================================================================

/// Bridges one connection's transport events to the host.
#[derive(Clone)]
pub struct EventDispatcher {
    registry: Arc<HandleRegistry>,
    listener: Arc<dyn HostListener>,
    executor: Arc<dyn HostExecutor>,
    state: Arc<Mutex<SessionState>>,
}

impl EventDispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(
        registry: Arc<HandleRegistry>,
        listener: Arc<dyn HostListener>,
        executor: Arc<dyn HostExecutor>,
        state: Arc<Mutex<SessionState>>,
    ) -> Self {
        Self {
            registry,
            listener,
            executor,
            state,
        }
    }

    /// Returns the registry consulted before each notification.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<HandleRegistry> {
        &self.registry
    }

    /// Schedules delivery of one event.
    pub fn dispatch(&self, event: PendingEvent) {
        trace!(event = %event, "Scheduling event");

        let registry = Arc::clone(&self.registry);
        let listener = Arc::clone(&self.listener);
        let state = Arc::clone(&self.state);

        self.executor.post(Box::new(move || {
            deliver(&registry, listener.as_ref(), &state, event);
        }));
    }

    /// Schedules an `on_error` notification for a configuration failure.
    pub fn report_error(&self, err: &Error) {
        warn!(error = %err, "Connect aborted");
        self.dispatch(PendingEvent::failed(err.notification_message()));
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("registry", &self.registry)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// TransportListener
// ============================================================================

impl TransportListener for EventDispatcher {
    fn on_open(&self, protocol: String, headers: ResponseHeaders) {
        self.dispatch(PendingEvent::Opened {
            protocol,
            headers: headers.to_text(),
        });
    }

    fn on_text(&self, text: String) {
        self.dispatch(PendingEvent::TextMessage(text));
    }

    fn on_binary(&self, bytes: Vec<u8>) {
        self.dispatch(PendingEvent::BinaryMessage(bytes));
    }

    fn on_closing(&self, session: &dyn TransportSession, code: u16, reason: String) {
        if !session.close(code, &reason) {
            debug!(code, "Close acknowledgement not sent, connection already gone");
        }
        self.dispatch(PendingEvent::Closing { code, reason });
    }

    fn on_closed(&self, code: u16, reason: String) {
        self.dispatch(PendingEvent::Closed { code, reason });
    }

    fn on_failure(&self, message: String) {
        self.dispatch(PendingEvent::failed(message));
    }
}

// ============================================================================
// Host-side Delivery
// ============================================================================

fn deliver(
    registry: &HandleRegistry,
    listener: &dyn HostListener,
    state: &Mutex<SessionState>,
    event: PendingEvent,
) {
    state.lock().apply(&event);

    if matches!(event, PendingEvent::Closing { .. }) {
        return;
    }

    let kind = event.kind();
    let delivered = registry.with_live(|handle| {
        let outcome = catch_unwind(AssertUnwindSafe(|| notify(listener, &event, handle)));
        if let Err(payload) = outcome {
            error!(
                event = kind,
                %handle,
                panic = panic_message(payload.as_ref()),
                "Host notification panicked"
            );
        }
    });

    if delivered.is_none() {
        debug!(event = kind, "Connection handle invalidated, event dropped");
    }
}

fn notify(listener: &dyn HostListener, event: &PendingEvent, handle: ConnectionHandle) {
    match event {
        PendingEvent::Opened { protocol, headers } => listener.on_open(protocol, headers, handle),
        PendingEvent::TextMessage(text) => listener.on_string_message(text, handle),
        PendingEvent::BinaryMessage(bytes) => listener.on_binary_message(bytes, handle),
        PendingEvent::Closed { code, reason } => listener.on_closed(*code, reason, handle),
        PendingEvent::Failed { message } => listener.on_error(message, handle),
        PendingEvent::Closing { .. } => {}
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

    use crate::host::executor::{HostLoop, host_queue};
    use crate::host::state::ReadyState;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
        panic_on_text: AtomicBool,
    }

    impl HostListener for Recorder {
        fn on_open(&self, protocol: &str, _headers: &str, _handle: ConnectionHandle) {
            self.calls.lock().push(format!("open:{protocol}"));
        }

        fn on_string_message(&self, text: &str, _handle: ConnectionHandle) {
            if self.panic_on_text.load(Ordering::SeqCst) {
                panic!("host blew up");
            }
            self.calls.lock().push(format!("text:{text}"));
        }

        fn on_binary_message(&self, bytes: &[u8], _handle: ConnectionHandle) {
            self.calls.lock().push(format!("binary:{}", bytes.len()));
        }

        fn on_closed(&self, code: u16, reason: &str, _handle: ConnectionHandle) {
            self.calls.lock().push(format!("closed:{code}:{reason}"));
        }

        fn on_error(&self, message: &str, _handle: ConnectionHandle) {
            self.calls.lock().push(format!("error:{message}"));
        }
    }

    #[derive(Default)]
    struct AckSession {
        closes: Mutex<Vec<(u16, String)>>,
        queued: AtomicU64,
    }

    impl TransportSession for AckSession {
        fn send_text(&self, _text: String) -> bool {
            true
        }

        fn send_binary(&self, _bytes: Vec<u8>) -> bool {
            true
        }

        fn close(&self, code: u16, reason: &str) -> bool {
            self.closes.lock().push((code, reason.to_string()));
            true
        }

        fn queue_size(&self) -> u64 {
            self.queued.load(Ordering::SeqCst)
        }
    }

    fn setup() -> (EventDispatcher, Arc<Recorder>, HostLoop) {
        let handle = ConnectionHandle::from_raw(1, 2).expect("non-zero");
        let recorder = Arc::new(Recorder::default());
        let (queue, host_loop) = host_queue();
        let dispatcher = EventDispatcher::new(
            Arc::new(HandleRegistry::new(handle)),
            recorder.clone(),
            Arc::new(queue),
            Arc::new(Mutex::new(SessionState::default())),
        );
        (dispatcher, recorder, host_loop)
    }

    #[test]
    fn test_nothing_runs_until_host_drains() {
        let (dispatcher, recorder, mut host_loop) = setup();
        dispatcher.on_text("a".into());
        assert!(recorder.calls.lock().is_empty());
        assert_eq!(host_loop.run_pending(), 1);
        assert_eq!(*recorder.calls.lock(), vec!["text:a"]);
    }

    #[test]
    fn test_events_delivered_in_order() {
        let (dispatcher, recorder, mut host_loop) = setup();
        dispatcher.on_open("chat".into(), ResponseHeaders::new());
        dispatcher.on_text("one".into());
        dispatcher.on_binary(vec![1, 2, 3]);
        dispatcher.on_text("two".into());
        dispatcher.on_closed(1000, "done".into());
        host_loop.run_pending();

        assert_eq!(
            *recorder.calls.lock(),
            vec!["open:chat", "text:one", "binary:3", "text:two", "closed:1000:done"]
        );
        assert_eq!(dispatcher.state.lock().ready_state(), ReadyState::Closed);
    }

    #[test]
    fn test_invalidated_handle_drops_events() {
        let (dispatcher, recorder, mut host_loop) = setup();
        dispatcher.on_text("before".into());
        dispatcher.registry().invalidate();
        dispatcher.on_text("after".into());
        host_loop.run_pending();

        // Invalidation wins over events scheduled before it as well.
        assert!(recorder.calls.lock().is_empty());
    }

    #[test]
    fn test_closing_acknowledges_without_notification() {
        let (dispatcher, recorder, mut host_loop) = setup();
        let session = AckSession::default();
        dispatcher.on_open(String::new(), ResponseHeaders::new());
        dispatcher.on_closing(&session, 1000, "bye".into());
        host_loop.run_pending();

        assert_eq!(*session.closes.lock(), vec![(1000, "bye".to_string())]);
        assert_eq!(*recorder.calls.lock(), vec!["open:"]);
        assert_eq!(dispatcher.state.lock().ready_state(), ReadyState::Closing);

        dispatcher.on_closed(1000, "bye".into());
        host_loop.run_pending();
        assert_eq!(*recorder.calls.lock(), vec!["open:", "closed:1000:bye"]);
    }

    #[test]
    fn test_panic_in_host_is_isolated() {
        let (dispatcher, recorder, mut host_loop) = setup();
        recorder.panic_on_text.store(true, Ordering::SeqCst);
        dispatcher.on_text("boom".into());
        dispatcher.on_closed(1000, String::new());
        assert_eq!(host_loop.run_pending(), 2);

        assert_eq!(*recorder.calls.lock(), vec!["closed:1000:"]);
        assert!(dispatcher.registry().is_live());
    }

    #[test]
    fn test_report_error_uses_notification_text() {
        let (dispatcher, recorder, mut host_loop) = setup();
        dispatcher.report_error(&Error::invalid_url("nope"));
        dispatcher.on_failure(String::new());
        host_loop.run_pending();

        assert_eq!(
            *recorder.calls.lock(),
            vec!["error:invalid url", "error:unknown error"]
        );
    }

    #[test]
    fn test_panic_message_extracts_text() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
