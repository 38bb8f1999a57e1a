// Unit tests for the handshake connection state

use crate::handshake::ConnectionState;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn given_new_state_when_checked_then_disconnected() {
    let state = ConnectionState::new();

    assert!(!state.is_connected());
}

/// **VALUE**: Verifies the connect handler is only returned on the connecting edge.
///
/// **WHY THIS MATTERS**: Servers re-send `serverReady` every time a client announces
/// itself. The connect notification must not fire again for each of those.
///
/// **BUG THIS CATCHES**: Would catch level-triggered behaviour (returning the handler
/// whenever connected).
#[test]
fn given_handler_when_marked_connected_twice_then_handler_returned_once() {
    // GIVEN: A state with a handler installed while disconnected
    let mut state = ConnectionState::new();
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    let already = state.set_handler(Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    // WHEN: serverReady observed twice
    let first = state.mark_connected();
    let second = state.mark_connected();

    // THEN: Only the first returns the handler
    assert!(!already);
    assert!(first.is_some());
    assert!(second.is_none());
    assert!(state.is_connected());
}

#[test]
fn given_connected_state_when_handler_set_then_reports_already_connected() {
    let mut state = ConnectionState::new();
    assert!(state.mark_connected().is_none(), "No handler installed yet");

    let already = state.set_handler(Arc::new(|| {}));

    assert!(already);
}
