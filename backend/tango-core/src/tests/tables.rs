// Unit tests for the client correlation tables
// Pending calls settle once; callbacks persist until released

use crate::client::tables::{CallbackRegistry, PendingCalls};

use std::sync::Arc;

use serde_json::json;
use tokio::sync::oneshot;

#[test]
fn given_pending_id_when_registered_again_then_rejected() {
    let mut pending = PendingCalls::default();
    let (first, _first_rx) = oneshot::channel();
    let (second, _second_rx) = oneshot::channel();

    assert!(pending.register("1".to_string(), first));
    assert!(!pending.register("1".to_string(), second));
    assert_eq!(pending.len(), 1);
}

/// **VALUE**: Verifies a pending entry can be taken exactly once.
///
/// **WHY THIS MATTERS**: Duplicate delivery of a reply must not settle a call twice
/// or settle a later call that happens to reuse the slot.
///
/// **BUG THIS CATCHES**: Would catch `take` using `get` instead of `remove`.
#[test]
fn given_pending_call_when_taken_twice_then_second_is_none() {
    let mut pending = PendingCalls::default();
    let (settlement, mut receiver) = oneshot::channel();
    pending.register("1".to_string(), settlement);

    let first = pending.take("1");
    let second = pending.take("1");

    assert!(second.is_none());
    first
        .expect("first take")
        .send(Ok(json!(3)))
        .expect("receiver alive");
    assert_eq!(receiver.try_recv().expect("settled").expect("ok"), json!(3));
}

#[test]
fn given_pending_calls_when_drained_then_table_empty() {
    let mut pending = PendingCalls::default();
    let (a, _a_rx) = oneshot::channel();
    let (b, _b_rx) = oneshot::channel();
    pending.register("a".to_string(), a);
    pending.register("b".to_string(), b);

    let drained = pending.drain();

    assert_eq!(drained.len(), 2);
    assert_eq!(pending.len(), 0);
}

/// **VALUE**: Verifies looking up a callback leaves it registered.
///
/// **WHY THIS MATTERS**: Subscriptions call the same callback repeatedly, long after
/// the call that registered it has resolved.
///
/// **BUG THIS CATCHES**: Would catch one-shot semantics creeping into `get`.
#[test]
fn given_registered_callback_when_looked_up_repeatedly_then_still_present() {
    let mut callbacks = CallbackRegistry::default();
    callbacks.register("1-0".to_string(), Arc::new(|_| {}));

    assert!(callbacks.get("1-0").is_some());
    assert!(callbacks.get("1-0").is_some());
    assert_eq!(callbacks.len(), 1);
}

#[test]
fn given_registered_callback_when_released_then_gone() {
    let mut callbacks = CallbackRegistry::default();
    callbacks.register("1-0".to_string(), Arc::new(|_| {}));

    assert!(callbacks.release("1-0"));
    assert!(!callbacks.release("1-0"));
    assert!(callbacks.get("1-0").is_none());
}
