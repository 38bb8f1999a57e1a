// Unit tests for the in-memory channels

use crate::channel::{Channel, MemoryChannel};

use std::sync::{Arc, Mutex};

fn recorder(channel: &MemoryChannel) -> (Arc<Mutex<Vec<String>>>, crate::ListenerId) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let id = channel.add_message_listener(Arc::new(move |message| {
        sink.lock().expect("lock").push(message);
    }));
    (seen, id)
}

#[test]
fn given_broadcast_channel_when_sent_then_sender_also_receives() {
    let channel = MemoryChannel::broadcast();
    let (seen, _) = recorder(&channel);

    channel.send_message("hello".to_string());

    assert_eq!(*seen.lock().expect("lock"), vec!["hello"]);
}

#[test]
fn given_pair_when_sent_then_only_other_end_receives() {
    let (left, right) = MemoryChannel::pair();
    let (left_seen, _) = recorder(&left);
    let (right_seen, _) = recorder(&right);

    left.send_message("to-right".to_string());
    right.send_message("to-left".to_string());

    assert_eq!(*left_seen.lock().expect("lock"), vec!["to-left"]);
    assert_eq!(*right_seen.lock().expect("lock"), vec!["to-right"]);
}

#[test]
fn given_removed_listener_when_removed_again_then_noop() {
    let channel = MemoryChannel::broadcast();
    let (seen, id) = recorder(&channel);

    channel.remove_message_listener(id);
    channel.remove_message_listener(id);
    channel.send_message("ignored".to_string());

    assert!(seen.lock().expect("lock").is_empty());
    assert_eq!(channel.listener_count(), 0);
}

/// **VALUE**: Verifies a listener may send on the channel from inside delivery.
///
/// **WHY THIS MATTERS**: On an in-process bus the server replies, and callbacks fire,
/// from inside another endpoint's delivery.
///
/// **BUG THIS CATCHES**: Would catch delivery holding the listener lock while calling out,
/// which deadlocks on the first re-entrant send.
#[test]
fn given_listener_that_sends_when_delivered_then_no_deadlock() {
    let channel = Arc::new(MemoryChannel::broadcast());
    let (seen, _) = recorder(&channel);

    let echo = Arc::clone(&channel);
    channel.add_message_listener(Arc::new(move |message| {
        if message == "ping" {
            echo.send_message("pong".to_string());
        }
    }));

    channel.send_message("ping".to_string());

    assert_eq!(*seen.lock().expect("lock"), vec!["ping", "pong"]);
}
