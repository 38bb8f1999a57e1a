use crate::helpers::{collector, forwarder, message_types, record, sequential, setup, test_api};

use tango_core::{CallArg, CallError, Channel, Client, MemoryChannel, Server, args};

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(2);

// ============================================================================
// Request / response
// ============================================================================

/// **VALUE**: Verifies a basic call round-trips through server and client.
///
/// **WHY THIS MATTERS**: This is the foundation every other behaviour builds on:
/// correlation id allocation, invoke dispatch and result settlement.
///
/// **BUG THIS CATCHES**: Would catch replies correlated to the wrong id or never settled.
#[tokio::test]
async fn given_add_procedure_when_called_then_resolves_to_sum() {
    // GIVEN: Server and client on an echoing bus
    let (_channel, _server, client) = setup();

    // WHEN: Calling add with several operand pairs
    let pairs: [(i64, i64); 3] = [(1, 2), (-5, 5), (1_000_000, 2_500_000)];
    for (a, b) in pairs {
        let sum: i64 = client.call_as("add", args![a, b]).await.expect("add");

        // THEN: Each resolves to a + b
        assert_eq!(sum, a + b);
    }

    let float_sum: f64 = client.call_as("add", args![0.5, 0.25]).await.expect("add");
    assert_eq!(float_sum, 0.75);
}

#[tokio::test]
async fn given_greet_procedure_when_called_with_world_then_hello_world() {
    let (_channel, _server, client) = setup();

    let greeting: String = client.call_as("greet", args!["World"]).await.expect("greet");

    assert_eq!(greeting, "Hello, World!");
}

#[tokio::test]
async fn given_void_procedure_when_called_then_resolves_to_null() {
    let (_channel, _server, client) = setup();
    let (_collected, callback) = collector();

    let result = client
        .call("processItems", vec![CallArg::value(json!([])), callback])
        .await
        .expect("processItems");

    assert_eq!(result, Value::Null);
}

/// **VALUE**: Verifies overlapping calls settle independently by id, not by arrival order.
///
/// **WHY THIS MATTERS**: Procedures are asynchronous. A slow call must not block a fast
/// one, and the fast reply must not be handed to the slow caller.
///
/// **BUG THIS CATCHES**: Would catch one-at-a-time dispatch on the server, or a client
/// that settles the oldest pending call with whatever reply arrives next.
#[tokio::test]
async fn given_slow_and_fast_calls_when_overlapping_then_each_gets_own_result() {
    // GIVEN: A recorder on the bus
    let (channel, _server, client) = setup();
    let seen = record(&channel);

    // WHEN: The slow call is issued first
    let (slow, fast) = tokio::join!(
        client.call("delayedEcho", args!["slow", 150]),
        client.call("delayedEcho", args!["fast", 10]),
    );

    // THEN: Each caller gets its own value
    assert_eq!(slow.expect("slow"), json!("slow"));
    assert_eq!(fast.expect("fast"), json!("fast"));

    // THEN: The fast reply crossed the wire first
    let results: Vec<Value> = seen
        .lock()
        .expect("lock")
        .iter()
        .filter(|value| value["messageType"] == "result")
        .map(|value| value["result"].clone())
        .collect();
    assert_eq!(results, vec![json!("fast"), json!("slow")]);
    assert_eq!(client.pending_count(), 0);
}

// ============================================================================
// Callbacks
// ============================================================================

#[tokio::test]
async fn given_process_items_when_called_then_callback_sees_uppercased_items_in_order() {
    let (_channel, _server, client) = setup();
    let (collected, callback) = collector();

    client
        .call("processItems", vec![CallArg::value(json!(["a", "b"])), callback])
        .await
        .expect("processItems");

    assert_eq!(*collected.lock().expect("lock"), vec![json!("A"), json!("B")]);
}

/// **VALUE**: Verifies a callback invoked n times fires n times, in order, with the same args.
///
/// **WHY THIS MATTERS**: Callbacks are live proxies, not one-shot continuations.
///
/// **BUG THIS CATCHES**: Would catch callbacks unregistered after their first invocation.
#[tokio::test]
async fn given_many_items_when_processed_then_callback_fires_once_per_item() {
    let (_channel, _server, client) = setup();
    let (collected, callback) = collector();
    let items: Vec<String> = (0..25).map(|i| format!("item-{i}")).collect();

    client
        .call("processItems", vec![CallArg::json(&items).expect("json"), callback])
        .await
        .expect("processItems");

    let expected: Vec<Value> = items.iter().map(|item| json!(item.to_uppercase())).collect();
    assert_eq!(*collected.lock().expect("lock"), expected);
}

/// **VALUE**: Verifies two callbacks on one call are delivered without cross-talk.
///
/// **WHY THIS MATTERS**: Callback ids are derived from the call id plus position;
/// collisions would route one callback's invocation to the other.
///
/// **BUG THIS CATCHES**: Would catch callback ids keyed only by the call id.
#[tokio::test]
async fn given_two_callbacks_when_triggered_then_each_receives_own_value() {
    let (_channel, _server, client) = setup();
    let (first, callback1) = collector();
    let (second, callback2) = collector();

    client
        .call(
            "triggerTwoCallbacks",
            vec![
                CallArg::value("Hello"),
                CallArg::value("World"),
                callback1,
                callback2,
            ],
        )
        .await
        .expect("triggerTwoCallbacks");

    assert_eq!(*first.lock().expect("lock"), vec![json!("Hello")]);
    assert_eq!(*second.lock().expect("lock"), vec![json!("World")]);
}

/// **VALUE**: Verifies subscriptions keep working after the subscribing call resolved.
///
/// **WHY THIS MATTERS**: Event subscriptions are the reason callback registrations
/// outlive their call.
///
/// **BUG THIS CATCHES**: Would catch the client dropping a call's callbacks on settlement.
#[tokio::test]
async fn given_subscription_when_events_triggered_later_then_callback_receives_each() {
    // GIVEN: A subscription established and resolved
    let (_channel, _server, client) = setup();
    let (events, callback) = collector();
    client
        .call("subscribeToEvents", vec![callback])
        .await
        .expect("subscribe");

    // WHEN: Two events are triggered by separate calls
    client.call("triggerEvent", args!["Test event 1"]).await.expect("event 1");
    client.call("triggerEvent", args!["Test event 2"]).await.expect("event 2");

    // THEN: Both arrive in order
    assert_eq!(
        *events.lock().expect("lock"),
        vec![json!("Test event 1"), json!("Test event 2")]
    );
    assert_eq!(client.callback_count(), 1);
}

#[tokio::test]
async fn given_delayed_callback_when_call_already_resolved_then_callback_still_fires() {
    let (_channel, _server, client) = setup();
    let (mut received, callback) = forwarder();

    let scheduled = client
        .call("callLater", vec![callback, CallArg::value(20)])
        .await
        .expect("callLater");
    assert_eq!(scheduled, json!("scheduled"));

    let late = timeout(WAIT, received.recv()).await.expect("callback in time");
    assert_eq!(late, Some(json!("late")));
}

#[tokio::test]
async fn given_released_subscription_when_event_triggered_then_not_delivered() {
    let channel = Arc::new(MemoryChannel::broadcast());
    let _server = Server::with_options(Arc::clone(&channel), test_api(), sequential()).expect("server");
    let client = Client::with_options(Arc::clone(&channel), sequential());
    let (events, callback) = collector();
    client.call("subscribeToEvents", vec![callback]).await.expect("subscribe");

    // client-0 took id 0, clientReady took 1, the subscribe call took 2
    assert!(client.release_callback("2-0"));
    client.call("triggerEvent", args!["ignored"]).await.expect("event");

    assert!(events.lock().expect("lock").is_empty());
    assert_eq!(client.callback_count(), 0);
}

// ============================================================================
// Failures
// ============================================================================

/// **VALUE**: Verifies a failing procedure rejects the call with the server's message.
///
/// **WHY THIS MATTERS**: Failures must be fully recovered on the server and observed
/// by the caller, never lost or propagated as a crash.
///
/// **BUG THIS CATCHES**: Would catch error envelopes that leave the call pending, or
/// error text altered on the way.
#[tokio::test]
async fn given_failing_procedure_when_called_then_rejects_with_server_message() {
    let (_channel, _server, client) = setup();

    let error = client.call("errorProne", args![]).await.expect_err("should fail");

    assert!(matches!(error, CallError::Remote { .. }));
    assert_eq!(error.remote_message(), Some("Something went wrong!"));
    assert_eq!(client.pending_count(), 0);
}

#[tokio::test]
async fn given_unknown_procedure_when_called_then_rejects_with_not_a_function() {
    let (_channel, _server, client) = setup();

    let error = client.call("nope", args![]).await.expect_err("should fail");

    assert_eq!(error.remote_message(), Some("Procedure 'nope' is not a function"));
}

#[tokio::test]
async fn given_panicking_procedure_when_called_then_rejects_and_server_survives() {
    let (_channel, _server, client) = setup();

    let error = client.call("panicky", args![]).await.expect_err("should fail");
    let greeting: String = client.call_as("greet", args!["again"]).await.expect("greet");

    assert_eq!(error.remote_message(), Some("kaboom"));
    assert_eq!(greeting, "Hello, again!");
}

#[tokio::test]
async fn given_wrong_argument_type_when_called_then_rejects_with_invalid_argument() {
    let (_channel, _server, client) = setup();

    let error = client.call("greet", args![42]).await.expect_err("should fail");

    let message = error.remote_message().expect("remote");
    assert!(message.starts_with("Invalid argument 0"), "Got: {message}");
}

/// **VALUE**: Verifies a result of the wrong shape is a decode error located at the call site.
///
/// **WHY THIS MATTERS**: Decode failures surface far from the server; the location is the
/// only pointer back to which `call_as` expected the wrong type.
///
/// **BUG THIS CATCHES**: Would catch the location being captured inside the client
/// instead of at the caller.
#[tokio::test]
async fn given_result_of_wrong_type_when_call_as_then_decode_error_at_call_site() {
    let (_channel, _server, client) = setup();

    let line = line!() + 1;
    let result = client.call_as::<i64>("greet", args!["World"]).await;

    let location = match result {
        Err(CallError::Decode { location, .. }) => location,
        other => panic!("Expected Decode error, got {other:?}"),
    };
    assert_eq!(location.line, line);
    assert!(location.file.ends_with("rpc.rs"), "Got: {}", location.file);
}

/// **VALUE**: Verifies malformed text on the channel is dropped without disturbing endpoints.
///
/// **WHY THIS MATTERS**: Shared buses carry traffic from other sources. Garbage must not
/// crash listeners or corrupt correlation state.
///
/// **BUG THIS CATCHES**: Would catch decode panics inside the listener.
#[tokio::test]
async fn given_malformed_messages_when_received_then_ignored_and_calls_still_work() {
    let (channel, _server, client) = setup();

    channel.send_message("garbage".to_string());
    channel.send_message(r#"{"id":"1","messageType":"result"}"#.to_string());
    channel.send_message(r#"{"id":"1","senderId":"x","messageType":"warp"}"#.to_string());

    let sum: i64 = client.call_as("add", args![2, 3]).await.expect("add");
    assert_eq!(sum, 5);
}

#[tokio::test]
async fn given_unmatched_replies_when_received_then_silently_ignored() {
    let (channel, _server, client) = setup();

    channel.send_message(
        r#"{"id":"999","senderId":"server-x","messageType":"result","result":1}"#.to_string(),
    );
    channel.send_message(
        r#"{"id":"998","senderId":"server-x","messageType":"error","error":"late"}"#.to_string(),
    );
    channel.send_message(
        r#"{"id":"noop","senderId":"server-x","messageType":"callback","callbackId":"gone-0","args":[1]}"#
            .to_string(),
    );

    assert_eq!(client.pending_count(), 0);
    let greeting: String = client.call_as("greet", args!["still here"]).await.expect("greet");
    assert_eq!(greeting, "Hello, still here!");
}

// ============================================================================
// Self-echo suppression
// ============================================================================

/// **VALUE**: Verifies a client ignores envelopes carrying its own senderId.
///
/// **WHY THIS MATTERS**: Broadcast channels echo every send back to the sender. An
/// endpoint reacting to its own traffic could settle calls with forged replies.
///
/// **BUG THIS CATCHES**: Would catch a missing or inverted senderId comparison.
#[tokio::test]
async fn given_reply_with_own_sender_id_when_received_then_not_dispatched() {
    // GIVEN: A client with no server; ids are client-0, clientReady=1, call=2
    let channel = Arc::new(MemoryChannel::broadcast());
    let client = Client::with_options(Arc::clone(&channel), sequential());
    let call = client.call("greet", args!["nobody"]);
    tokio::pin!(call);
    assert!(
        timeout(Duration::from_millis(20), &mut call).await.is_err(),
        "Call should still be pending"
    );

    // WHEN: A result for that id arrives stamped with the client's own senderId
    channel.send_message(
        r#"{"id":"2","senderId":"client-0","messageType":"result","result":"forged"}"#.to_string(),
    );

    // THEN: Still pending
    assert_eq!(client.pending_count(), 1);

    // WHEN: The same result arrives from someone else
    channel.send_message(
        r#"{"id":"2","senderId":"server-9","messageType":"result","result":"real"}"#.to_string(),
    );

    // THEN: Settled with the foreign reply
    assert_eq!(call.await.expect("settled"), json!("real"));
}

#[tokio::test]
async fn given_invoke_with_own_sender_id_when_received_then_server_does_not_reply() {
    let channel = Arc::new(MemoryChannel::broadcast());
    let server = Server::with_options(Arc::clone(&channel), test_api(), sequential()).expect("server");
    let seen = record(&channel);

    let forged = format!(
        r#"{{"id":"1","senderId":"{}","messageType":"invoke","procedure":"greet","args":["me"]}}"#,
        server.sender_id()
    );
    channel.send_message(forged);
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(message_types(&seen), vec!["invoke"]);
}

// ============================================================================
// Teardown
// ============================================================================

#[tokio::test]
async fn given_pending_call_when_client_cleaned_up_then_rejects_closed() {
    let channel = Arc::new(MemoryChannel::broadcast());
    let client = Client::with_options(Arc::clone(&channel), sequential());
    let call = client.call("neverAnswered", args![]);
    tokio::pin!(call);
    assert!(timeout(Duration::from_millis(20), &mut call).await.is_err());

    client.cleanup();
    client.cleanup();

    assert!(matches!(call.await, Err(CallError::Closed { .. })));
    assert_eq!(channel.listener_count(), 0);
}

#[tokio::test]
async fn given_server_cleaned_up_when_called_then_no_reply() {
    let (channel, server, client) = setup();
    server.cleanup();

    let outcome = timeout(Duration::from_millis(50), client.call("greet", args!["anyone"])).await;

    assert!(outcome.is_err(), "No server should be listening");
    assert_eq!(channel.listener_count(), 1);
}

#[tokio::test]
async fn given_point_to_point_pair_when_calling_then_behaves_like_shared_bus() {
    let (server_end, client_end) = MemoryChannel::pair();
    let _server = Server::new(Arc::new(server_end), test_api()).expect("server");
    let client = Client::new(Arc::new(client_end));
    let (collected, callback) = collector();

    client
        .call("processItems", vec![CallArg::value(json!(["x", "y"])), callback])
        .await
        .expect("processItems");

    assert!(client.is_connected());
    assert_eq!(*collected.lock().expect("lock"), vec![json!("X"), json!("Y")]);
}
