// Unit tests for the demo procedure table, driven over an in-memory bus

use crate::api::{GreeterStub, demo_api};

use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use tango_core::{Client, MemoryChannel, Procedures, Server, args};

#[test]
fn given_demo_api_then_registers_every_demo_procedure() {
    let table = demo_api();

    for name in [
        "add",
        "greet",
        "processItems",
        "triggerTwoCallbacks",
        "subscribeToEvents",
        "triggerEvent",
        "errorProne",
    ] {
        assert!(table.contains(name), "Missing procedure {name}");
    }
    assert!(table.dispatch("missing", Default::default()).is_none());
}

/// **VALUE**: Verifies the typed stub drives the demo table end to end.
///
/// **WHY THIS MATTERS**: The stub hides procedure names and argument positions; a
/// mismatch with the table only shows up at runtime.
///
/// **BUG THIS CATCHES**: Would catch a stub passing arguments in the wrong order, or
/// decoding results into the wrong type.
#[tokio::test]
async fn given_stub_when_calling_each_procedure_then_results_match() {
    // GIVEN: Server and client on one bus
    let channel = Arc::new(MemoryChannel::broadcast());
    let _server = Server::new(Arc::clone(&channel), demo_api()).expect("server");
    let client = Client::new(channel);
    let stub = GreeterStub::new(&client);

    // WHEN / THEN: Plain calls
    assert_eq!(stub.add(1.0, 2.0).await.expect("add"), 3.0);
    assert_eq!(stub.greet("World").await.expect("greet"), "Hello, World!");

    // WHEN / THEN: Callback argument
    let items = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&items);
    stub.process_items(&["a", "b"], move |item| sink.lock().expect("lock").push(item))
        .await
        .expect("processItems");
    assert_eq!(*items.lock().expect("lock"), vec!["A", "B"]);

    // WHEN / THEN: Subscription
    let events: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
    let events_sink = Arc::clone(&events);
    stub.subscribe_to_events(move |event| events_sink.lock().expect("lock").push(event))
        .await
        .expect("subscribe");
    stub.trigger_event("ping").await.expect("trigger");
    assert_eq!(*events.lock().expect("lock"), vec![json!("ping")]);

    // WHEN / THEN: Remote failure
    let error = stub.error_prone().await.expect_err("should fail");
    assert_eq!(error.remote_message(), Some("Something went wrong!"));
}

/// **VALUE**: Verifies `add` keeps integer operands integral on the wire.
///
/// **WHY THIS MATTERS**: Callers asking for an integer result must get `3`, not `3.0`,
/// which `i64` refuses to decode.
///
/// **BUG THIS CATCHES**: Would catch operands read as `f64` unconditionally.
#[tokio::test]
async fn given_integer_operands_when_adding_then_integer_result() {
    // GIVEN: Server and client on one bus
    let channel = Arc::new(MemoryChannel::broadcast());
    let _server = Server::new(Arc::clone(&channel), demo_api()).expect("server");
    let client = Client::new(channel);

    // WHEN: Adding integers, floats, and integers that overflow i64
    let sum: i64 = client.call_as("add", args![1, 2]).await.expect("add");
    let raw = client.call("add", args![1, 2]).await.expect("add");
    let float_sum: f64 = client.call_as("add", args![0.5, 2]).await.expect("add");
    let overflow: f64 = client.call_as("add", args![i64::MAX, 1]).await.expect("add");

    // THEN: Integral where possible, f64 otherwise
    assert_eq!(sum, 3);
    assert_eq!(raw, json!(3));
    assert_eq!(float_sum, 2.5);
    assert_eq!(overflow, i64::MAX as f64 + 1.0);
}

#[tokio::test]
async fn given_non_numeric_operand_when_adding_then_invalid_argument() {
    let channel = Arc::new(MemoryChannel::broadcast());
    let _server = Server::new(Arc::clone(&channel), demo_api()).expect("server");
    let client = Client::new(channel);

    let error = client.call("add", args!["one", 2]).await.expect_err("should fail");

    let message = error.remote_message().expect("remote");
    assert!(message.starts_with("Invalid argument 0"), "Got: {message}");
}
