use tango_demo::demo::run_demo;
use tango_demo::error::DemoError;
use tango_demo::host::start_rpc_host;

use tango_core::{Client, EndpointOptions, WebSocketChannel};

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(10);

/// **VALUE**: Runs the full demo walkthrough against a real loopback host.
///
/// **WHY THIS MATTERS**: This is exactly what the binary does at startup; it covers the
/// listener, the WebSocket upgrade, the handshake and every demo procedure.
///
/// **BUG THIS CATCHES**: Would catch the host never announcing `serverReady`, callbacks
/// arriving after their call's result, or subscriptions dropped once the call resolved.
#[tokio::test]
async fn given_running_host_when_demo_runs_then_report_matches_expected() {
    // GIVEN: A host on an ephemeral loopback port
    let host = start_rpc_host("127.0.0.1:0", EndpointOptions::default())
        .await
        .expect("host");
    let channel = Arc::new(WebSocketChannel::connect(&host.url()).await.expect("connect"));
    let client = Client::new(channel);

    // WHEN: Running the walkthrough
    let report = timeout(WAIT, run_demo(&client))
        .await
        .expect("demo in time")
        .expect("demo");

    // THEN: Every step observed what the server sent
    assert_eq!(report.sum, 3.0);
    assert_eq!(report.greeting, "Hello, World!");
    assert_eq!(report.processed, vec!["APPLE", "BANANA", "CHERRY"]);
    assert_eq!(report.first_callback, vec![json!("Hello")]);
    assert_eq!(report.second_callback, vec![json!("World")]);
    assert_eq!(
        report.events,
        vec![json!("Test event 1"), json!("Test event 2")]
    );
    assert_eq!(report.remote_error.as_deref(), Some("Something went wrong!"));
}

#[tokio::test]
async fn given_two_clients_when_connected_then_each_served_independently() {
    let host = start_rpc_host("127.0.0.1:0", EndpointOptions::default())
        .await
        .expect("host");

    let first = Client::new(Arc::new(WebSocketChannel::connect(&host.url()).await.expect("connect")));
    let second = Client::new(Arc::new(WebSocketChannel::connect(&host.url()).await.expect("connect")));

    let (a, b) = tokio::join!(run_demo(&first), run_demo(&second));

    assert_eq!(a.expect("first").greeting, "Hello, World!");
    assert_eq!(b.expect("second").greeting, "Hello, World!");
}

#[tokio::test]
async fn given_non_loopback_address_when_starting_then_transport_error() {
    let result = start_rpc_host("0.0.0.0:0", EndpointOptions::default()).await;

    assert!(matches!(result, Err(DemoError::Transport { .. })));
}

#[tokio::test]
async fn given_unparsable_address_when_starting_then_transport_error() {
    let result = start_rpc_host("localhost-ish", EndpointOptions::default()).await;

    assert!(matches!(result, Err(DemoError::Transport { .. })));
}

#[tokio::test]
async fn given_host_shut_down_when_connecting_then_fails() {
    let host = start_rpc_host("127.0.0.1:0", EndpointOptions::default())
        .await
        .expect("host");
    let url = host.url();
    drop(host);
    tokio::time::sleep(Duration::from_millis(20)).await;

    let result = timeout(WAIT, WebSocketChannel::connect(&url)).await.expect("in time");

    assert!(result.is_err());
}
