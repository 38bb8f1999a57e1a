use crate::helpers::{collector, test_api};

use tango_core::error::TransportError;
use tango_core::{CallArg, Client, Server, WebSocketChannel, args};

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::net::TcpListener;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

/// Accept one connection and serve the test API on it until the test ends.
async fn spawn_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let channel = Arc::new(WebSocketChannel::accept(stream).await.expect("upgrade"));
        let _server = Server::new(channel, test_api()).expect("server");
        std::future::pending::<()>().await;
    });

    format!("ws://{address}")
}

/// **VALUE**: Verifies the full protocol over a real socket: handshake, values, callbacks, errors.
///
/// **WHY THIS MATTERS**: The WebSocket channel is asynchronous and point-to-point, unlike the
/// in-memory bus, so ordering and handshake timing differ from the other suites.
///
/// **BUG THIS CATCHES**: Would catch frames delivered out of order, or a client that never
/// sees `serverReady` because it attached after the server's first announcement.
#[tokio::test]
async fn given_websocket_server_when_client_calls_then_protocol_round_trips() {
    // GIVEN: A server behind a loopback WebSocket
    let url = spawn_server().await;
    let channel = Arc::new(WebSocketChannel::connect(&url).await.expect("connect"));
    let client = Client::new(channel);

    // WHEN / THEN: The handshake completes
    timeout(WAIT, client.wait_connected())
        .await
        .expect("handshake in time")
        .expect("client alive");

    // WHEN / THEN: Plain values round-trip
    let greeting: String = timeout(WAIT, client.call_as("greet", args!["World"]))
        .await
        .expect("reply in time")
        .expect("greet");
    assert_eq!(greeting, "Hello, World!");

    // WHEN / THEN: Callbacks arrive before the result, in order
    let (collected, callback) = collector();
    timeout(
        WAIT,
        client.call("processItems", vec![CallArg::value(json!(["a", "b", "c"])), callback]),
    )
    .await
    .expect("reply in time")
    .expect("processItems");
    assert_eq!(
        *collected.lock().expect("lock"),
        vec![json!("A"), json!("B"), json!("C")]
    );

    // WHEN / THEN: Failures carry the server's message
    let error = timeout(WAIT, client.call("errorProne", args![]))
        .await
        .expect("reply in time")
        .expect_err("should fail");
    assert_eq!(error.remote_message(), Some("Something went wrong!"));
}

#[tokio::test]
async fn given_closed_channel_when_sending_then_message_dropped_without_panic() {
    let url = spawn_server().await;
    let channel = Arc::new(WebSocketChannel::connect(&url).await.expect("connect"));

    channel.close();
    channel.close();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(channel.is_closed());
    let client = Client::new(Arc::clone(&channel));
    assert!(!client.is_connected());
}

#[tokio::test]
async fn given_http_url_when_connecting_then_url_error() {
    let result = WebSocketChannel::connect("http://127.0.0.1:1").await;

    assert!(matches!(result, Err(TransportError::Url { .. })));
}

#[tokio::test]
async fn given_unparsable_url_when_connecting_then_url_error() {
    let result = WebSocketChannel::connect("not a url").await;

    assert!(matches!(result, Err(TransportError::Url { .. })));
}

#[tokio::test]
async fn given_nothing_listening_when_connecting_then_connect_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("local addr");
    drop(listener);

    let result = WebSocketChannel::connect(&format!("ws://{address}")).await;

    assert!(matches!(result, Err(TransportError::Connect { .. })));
}

#[tokio::test]
async fn given_peer_closes_when_awaiting_disconnected_then_resolves() {
    // GIVEN: An accepted server-side channel
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let url = format!("ws://{}", listener.local_addr().expect("local addr"));
    let accepted = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        WebSocketChannel::accept(stream).await.expect("upgrade")
    });
    let dialled = WebSocketChannel::connect(&url).await.expect("connect");
    let server_side = accepted.await.expect("accept task");
    assert!(!server_side.is_closed());

    // WHEN: The dialling side goes away
    drop(dialled);

    // THEN: The accepting side notices
    timeout(WAIT, server_side.disconnected())
        .await
        .expect("disconnect noticed");
    assert!(server_side.is_closed());
}
