use crate::helpers::{message_types, record, sequential, test_api};

use tango_core::{Channel, Client, MemoryChannel, Server, args};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(2);

fn counting_handler(client: &Client) -> Arc<AtomicUsize> {
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    client.on_connect(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    fired
}

/// **VALUE**: Verifies a client attached after the server is connected at once.
///
/// **WHY THIS MATTERS**: The server's initial `serverReady` went out before the client
/// existed. Without the `clientReady` re-announcement the client would never connect.
///
/// **BUG THIS CATCHES**: Would catch a server that only announces once, at construction.
#[tokio::test]
async fn given_server_first_when_client_attaches_then_connected_immediately() {
    // GIVEN: A server already on the bus
    let channel = Arc::new(MemoryChannel::broadcast());
    let _server = Server::with_options(Arc::clone(&channel), test_api(), sequential()).expect("server");

    // WHEN: A client attaches
    let client = Client::with_options(Arc::clone(&channel), sequential());

    // THEN: The synchronous bus completed the handshake inside the constructor
    assert!(client.is_connected());
}

#[tokio::test]
async fn given_client_first_when_server_attaches_then_client_becomes_connected() {
    let channel = Arc::new(MemoryChannel::broadcast());
    let client = Client::with_options(Arc::clone(&channel), sequential());
    let fired = counting_handler(&client);
    assert!(!client.is_connected());

    let _server = Server::with_options(Arc::clone(&channel), test_api(), sequential()).expect("server");

    assert!(client.is_connected());
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn given_client_connected_when_wait_connected_then_resolves() {
    let channel = Arc::new(MemoryChannel::broadcast());
    let client = Client::with_options(Arc::clone(&channel), sequential());

    let waiting = tokio::spawn({
        let channel = Arc::clone(&channel);
        async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Server::with_options(channel, test_api(), sequential()).expect("server")
        }
    });

    timeout(WAIT, client.wait_connected())
        .await
        .expect("connected in time")
        .expect("client alive");
    let _server = waiting.await.expect("server task");

    assert!(client.is_connected());
}

/// **VALUE**: Verifies the connect handler fires exactly once however many servers announce.
///
/// **WHY THIS MATTERS**: Every `clientReady` on a shared bus makes every server re-announce,
/// so repeated `serverReady` envelopes are normal traffic.
///
/// **BUG THIS CATCHES**: Would catch a level-triggered handler that re-fires per announcement.
#[tokio::test]
async fn given_repeated_server_ready_when_received_then_handler_fires_once() {
    // GIVEN: A connected client with a counting handler
    let channel = Arc::new(MemoryChannel::broadcast());
    let client = Client::with_options(Arc::clone(&channel), sequential());
    let fired = counting_handler(&client);
    let _first = Server::with_options(Arc::clone(&channel), test_api(), sequential()).expect("server");

    // WHEN: A second server announces, then a raw serverReady arrives
    let _second = Server::with_options(Arc::clone(&channel), test_api(), sequential()).expect("server");
    channel.send_message(r#"{"id":"x","senderId":"server-z","messageType":"serverReady"}"#.to_string());

    // THEN: Fired once
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(client.is_connected());
}

#[tokio::test]
async fn given_already_connected_when_handler_registered_then_fires_immediately() {
    let channel = Arc::new(MemoryChannel::broadcast());
    let _server = Server::with_options(Arc::clone(&channel), test_api(), sequential()).expect("server");
    let client = Client::with_options(Arc::clone(&channel), sequential());

    let fired = counting_handler(&client);

    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn given_legacy_ready_spelling_when_received_then_client_connects() {
    let channel = Arc::new(MemoryChannel::broadcast());
    let client = Client::with_options(Arc::clone(&channel), sequential());

    channel.send_message(
        r#"{"id":"1","senderId":"server-legacy","messageType":"serverReadyMessage"}"#.to_string(),
    );

    assert!(client.is_connected());
}

/// **VALUE**: Verifies the handshake can be switched off on both sides.
///
/// **WHY THIS MATTERS**: Some deployments run endpoints that predate the handshake;
/// unexpected ready envelopes must not be put on their wire.
///
/// **BUG THIS CATCHES**: Would catch options ignored by either constructor.
#[tokio::test]
async fn given_handshake_disabled_when_endpoints_attach_then_only_calls_on_wire() {
    // GIVEN: A recorder attached before either endpoint
    let channel = Arc::new(MemoryChannel::broadcast());
    let seen = record(&channel);
    let options = sequential().with_handshake(false);

    // WHEN: Both attach and one call is made
    let _server = Server::with_options(Arc::clone(&channel), test_api(), options.clone()).expect("server");
    let client = Client::with_options(Arc::clone(&channel), options);
    let greeting: String = client.call_as("greet", args!["quiet"]).await.expect("greet");

    // THEN: No ready envelopes, and calls work regardless
    assert_eq!(greeting, "Hello, quiet!");
    assert_eq!(message_types(&seen), vec!["invoke", "result"]);
    assert!(!client.is_connected());
}

#[tokio::test]
async fn given_handshake_enabled_when_client_attaches_then_ready_exchange_on_wire() {
    let channel = Arc::new(MemoryChannel::broadcast());
    let seen = record(&channel);

    let _server = Server::with_options(Arc::clone(&channel), test_api(), sequential()).expect("server");
    let _client = Client::with_options(Arc::clone(&channel), sequential());

    assert_eq!(
        message_types(&seen),
        vec!["serverReady", "clientReady", "serverReady"]
    );
}

/// **VALUE**: Verifies a client with the handshake disabled ignores `serverReady`.
///
/// **WHY THIS MATTERS**: The flag is per endpoint. A handshake-enabled server sharing the
/// bus still announces itself, and that must not flip the opted-out client's state.
///
/// **BUG THIS CATCHES**: Would catch the client honouring the flag when sending
/// `clientReady` but not when receiving `serverReady`.
#[tokio::test]
async fn given_client_handshake_disabled_when_server_announces_then_stays_disconnected() {
    // GIVEN: A client that opted out, with a connect handler
    let channel = Arc::new(MemoryChannel::broadcast());
    let client = Client::with_options(Arc::clone(&channel), sequential().with_handshake(false));
    let fired = counting_handler(&client);

    // WHEN: A handshake-enabled server attaches and announces
    let _server = Server::with_options(Arc::clone(&channel), test_api(), sequential()).expect("server");

    // THEN: Not connected, handler never fired, calls still work
    assert!(!client.is_connected());
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    let greeting: String = client.call_as("greet", args!["opted out"]).await.expect("greet");
    assert_eq!(greeting, "Hello, opted out!");
}
