// Unit tests for the envelope codec
// Covers every message type, the legacy spellings and malformed input

use crate::envelope::{Body, CallbackPlaceholder, EncodedArg, Envelope};
use crate::error::ProtocolError;

use serde_json::{Value, json};

/// **VALUE**: Verifies an invoke envelope decodes with plain and callback arguments in order.
///
/// **WHY THIS MATTERS**: Argument position is how procedures read their parameters.
/// A callback placeholder must be recognised wherever it sits in the list.
///
/// **BUG THIS CATCHES**: Would catch the untagged arg enum trying `Value` first and
/// swallowing placeholders as plain objects.
#[test]
fn given_invoke_text_when_decoded_then_args_keep_position_and_kind() {
    // GIVEN: An invoke with a value, a placeholder, and an object that is not a placeholder
    let text = r#"{"id":"7","senderId":"client-1","messageType":"invoke","procedure":"processItems",
        "args":[["a","b"],{"type":"callback","callbackId":"7-1"},{"type":"other"}]}"#;

    // WHEN: Decoding
    let envelope = Envelope::decode(text).expect("should decode");

    // THEN: Fields and argument kinds are preserved
    assert_eq!(envelope.id, "7");
    assert_eq!(envelope.sender_id, "client-1");
    let Body::Invoke { procedure, args } = envelope.body else {
        panic!("expected invoke");
    };
    assert_eq!(procedure, "processItems");
    assert_eq!(args[0], EncodedArg::Value(json!(["a", "b"])));
    assert_eq!(args[1], EncodedArg::Callback(CallbackPlaceholder::new("7-1")));
    assert_eq!(args[2], EncodedArg::Value(json!({"type": "other"})));
}

#[test]
fn given_envelopes_when_encoded_then_use_camel_case_wire_names() {
    let envelope = Envelope::new(
        "noop",
        "server-1",
        Body::Callback {
            callback_id: "3-0".to_string(),
            args: vec![json!("A")],
        },
    );

    let value: Value = serde_json::from_str(&envelope.encode().expect("encode")).expect("json");

    assert_eq!(
        value,
        json!({
            "id": "noop",
            "senderId": "server-1",
            "messageType": "callback",
            "callbackId": "3-0",
            "args": ["A"],
        })
    );
}

#[test]
fn given_placeholder_when_encoded_then_matches_wire_shape() {
    let arg = EncodedArg::Callback(CallbackPlaceholder::new("9-2"));

    let value = serde_json::to_value(&arg).expect("encode");

    assert_eq!(value, json!({"type": "callback", "callbackId": "9-2"}));
}

#[test]
fn given_ready_envelopes_when_encoded_then_carry_no_payload() {
    let client_ready = Envelope::new("1", "client-0", Body::ClientReady);
    let server_ready = Envelope::new("2", "server-0", Body::ServerReady);

    let client_value: Value = serde_json::from_str(&client_ready.encode().expect("encode")).expect("json");
    let server_value: Value = serde_json::from_str(&server_ready.encode().expect("encode")).expect("json");

    assert_eq!(client_value, json!({"id": "1", "senderId": "client-0", "messageType": "clientReady"}));
    assert_eq!(server_value, json!({"id": "2", "senderId": "server-0", "messageType": "serverReady"}));
}

/// **VALUE**: Verifies the `...Message` spellings of older peers still decode.
///
/// **WHY THIS MATTERS**: Existing JavaScript endpoints emit `resultMessage`, `serverReadyMessage`
/// and so on. Rejecting them would make a Rust client unable to talk to those servers.
///
/// **BUG THIS CATCHES**: Would catch a removed serde alias on any variant.
#[test]
fn given_legacy_message_types_when_decoded_then_map_to_same_variants() {
    let cases = [
        (r#"{"id":"1","senderId":"s","messageType":"invokeMessage","procedure":"p","args":[]}"#, "invoke"),
        (r#"{"id":"1","senderId":"s","messageType":"resultMessage","result":3}"#, "result"),
        (r#"{"id":"1","senderId":"s","messageType":"errorMessage","error":"boom"}"#, "error"),
        (r#"{"id":"noop","senderId":"s","messageType":"callbackMessage","callbackId":"1-0","args":[]}"#, "callback"),
        (r#"{"id":"1","senderId":"s","messageType":"clientReadyMessage"}"#, "clientReady"),
        (r#"{"id":"1","senderId":"s","messageType":"serverReadyMessage"}"#, "serverReady"),
    ];

    for (text, kind) in cases {
        let envelope = Envelope::decode(text).unwrap_or_else(|e| panic!("{text}: {e}"));
        assert_eq!(envelope.body.kind(), kind, "Wrong variant for {text}");
    }
}

/// **VALUE**: Verifies a result without a `result` field decodes as `null`.
///
/// **WHY THIS MATTERS**: A JavaScript procedure returning `undefined` serialises with the
/// field omitted. The client must still settle the call.
///
/// **BUG THIS CATCHES**: Would catch removal of `#[serde(default)]`, which would turn every
/// void procedure's reply into a decode error and leave the call pending forever.
#[test]
fn given_result_without_payload_when_decoded_then_result_is_null() {
    let envelope = Envelope::decode(r#"{"id":"4","senderId":"server-0","messageType":"result"}"#)
        .expect("should decode");

    assert_eq!(envelope.body, Body::Result { result: Value::Null });
}

/// **VALUE**: Verifies malformed text yields `ProtocolError::Decode` rather than a panic.
///
/// **WHY THIS MATTERS**: Listeners run inside the channel's delivery loop. A panic there
/// would take the transport down with it.
///
/// **BUG THIS CATCHES**: Would catch decode paths that unwrap, or that accept envelopes
/// missing the fields correlation depends on.
#[test]
fn given_malformed_text_when_decoded_then_returns_decode_error() {
    let cases = [
        "not json",
        "[]",
        r#"{"senderId":"s","messageType":"result","result":1}"#,
        r#"{"id":"1","messageType":"result","result":1}"#,
        r#"{"id":"1","senderId":"s","messageType":"teleport"}"#,
        r#"{"id":"1","senderId":"s","messageType":"invoke","args":[]}"#,
        r#"{"id":"1","senderId":"s","messageType":"error","error":42}"#,
    ];

    for text in cases {
        let result = Envelope::decode(text);
        assert!(
            matches!(result, Err(ProtocolError::Decode { .. })),
            "Should reject {text}"
        );
    }
}
