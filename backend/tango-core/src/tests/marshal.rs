// Unit tests for callback marshaling
// Covers placeholder substitution on the client and argument access on the server

use crate::envelope::{CallbackPlaceholder, EncodedArg};
use crate::error::ProcedureError;
use crate::marshal::{Arg, CallArg, CallArgs, callback_id, marshal_args};

use serde_json::{Value, json};

/// **VALUE**: Verifies function arguments become placeholders keyed `<call id>-<position>`.
///
/// **WHY THIS MATTERS**: The position suffix is what keeps two callbacks on one call apart.
///
/// **BUG THIS CATCHES**: Would catch ids derived from a callback counter instead of the
/// argument position, or plain values being shifted when callbacks are extracted.
#[test]
fn given_mixed_args_when_marshaled_then_callbacks_replaced_in_place() {
    // GIVEN: value, callback, value, callback
    let args = vec![
        CallArg::value("Hello"),
        CallArg::callback(|_| {}),
        CallArg::value(2),
        CallArg::callback(|_| {}),
    ];

    // WHEN: Marshaling for call "42"
    let marshaled = marshal_args("42", args);

    // THEN: Placeholders sit where the functions were
    assert_eq!(
        marshaled.encoded,
        vec![
            EncodedArg::Value(json!("Hello")),
            EncodedArg::Callback(CallbackPlaceholder::new("42-1")),
            EncodedArg::Value(json!(2)),
            EncodedArg::Callback(CallbackPlaceholder::new("42-3")),
        ]
    );
    let registered: Vec<&str> = marshaled
        .callbacks
        .iter()
        .map(|(id, _)| id.as_str())
        .collect();
    assert_eq!(registered, vec!["42-1", "42-3"]);
}

#[test]
fn given_call_id_when_callback_id_then_appends_position() {
    assert_eq!(callback_id("lk2f-abc", 0), "lk2f-abc-0");
}

#[test]
fn given_args_macro_when_used_then_builds_value_args() {
    let args = crate::args![1, "two", json!({"three": 3})];

    assert_eq!(args.len(), 3);
    assert!(matches!(&args[1], CallArg::Value(Value::String(s)) if s == "two"));
}

#[test]
fn given_unserialisable_value_when_json_arg_then_returns_encode_error() {
    use std::collections::HashMap;

    let mut map = HashMap::new();
    map.insert((1, 2), "tuple keys are not JSON");

    let result = CallArg::json(&map);

    assert!(matches!(result, Err(crate::error::CallError::Encode { .. })));
}

#[test]
fn given_call_args_when_value_read_then_deserialises_by_position() {
    let args = CallArgs::new(vec![Arg::Value(json!(1)), Arg::Value(json!(["a", "b"]))]);

    let first: i64 = args.value(0).expect("first");
    let second: Vec<String> = args.value(1).expect("second");
    let missing: Option<String> = args.value(2).expect("missing reads as null");

    assert_eq!(first, 1);
    assert_eq!(second, vec!["a", "b"]);
    assert_eq!(missing, None);
}

#[test]
fn given_wrong_shape_when_value_read_then_invalid_argument() {
    let args = CallArgs::new(vec![Arg::Value(json!("not a number"))]);

    let result = args.value::<i64>(0);

    assert!(matches!(
        result,
        Err(ProcedureError::InvalidArgument { index: 0, .. })
    ));
}

#[test]
fn given_value_where_callback_expected_then_invalid_argument() {
    let args = CallArgs::new(vec![Arg::Value(json!(1))]);

    let result = args.callback(0);
    let missing = args.callback(5);

    let error = result.expect_err("value is not a callback");
    assert_eq!(error.wire_message(), "Invalid argument 0: expected a callback, got a value");
    assert!(missing.is_err());
}
