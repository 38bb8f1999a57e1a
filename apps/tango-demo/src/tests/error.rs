// Unit tests for error conversion and serialisation

use crate::error::DemoError;

use common::ErrorLocation;

use std::panic::Location;

use tango_core::error::TransportError;

/// **VALUE**: Tests that errors serialise with their variant tag.
///
/// **WHY THIS MATTERS**: The demo reports failures as JSON alongside its run report.
///
/// **BUG THIS CATCHES**: Would catch a non-serialisable field sneaking into the enum.
#[test]
fn given_demo_error_when_serialized_then_contains_variant_and_message() {
    // GIVEN: A DemoError
    let err = DemoError::Rpc {
        message: String::from("Test"),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Serializing to JSON
    let json = serde_json::to_string(&err).expect("serializable");

    // THEN: Tag and message present
    assert!(json.contains("\"type\":\"Rpc\""), "Got: {json}");
    assert!(json.contains("Test"));
}

#[test]
fn given_transport_error_when_converted_then_transport_variant_keeps_message() {
    let source = TransportError::Url {
        message: "Unsupported scheme 'http'".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    let err: DemoError = source.into();

    assert!(matches!(err, DemoError::Transport { .. }));
    assert!(err.to_string().contains("Unsupported scheme 'http'"));
}

#[test]
fn given_io_error_when_converted_then_location_is_conversion_site() {
    let line = line!() + 1;
    let err = DemoError::from(std::io::Error::other("port in use"));

    let DemoError::Transport { location, .. } = err else {
        panic!("Expected Transport variant");
    };
    assert_eq!(location.line, line);
    assert!(location.file.ends_with("error.rs"));
}
