// Unit tests for RpcConfig load/save/validate

use crate::config::RpcConfig;
use crate::error::ConfigError;
use crate::id::{IdSource, IdStrategy};

use tempfile::tempdir;

#[test]
fn given_missing_file_when_load_then_returns_defaults() {
    let dir = tempdir().expect("tempdir");

    let config = RpcConfig::load(dir.path()).expect("defaults");

    assert_eq!(config, RpcConfig::default());
    assert!(config.endpoint.handshake);
    assert_eq!(config.endpoint.ids, IdStrategy::Timestamp);
    assert_eq!(config.transport.url(), "ws://127.0.0.1:19877");
}

/// **VALUE**: Verifies a saved config loads back identically.
///
/// **WHY THIS MATTERS**: The demo binary persists its port and handshake choice here.
///
/// **BUG THIS CATCHES**: Would catch serde renames that break the round trip or a
/// save that leaves only the temp file behind.
#[test]
fn given_saved_config_when_loaded_then_matches() {
    let dir = tempdir().expect("tempdir");
    let mut config = RpcConfig::default();
    config.endpoint.handshake = false;
    config.endpoint.ids = IdStrategy::Sequential;
    config.transport.port = 20001;

    config.save(dir.path()).expect("save");
    let loaded = RpcConfig::load(dir.path()).expect("load");

    assert_eq!(loaded, config);
    assert!(!dir.path().join("tango.json.tmp").exists());
}

#[test]
fn given_partial_file_when_load_then_missing_fields_defaulted() {
    let dir = tempdir().expect("tempdir");
    std::fs::write(dir.path().join("tango.json"), r#"{"transport":{"port":20002}}"#).expect("write");

    let config = RpcConfig::load(dir.path()).expect("load");

    assert_eq!(config.transport.port, 20002);
    assert_eq!(config.transport.host, "127.0.0.1");
    assert!(config.endpoint.handshake);
}

#[test]
fn given_corrupt_file_when_load_then_parse_error() {
    let dir = tempdir().expect("tempdir");
    std::fs::write(dir.path().join("tango.json"), "{ not json").expect("write");

    let result = RpcConfig::load(dir.path());

    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

/// **VALUE**: Verifies non-loopback hosts are rejected.
///
/// **WHY THIS MATTERS**: The bundled WebSocket transport has no authentication.
///
/// **BUG THIS CATCHES**: Would catch validation only checking that the host parses.
#[test]
fn given_invalid_values_when_validate_then_validation_error() {
    let mut remote = RpcConfig::default();
    remote.transport.host = "0.0.0.0".to_string();

    let mut zero_port = RpcConfig::default();
    zero_port.transport.port = 0;

    let mut future_version = RpcConfig::default();
    future_version.version = 99;

    for config in [remote, zero_port, future_version] {
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { .. })
        ));
    }
}

#[test]
fn given_config_when_endpoint_options_then_reflects_endpoint_section() {
    let mut config = RpcConfig::default();
    config.endpoint.handshake = false;
    config.endpoint.ids = IdStrategy::Sequential;

    let options = config.endpoint_options();

    assert!(!options.handshake);
    assert_eq!(options.ids.next_id(), "0");
}
