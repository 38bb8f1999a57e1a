use common::ErrorLocation;

use std::panic::Location;

use serde::Serialize;
use tango_core::error::{CallError, ConfigError, EndpointError, TransportError};
use thiserror::Error;

/// Errors surfaced by the demo binary.
///
/// Library errors are flattened to their display text so the whole enum
/// stays serialisable for reporting.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum DemoError {
    /// Error from this app
    #[error("Demo Error: {message} {location}")]
    Demo {
        message: String,
        location: ErrorLocation,
    },

    /// Config file could not be loaded
    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },

    /// Listener, socket or WebSocket failure
    #[error("Transport Error: {message} {location}")]
    Transport {
        message: String,
        location: ErrorLocation,
    },

    /// Endpoint construction or a remote call failed
    #[error("Rpc Error: {message} {location}")]
    Rpc {
        message: String,
        location: ErrorLocation,
    },
}

impl From<ConfigError> for DemoError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        DemoError::Config {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<TransportError> for DemoError {
    #[track_caller]
    fn from(error: TransportError) -> Self {
        DemoError::Transport {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<std::io::Error> for DemoError {
    #[track_caller]
    fn from(error: std::io::Error) -> Self {
        DemoError::Transport {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<EndpointError> for DemoError {
    #[track_caller]
    fn from(error: EndpointError) -> Self {
        DemoError::Rpc {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<CallError> for DemoError {
    #[track_caller]
    fn from(error: CallError) -> Self {
        DemoError::Rpc {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
