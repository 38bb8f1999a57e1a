use common::ErrorLocation;

use std::io::Error as IoError;
use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum TransportError {
    #[error("Url Error: {message} {location}")]
    Url {
        message: String,
        location: ErrorLocation,
    },

    #[error("Connect Error: {message} {location}")]
    Connect {
        message: String,
        location: ErrorLocation,
    },

    #[error("Handshake Error: {message} {location}")]
    Handshake {
        message: String,
        location: ErrorLocation,
    },

    #[error("IO Error: {message} {location}")]
    Io {
        message: String,
        location: ErrorLocation,
    },
}

impl From<IoError> for TransportError {
    #[track_caller]
    fn from(error: IoError) -> Self {
        TransportError::Io {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<url::ParseError> for TransportError {
    #[track_caller]
    fn from(error: url::ParseError) -> Self {
        TransportError::Url {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
