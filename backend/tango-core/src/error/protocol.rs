use common::ErrorLocation;

use thiserror::Error as ThisError;

/// Failures turning envelopes into channel text and back.
#[derive(Debug, ThisError)]
pub enum ProtocolError {
    /// Inbound text was not a well-formed envelope. There is no id to reply
    /// to, so receivers log and drop.
    #[error("Decode Error: {message} {location}")]
    Decode {
        message: String,
        location: ErrorLocation,
    },

    #[error("Encode Error: {message} {location}")]
    Encode {
        message: String,
        location: ErrorLocation,
    },
}

impl ProtocolError {
    #[track_caller]
    pub(crate) fn decode(error: serde_json::Error) -> Self {
        ProtocolError::Decode {
            message: format!("Malformed envelope: {error}"),
            location: ErrorLocation::here(),
        }
    }

    #[track_caller]
    pub(crate) fn encode(error: serde_json::Error) -> Self {
        ProtocolError::Encode {
            message: format!("Failed to encode envelope: {error}"),
            location: ErrorLocation::here(),
        }
    }
}
