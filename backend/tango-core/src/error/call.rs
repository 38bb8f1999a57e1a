use common::ErrorLocation;

use thiserror::Error as ThisError;

/// Rejection observed by a client-side call.
#[derive(Debug, ThisError)]
pub enum CallError {
    /// The server answered with an `error` envelope.
    #[error("Remote Error: {message} {location}")]
    Remote {
        message: String,
        location: ErrorLocation,
    },

    /// The call was abandoned locally before any reply arrived.
    #[error("Closed Error: {message} {location}")]
    Closed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Encode Error: {message} {location}")]
    Encode {
        message: String,
        location: ErrorLocation,
    },

    #[error("Decode Error: {message} {location}")]
    Decode {
        message: String,
        location: ErrorLocation,
    },
}

impl CallError {
    /// The server's textual rendering of the failure, for `Remote` rejections.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            CallError::Remote { message, .. } => Some(message),
            _ => None,
        }
    }

    #[track_caller]
    pub(crate) fn closed(message: impl Into<String>) -> Self {
        CallError::Closed {
            message: message.into(),
            location: ErrorLocation::here(),
        }
    }
}
