use crate::error::ProtocolError;

use common::ErrorLocation;

use thiserror::Error as ThisError;

/// Server-side failure of a single invocation.
///
/// Only [`ProcedureError::wire_message`] crosses the channel; the variant and
/// location stay on the server.
#[derive(Debug, ThisError)]
pub enum ProcedureError {
    #[error("Procedure Not Found Error: Procedure '{procedure}' is not a function {location}")]
    NotFound {
        procedure: String,
        location: ErrorLocation,
    },

    #[error("Procedure Execution Error: {message} {location}")]
    Execution {
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid Argument Error: argument {index}: {message} {location}")]
    InvalidArgument {
        index: usize,
        message: String,
        location: ErrorLocation,
    },
}

impl ProcedureError {
    #[track_caller]
    pub fn not_found(procedure: &str) -> Self {
        ProcedureError::NotFound {
            procedure: procedure.to_string(),
            location: ErrorLocation::here(),
        }
    }

    #[track_caller]
    pub fn execution(message: impl Into<String>) -> Self {
        ProcedureError::Execution {
            message: message.into(),
            location: ErrorLocation::here(),
        }
    }

    #[track_caller]
    pub fn invalid_argument(index: usize, message: impl Into<String>) -> Self {
        ProcedureError::InvalidArgument {
            index,
            message: message.into(),
            location: ErrorLocation::here(),
        }
    }

    /// Text placed in the `error` field of the reply envelope.
    pub fn wire_message(&self) -> String {
        match self {
            ProcedureError::NotFound { procedure, .. } => {
                format!("Procedure '{procedure}' is not a function")
            }
            ProcedureError::Execution { message, .. } => message.clone(),
            ProcedureError::InvalidArgument { index, message, .. } => {
                format!("Invalid argument {index}: {message}")
            }
        }
    }
}

impl From<String> for ProcedureError {
    #[track_caller]
    fn from(message: String) -> Self {
        ProcedureError::execution(message)
    }
}

impl From<&str> for ProcedureError {
    #[track_caller]
    fn from(message: &str) -> Self {
        ProcedureError::execution(message)
    }
}

impl From<serde_json::Error> for ProcedureError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        ProcedureError::execution(error.to_string())
    }
}

impl From<ProtocolError> for ProcedureError {
    #[track_caller]
    fn from(error: ProtocolError) -> Self {
        ProcedureError::execution(error.to_string())
    }
}
