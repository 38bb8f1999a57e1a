use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum EndpointError {
    #[error("Runtime Error: {message} {location}")]
    NoRuntime {
        message: String,
        location: ErrorLocation,
    },
}
