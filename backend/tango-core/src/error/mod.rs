pub mod call;
pub mod config;
pub mod endpoint;
pub mod procedure;
pub mod protocol;
pub mod transport;

pub use call::CallError;
pub use config::ConfigError;
pub use endpoint::EndpointError;
pub use procedure::ProcedureError;
pub use protocol::ProtocolError;
pub use transport::TransportError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Procedure(#[from] ProcedureError),

    #[error(transparent)]
    Call(#[from] CallError),

    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
