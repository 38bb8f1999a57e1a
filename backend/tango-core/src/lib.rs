//! Transport-agnostic RPC with first-class callback arguments.
//!
//! A [`Client`] invokes named procedures served by a [`Server`] over any
//! [`Channel`] that can carry text messages. Function arguments are
//! marshaled as callbacks: the server receives a live proxy it may call any
//! number of times, and each call re-invokes the client's original function.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tango_core::{CallArgs, Client, MemoryChannel, ProcedureError, ProcedureTable, Server, args};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let channel = Arc::new(MemoryChannel::broadcast());
//! let table = ProcedureTable::new(()).procedure("greet", |_, args: CallArgs| async move {
//!     let name: String = args.value(0)?;
//!     Ok::<_, ProcedureError>(format!("Hello, {name}!"))
//! });
//!
//! let _server = Server::new(Arc::clone(&channel), table)?;
//! let client = Client::new(channel);
//! let greeting: String = client.call_as("greet", args!["World"]).await?;
//! assert_eq!(greeting, "Hello, World!");
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod handshake;
pub mod id;
pub mod marshal;
pub mod server;

#[cfg(test)]
mod tests;

pub use channel::{Channel, ListenerId, MemoryChannel, MessageListener, WebSocketChannel};
pub use client::Client;
pub use config::{EndpointOptions, RpcConfig};
pub use envelope::{Body, Envelope};
pub use error::{CallError, CoreError, ProcedureError};
pub use handshake::ConnectHandler;
pub use id::{IdSource, SequentialIds, TimestampIds};
pub use marshal::{Arg, CallArg, CallArgs, LocalCallback, RemoteCallback};
pub use server::{ProcedureFuture, ProcedureTable, Procedures, Server};
