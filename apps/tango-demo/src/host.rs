//! Loopback WebSocket host serving [`demo_api`] to each connection.
//!
//! - Binds to a loopback address only
//! - Rejects non-loopback peers before the WebSocket upgrade
//! - Runs one [`Server`] per connection, detached when the peer leaves

use crate::api::demo_api;
use crate::error::DemoError;

use common::ErrorLocation;

use std::net::SocketAddr;
use std::panic::Location;
use std::sync::Arc;

use log::{error, info, warn};
use tango_core::{EndpointOptions, Server, WebSocketChannel};
use tokio::net::{TcpListener, TcpStream};
use tokio::spawn as TokioSpawn;
use tokio::task::JoinHandle;

/// Handle to a running host. Dropping it stops accepting new connections;
/// connections already being served run until their peer disconnects.
pub struct RpcHostHandle {
    address: SocketAddr,
    accept_loop: JoinHandle<()>,
}

impl RpcHostHandle {
    /// Address actually bound, useful when asked for port 0.
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.address)
    }

    pub fn shutdown(&self) {
        self.accept_loop.abort();
    }
}

impl Drop for RpcHostHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Bind `address` and start accepting connections in the background.
///
/// # Errors
///
/// - [`DemoError::Transport`] - `address` is unparsable, not loopback, or cannot be bound
pub async fn start_rpc_host(
    address: &str,
    options: EndpointOptions,
) -> Result<RpcHostHandle, DemoError> {
    let requested: SocketAddr = address.parse().map_err(|e| DemoError::Transport {
        message: format!("Invalid listen address '{address}': {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;
    if !requested.ip().is_loopback() {
        return Err(DemoError::Transport {
            message: format!("Refusing to listen on non-loopback address {requested}"),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let listener = TcpListener::bind(requested).await?;
    let address = listener.local_addr()?;

    info!("RPC host listening on {}", address);

    let accept_loop = TokioSpawn(async move {
        while let Ok((stream, peer)) = listener.accept().await {
            info!("Client connecting from {}", peer);
            let options = options.clone();
            TokioSpawn(async move {
                if let Err(e) = handle_connection(stream, peer, options).await {
                    error!("Connection from {} failed: {}", peer, e);
                }
            });
        }
    });

    Ok(RpcHostHandle {
        address,
        accept_loop,
    })
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    options: EndpointOptions,
) -> Result<(), DemoError> {
    if !peer.ip().is_loopback() {
        warn!("Rejected non-loopback connection from {}", peer);
        return Ok(());
    }

    let channel = Arc::new(WebSocketChannel::accept(stream).await?);
    let server = Server::with_options(Arc::clone(&channel), demo_api(), options)?;

    info!("Serving {} as {}", peer, server.sender_id());
    channel.disconnected().await;

    server.cleanup();
    channel.close();
    info!("Client {} disconnected", peer);
    Ok(())
}
