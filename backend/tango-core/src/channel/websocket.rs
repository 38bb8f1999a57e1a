//! Channel over a WebSocket connection, one text frame per envelope.

use crate::channel::{Channel, ListenerId, ListenerRegistry, MessageListener};
use crate::error::TransportError;

use common::ErrorLocation;

use std::panic::Location;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async, connect_async};
use url::Url;

/// WebSocket-backed [`Channel`].
///
/// A writer task drains an unbounded queue so `send_message` never blocks
/// and preserves send order. A reader task hands every inbound text frame to
/// the listeners in arrival order. Both tasks stop on [`close`](Self::close)
/// or drop.
pub struct WebSocketChannel {
    outbound: mpsc::UnboundedSender<String>,
    listeners: Arc<ListenerRegistry>,
    peer_gone: watch::Receiver<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl WebSocketChannel {
    /// Dial a `ws://` or `wss://` endpoint.
    ///
    /// # Errors
    ///
    /// - [`TransportError::Url`] - unparsable url or a non-WebSocket scheme
    /// - [`TransportError::Connect`] - TCP connect or upgrade failed
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let url = Url::parse(url)?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(TransportError::Url {
                message: format!("Unsupported scheme '{}', expected ws or wss", url.scheme()),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let (stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::Connect {
                message: format!("Failed to connect to {url}: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!("WebSocket channel connected to {}", url);
        Ok(Self::from_stream(stream))
    }

    /// Complete the server side of the WebSocket upgrade on an accepted socket.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Handshake`] if the upgrade fails.
    pub async fn accept(stream: TcpStream) -> Result<Self, TransportError> {
        let stream = accept_async(stream)
            .await
            .map_err(|e| TransportError::Handshake {
                message: format!("WebSocket handshake failed: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(Self::from_stream(stream))
    }

    /// Wrap an already-upgraded stream. Must be called within a Tokio runtime.
    pub fn from_stream<S>(stream: WebSocketStream<S>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut write, mut read) = stream.split();
        let (outbound, mut queue) = mpsc::unbounded_channel::<String>();
        let listeners = Arc::new(ListenerRegistry::new());
        let (gone, peer_gone) = watch::channel(false);

        let writer = tokio::spawn(async move {
            while let Some(text) = queue.recv().await {
                if let Err(e) = write.send(Message::Text(text.into())).await {
                    error!("WebSocket channel send failed: {}", e);
                    break;
                }
            }
            if let Err(e) = write.close().await {
                debug!("WebSocket channel close failed: {}", e);
            }
        });

        let reader_listeners = Arc::clone(&listeners);
        let reader = tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => reader_listeners.deliver(text.as_str()),
                    Ok(Message::Binary(_)) => {
                        warn!("WebSocket channel ignoring binary frame");
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        error!("WebSocket channel read failed: {}", e);
                        break;
                    }
                }
            }
            info!("WebSocket channel peer disconnected");
            gone.send_replace(true);
        });

        Self {
            outbound,
            listeners,
            peer_gone,
            tasks: Mutex::new(vec![writer, reader]),
        }
    }

    /// Stop the reader and writer tasks. Idempotent.
    pub fn close(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
        for task in tasks {
            task.abort();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed() || *self.peer_gone.borrow()
    }

    /// Resolve once the peer has gone away or the channel was closed.
    pub async fn disconnected(&self) {
        let mut peer_gone = self.peer_gone.clone();
        // An error means the reader task is gone, which is a disconnect too.
        let _ = peer_gone.wait_for(|gone| *gone).await;
    }
}

impl Channel for WebSocketChannel {
    fn send_message(&self, message: String) {
        if self.outbound.send(message).is_err() {
            warn!("WebSocket channel closed, dropping outbound message");
        }
    }

    fn add_message_listener(&self, listener: MessageListener) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_message_listener(&self, id: ListenerId) {
        self.listeners.remove(id);
    }
}

impl Drop for WebSocketChannel {
    fn drop(&mut self) {
        self.close();
    }
}
