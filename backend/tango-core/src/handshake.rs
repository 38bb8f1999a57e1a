//! Connection state for the ready/ready-ack handshake.
//!
//! The client starts `Disconnected` and becomes `Connected` on the first
//! `serverReady` it sees. There is no way back: silence on the channel is
//! not a disconnect as far as this protocol is concerned.

use std::sync::Arc;

/// Handler fired on the `Disconnected -> Connected` edge.
pub type ConnectHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
pub(crate) struct ConnectionState {
    connected: bool,
    on_connect: Option<ConnectHandler>,
}

impl ConnectionState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected
    }

    /// Record a `serverReady`.
    ///
    /// Returns the handler to fire if this was the connecting edge, `None`
    /// for every repeat.
    pub(crate) fn mark_connected(&mut self) -> Option<ConnectHandler> {
        if self.connected {
            return None;
        }
        self.connected = true;
        self.on_connect.clone()
    }

    /// Install the connect handler, replacing any previous one.
    ///
    /// Returns `true` if already connected, in which case the caller fires
    /// the handler itself.
    pub(crate) fn set_handler(&mut self, handler: ConnectHandler) -> bool {
        self.on_connect = Some(handler);
        self.connected
    }
}
