//! The text-message transport endpoints are built on.
//!
//! The protocol only needs three things from a transport: hand it a string,
//! be told about every inbound string, and stop being told. Anything that can
//! do that (a WebSocket, a webview bridge, an in-process bus) is a [`Channel`].

mod listeners;
pub mod memory;
mod outbox;
pub mod websocket;

pub use listeners::ListenerRegistry;
pub use memory::MemoryChannel;
pub(crate) use outbox::Outbox;
pub use websocket::WebSocketChannel;

use std::sync::Arc;

/// Callback invoked once per inbound message, in arrival order.
pub type MessageListener = Arc<dyn Fn(String) + Send + Sync>;

/// Handle returned by [`Channel::add_message_listener`], used to remove it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }
}

pub trait Channel: Send + Sync {
    /// Fire-and-forget delivery of one message.
    fn send_message(&self, message: String);

    fn add_message_listener(&self, listener: MessageListener) -> ListenerId;

    /// Removing an unknown or already-removed listener is a no-op.
    fn remove_message_listener(&self, id: ListenerId);
}
