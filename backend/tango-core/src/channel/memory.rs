//! In-process channels.

use crate::channel::{Channel, ListenerId, ListenerRegistry, MessageListener};

use std::sync::Arc;

/// In-process channel delivering synchronously inside `send_message`.
///
/// [`MemoryChannel::broadcast`] builds a bus where every message reaches
/// every listener, the sender's own included, which is the shape of
/// window-messaging style transports. [`MemoryChannel::pair`] builds two
/// connected ends that only see each other's messages.
#[derive(Clone)]
pub struct MemoryChannel {
    inbound: Arc<ListenerRegistry>,
    outbound: Arc<ListenerRegistry>,
}

impl MemoryChannel {
    pub fn broadcast() -> Self {
        let registry = Arc::new(ListenerRegistry::new());
        Self {
            inbound: Arc::clone(&registry),
            outbound: registry,
        }
    }

    pub fn pair() -> (Self, Self) {
        let left = Arc::new(ListenerRegistry::new());
        let right = Arc::new(ListenerRegistry::new());

        (
            Self {
                inbound: Arc::clone(&left),
                outbound: Arc::clone(&right),
            },
            Self {
                inbound: right,
                outbound: left,
            },
        )
    }

    /// Listeners currently attached to this end.
    pub fn listener_count(&self) -> usize {
        self.inbound.len()
    }
}

impl Default for MemoryChannel {
    fn default() -> Self {
        Self::broadcast()
    }
}

impl Channel for MemoryChannel {
    fn send_message(&self, message: String) {
        self.outbound.deliver(&message);
    }

    fn add_message_listener(&self, listener: MessageListener) -> ListenerId {
        self.inbound.add(listener)
    }

    fn remove_message_listener(&self, id: ListenerId) {
        self.inbound.remove(id);
    }
}
