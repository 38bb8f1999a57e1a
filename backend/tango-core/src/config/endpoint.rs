use crate::id::{IdSource, TimestampIds};

use std::fmt;
use std::sync::Arc;

/// Construction options shared by [`Server`](crate::Server) and [`Client`](crate::Client).
#[derive(Clone)]
pub struct EndpointOptions {
    /// Exchange `clientReady`/`serverReady` and track connection state.
    pub handshake: bool,
    /// Source of `senderId`s and correlation ids.
    pub ids: Arc<dyn IdSource>,
}

impl EndpointOptions {
    pub fn with_handshake(mut self, handshake: bool) -> Self {
        self.handshake = handshake;
        self
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }
}

impl Default for EndpointOptions {
    fn default() -> Self {
        Self {
            handshake: true,
            ids: Arc::new(TimestampIds),
        }
    }
}

impl fmt::Debug for EndpointOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointOptions")
            .field("handshake", &self.handshake)
            .finish_non_exhaustive()
    }
}
