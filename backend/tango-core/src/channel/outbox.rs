use crate::channel::Channel;
use crate::envelope::{Body, Envelope};
use crate::error::ProtocolError;

use std::sync::Arc;

use log::{debug, error};

/// Sending half of an endpoint: its channel plus the `senderId` stamped on
/// everything it emits.
#[derive(Clone)]
pub(crate) struct Outbox {
    sender_id: Arc<str>,
    channel: Arc<dyn Channel>,
}

impl Outbox {
    pub(crate) fn new(sender_id: String, channel: Arc<dyn Channel>) -> Self {
        Self {
            sender_id: Arc::from(sender_id),
            channel,
        }
    }

    pub(crate) fn sender_id(&self) -> &str {
        &self.sender_id
    }

    pub(crate) fn channel(&self) -> &Arc<dyn Channel> {
        &self.channel
    }

    pub(crate) fn is_own(&self, envelope: &Envelope) -> bool {
        envelope.sender_id == *self.sender_id
    }

    pub(crate) fn send(&self, id: impl Into<String>, body: Body) -> Result<(), ProtocolError> {
        let envelope = Envelope::new(id, self.sender_id.as_ref(), body);
        let text = envelope.encode()?;

        debug!(
            "{} -> {} (id={})",
            self.sender_id,
            envelope.body.kind(),
            envelope.id
        );
        self.channel.send_message(text);
        Ok(())
    }

    /// Send where nobody is waiting on the outcome; failures are logged.
    pub(crate) fn send_or_log(&self, id: impl Into<String>, body: Body) {
        if let Err(e) = self.send(id, body) {
            error!("{} failed to send envelope: {}", self.sender_id, e);
        }
    }
}
