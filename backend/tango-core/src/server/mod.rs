//! Server endpoint: receives `invoke` envelopes and answers them.

mod procedures;

pub use procedures::{ProcedureFuture, ProcedureTable, Procedures};

use crate::channel::{Channel, ListenerId, Outbox};
use crate::config::EndpointOptions;
use crate::envelope::{Body, EncodedArg, Envelope};
use crate::error::{EndpointError, ProcedureError};
use crate::id::{IdSource, Role, endpoint_identity};
use crate::marshal::{CallArgs, unmarshal_args};

use common::ErrorLocation;

use std::any::Any;
use std::panic::{AssertUnwindSafe, Location, catch_unwind};
use std::sync::{Arc, Weak};

use futures_util::FutureExt;
use log::{debug, info, warn};
use serde_json::Value;
use tokio::runtime::Handle;

/// Binds a [`Procedures`] implementation to a [`Channel`].
///
/// Each `invoke` runs on its own Tokio task, so a slow procedure never holds
/// up dispatch of the envelopes behind it. Failures, including panics, are
/// answered with an `error` envelope and never escape into the channel.
pub struct Server {
    inner: Arc<ServerInner>,
    listener: ListenerId,
}

struct ServerInner {
    outbox: Outbox,
    ids: Arc<dyn IdSource>,
    procedures: Arc<dyn Procedures>,
    handshake: bool,
    runtime: Handle,
}

impl Server {
    /// # Errors
    ///
    /// Returns [`EndpointError::NoRuntime`] when called outside a Tokio runtime.
    pub fn new<C, P>(channel: Arc<C>, procedures: P) -> Result<Self, EndpointError>
    where
        C: Channel + 'static,
        P: Procedures + 'static,
    {
        Self::with_options(channel, procedures, EndpointOptions::default())
    }

    /// # Errors
    ///
    /// Returns [`EndpointError::NoRuntime`] when called outside a Tokio runtime.
    pub fn with_options<C, P>(
        channel: Arc<C>,
        procedures: P,
        options: EndpointOptions,
    ) -> Result<Self, EndpointError>
    where
        C: Channel + 'static,
        P: Procedures + 'static,
    {
        let runtime = Handle::try_current().map_err(|e| EndpointError::NoRuntime {
            message: format!("Server must be created inside a Tokio runtime: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let channel: Arc<dyn Channel> = channel;
        let sender_id = endpoint_identity(Role::Server, options.ids.as_ref());
        let inner = Arc::new(ServerInner {
            outbox: Outbox::new(sender_id, Arc::clone(&channel)),
            ids: options.ids,
            procedures: Arc::new(procedures),
            handshake: options.handshake,
            runtime,
        });

        let weak: Weak<ServerInner> = Arc::downgrade(&inner);
        let listener = channel.add_message_listener(Arc::new(move |message: String| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_message(&message);
            }
        }));

        info!("Server {} attached", inner.outbox.sender_id());

        if inner.handshake {
            inner.announce_ready();
        }

        Ok(Self { inner, listener })
    }

    pub fn sender_id(&self) -> &str {
        self.inner.outbox.sender_id()
    }

    /// Detach from the channel. Idempotent.
    ///
    /// Invocations already running still deliver their replies, and callback
    /// proxies handed out earlier keep working.
    pub fn cleanup(&self) {
        self.inner.outbox.channel().remove_message_listener(self.listener);
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.cleanup();
    }
}

impl ServerInner {
    fn handle_message(&self, message: &str) {
        let envelope = match Envelope::decode(message) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Server {} dropping message: {}", self.outbox.sender_id(), e);
                return;
            }
        };

        if self.outbox.is_own(&envelope) {
            return;
        }

        match envelope.body {
            Body::Invoke { procedure, args } => self.dispatch(envelope.id, procedure, args),
            Body::ClientReady if self.handshake => {
                debug!("Server {} saw clientReady from {}", self.outbox.sender_id(), envelope.sender_id);
                self.announce_ready();
            }
            other => debug!(
                "Server {} ignoring {} from {}",
                self.outbox.sender_id(),
                other.kind(),
                envelope.sender_id
            ),
        }
    }

    fn announce_ready(&self) {
        self.outbox.send_or_log(self.ids.next_id(), Body::ServerReady);
    }

    fn dispatch(&self, id: String, procedure: String, args: Vec<EncodedArg>) {
        debug!("Server {} invoking '{}' (id={})", self.outbox.sender_id(), procedure, id);

        let args = CallArgs::new(unmarshal_args(args, &self.outbox));
        let started = catch_unwind(AssertUnwindSafe(|| self.procedures.dispatch(&procedure, args)));

        let running = match started {
            Ok(Some(running)) => running,
            Ok(None) => {
                let error = ProcedureError::not_found(&procedure);
                warn!("{}", error);
                self.reply(id, Err(error));
                return;
            }
            Err(panic) => {
                self.reply(id, Err(panicked(&procedure, panic.as_ref())));
                return;
            }
        };

        let outbox = self.outbox.clone();
        self.runtime.spawn(async move {
            let outcome = match AssertUnwindSafe(running).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(panic) => Err(panicked(&procedure, panic.as_ref())),
            };
            reply_with(&outbox, id, outcome);
        });
    }

    fn reply(&self, id: String, outcome: Result<Value, ProcedureError>) {
        reply_with(&self.outbox, id, outcome);
    }
}

fn reply_with(outbox: &Outbox, id: String, outcome: Result<Value, ProcedureError>) {
    let body = match outcome {
        Ok(result) => Body::Result { result },
        Err(error) => {
            debug!("Procedure failed (id={}): {}", id, error);
            Body::Error {
                error: error.wire_message(),
            }
        }
    };
    outbox.send_or_log(id, body);
}

#[track_caller]
fn panicked(procedure: &str, panic: &(dyn Any + Send)) -> ProcedureError {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());

    warn!("Procedure '{}' panicked: {}", procedure, detail);
    ProcedureError::execution(detail)
}
