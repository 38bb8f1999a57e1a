//! Client endpoint: issues calls and routes replies and callbacks back.

pub(crate) mod tables;

use crate::channel::{Channel, ListenerId, Outbox};
use crate::config::EndpointOptions;
use crate::envelope::{Body, Envelope};
use crate::error::CallError;
use crate::handshake::{ConnectHandler, ConnectionState};
use crate::id::{IdSource, Role, endpoint_identity};
use crate::marshal::{CallArg, marshal_args};

use tables::CorrelationTables;

use common::ErrorLocation;

use std::future::Future;
use std::panic::{AssertUnwindSafe, Location, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{oneshot, watch};

/// Calls procedures on whatever [`Server`](crate::Server) listens on the
/// other end of the channel.
///
/// Procedure names are plain strings, so one client serves any interface.
/// For compile-time checked calls, wrap it in a small stub:
///
/// ```no_run
/// use tango_core::{CallError, Client, args};
///
/// struct GreeterStub<'a>(&'a Client);
///
/// impl GreeterStub<'_> {
///     async fn greet(&self, name: &str) -> Result<String, CallError> {
///         self.0.call_as("greet", args![name]).await
///     }
/// }
/// ```
pub struct Client {
    inner: Arc<ClientInner>,
    listener: ListenerId,
}

struct ClientInner {
    outbox: Outbox,
    ids: Arc<dyn IdSource>,
    tables: Mutex<CorrelationTables>,
    connection: Mutex<ConnectionState>,
    connected: watch::Sender<bool>,
    handshake: bool,
}

impl Client {
    pub fn new<C>(channel: Arc<C>) -> Self
    where
        C: Channel + 'static,
    {
        Self::with_options(channel, EndpointOptions::default())
    }

    pub fn with_options<C>(channel: Arc<C>, options: EndpointOptions) -> Self
    where
        C: Channel + 'static,
    {
        let channel: Arc<dyn Channel> = channel;
        let sender_id = endpoint_identity(Role::Client, options.ids.as_ref());
        let (connected, _) = watch::channel(false);

        let inner = Arc::new(ClientInner {
            outbox: Outbox::new(sender_id, Arc::clone(&channel)),
            ids: options.ids,
            tables: Mutex::new(CorrelationTables::default()),
            connection: Mutex::new(ConnectionState::new()),
            connected,
            handshake: options.handshake,
        });

        let weak: Weak<ClientInner> = Arc::downgrade(&inner);
        let listener = channel.add_message_listener(Arc::new(move |message: String| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_message(&message);
            }
        }));

        info!("Client {} attached", inner.outbox.sender_id());

        if inner.handshake {
            inner.outbox.send_or_log(inner.ids.next_id(), Body::ClientReady);
        }

        Self { inner, listener }
    }

    pub fn sender_id(&self) -> &str {
        self.inner.outbox.sender_id()
    }

    /// Invoke `procedure` and wait for its result.
    ///
    /// Function arguments ([`CallArg::Callback`]) stay registered after the
    /// call settles so the server may keep calling them; see
    /// [`release_callback`](Self::release_callback).
    ///
    /// There is no timeout: without a reply the call stays pending until
    /// [`cleanup`](Self::cleanup). Wrap it in `tokio::time::timeout` if needed.
    ///
    /// # Errors
    ///
    /// - [`CallError::Remote`] - the procedure failed; carries the server's message
    /// - [`CallError::Closed`] - the client was cleaned up before a reply arrived
    /// - [`CallError::Encode`] - the invoke envelope could not be encoded
    pub async fn call(&self, procedure: &str, args: Vec<CallArg>) -> Result<Value, CallError> {
        let receiver = self.inner.begin_call(procedure, args)?;
        match receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(CallError::closed(format!(
                "Call to '{procedure}' abandoned before a reply arrived"
            ))),
        }
    }

    /// [`call`](Self::call), deserialising the result into `T`.
    ///
    /// A decode failure reports the line that called `call_as`.
    ///
    /// # Errors
    ///
    /// As [`call`](Self::call), plus [`CallError::Decode`] if the result does not match `T`.
    #[track_caller]
    pub fn call_as<T: DeserializeOwned>(
        &self,
        procedure: &str,
        args: Vec<CallArg>,
    ) -> impl Future<Output = Result<T, CallError>> + Send {
        let location = ErrorLocation::here();
        async move {
            let value = self.call(procedure, args).await?;
            serde_json::from_value(value).map_err(|e| CallError::Decode {
                message: format!("Unexpected result from '{procedure}': {e}"),
                location,
            })
        }
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connection().is_connected()
    }

    /// Register the connect handler, replacing any earlier one.
    ///
    /// Fires once, on the first `serverReady`; fires immediately if the
    /// client is already connected.
    pub fn on_connect<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let handler: ConnectHandler = Arc::new(handler);
        let already_connected = self.inner.connection().set_handler(Arc::clone(&handler));
        if already_connected {
            handler();
        }
    }

    /// Resolve once the handshake has completed.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Closed`] if the client is dropped while waiting.
    pub async fn wait_connected(&self) -> Result<(), CallError> {
        let mut receiver = self.inner.connected.subscribe();
        receiver
            .wait_for(|connected| *connected)
            .await
            .map(|_| ())
            .map_err(|_| CallError::closed("Client dropped while waiting for serverReady"))
    }

    /// Forget a callback registration; later `callback` envelopes for it are ignored.
    ///
    /// Returns `false` if `callback_id` was not registered.
    pub fn release_callback(&self, callback_id: &str) -> bool {
        self.inner.tables().callbacks.release(callback_id)
    }

    pub fn callback_count(&self) -> usize {
        self.inner.tables().callbacks.len()
    }

    pub fn pending_count(&self) -> usize {
        self.inner.tables().pending.len()
    }

    /// Detach from the channel, reject every pending call with
    /// [`CallError::Closed`] and release all callbacks. Idempotent.
    pub fn cleanup(&self) {
        self.inner.outbox.channel().remove_message_listener(self.listener);

        let abandoned = {
            let mut tables = self.inner.tables();
            tables.callbacks.clear();
            tables.pending.drain()
        };

        if !abandoned.is_empty() {
            info!(
                "Client {} rejecting {} pending call(s) on cleanup",
                self.sender_id(),
                abandoned.len()
            );
        }
        for settlement in abandoned {
            let _ = settlement.send(Err(CallError::closed("Client cleaned up")));
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.inner.outbox.channel().remove_message_listener(self.listener);
    }
}

impl ClientInner {
    fn tables(&self) -> MutexGuard<'_, CorrelationTables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn connection(&self) -> MutexGuard<'_, ConnectionState> {
        self.connection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register everything the call needs, then send. Registration comes
    /// first because a synchronous channel may deliver the reply before
    /// `send_message` returns.
    fn begin_call(
        &self,
        procedure: &str,
        args: Vec<CallArg>,
    ) -> Result<oneshot::Receiver<Result<Value, CallError>>, CallError> {
        let id = self.ids.next_id();
        let marshaled = marshal_args(&id, args);
        let callback_ids: Vec<String> = marshaled
            .callbacks
            .iter()
            .map(|(callback_id, _)| callback_id.clone())
            .collect();
        let (settlement, receiver) = oneshot::channel();

        {
            let mut tables = self.tables();
            if !tables.pending.register(id.clone(), settlement) {
                return Err(CallError::Encode {
                    message: format!("Correlation id '{id}' is already pending"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            for (callback_id, callback) in marshaled.callbacks {
                tables.callbacks.register(callback_id, callback);
            }
        }

        let sent = self.outbox.send(
            id.clone(),
            Body::Invoke {
                procedure: procedure.to_string(),
                args: marshaled.encoded,
            },
        );

        if let Err(e) = sent {
            let mut tables = self.tables();
            tables.pending.take(&id);
            for callback_id in &callback_ids {
                tables.callbacks.release(callback_id);
            }
            return Err(CallError::Encode {
                message: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(receiver)
    }

    fn handle_message(&self, message: &str) {
        let envelope = match Envelope::decode(message) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Client {} dropping message: {}", self.outbox.sender_id(), e);
                return;
            }
        };

        if self.outbox.is_own(&envelope) {
            return;
        }

        match envelope.body {
            Body::ServerReady if self.handshake => self.mark_connected(),
            Body::Result { result } => self.settle(&envelope.id, Ok(result)),
            Body::Error { error } => self.settle(
                &envelope.id,
                Err(CallError::Remote {
                    message: error,
                    location: ErrorLocation::from(Location::caller()),
                }),
            ),
            Body::Callback { callback_id, args } => self.run_callback(&callback_id, args),
            other => debug!(
                "Client {} ignoring {} from {}",
                self.outbox.sender_id(),
                other.kind(),
                envelope.sender_id
            ),
        }
    }

    fn mark_connected(&self) {
        let handler = self.connection().mark_connected();
        self.connected.send_replace(true);

        if let Some(handler) = handler {
            info!("Client {} connected", self.outbox.sender_id());
            handler();
        }
    }

    fn settle(&self, id: &str, outcome: Result<Value, CallError>) {
        let Some(settlement) = self.tables().pending.take(id) else {
            debug!("Client {} discarding unmatched reply (id={})", self.outbox.sender_id(), id);
            return;
        };

        if settlement.send(outcome).is_err() {
            debug!("Caller stopped waiting for reply (id={})", id);
        }
    }

    fn run_callback(&self, callback_id: &str, args: Vec<Value>) {
        let Some(callback) = self.tables().callbacks.get(callback_id) else {
            debug!(
                "Client {} ignoring callback for unknown id {}",
                self.outbox.sender_id(),
                callback_id
            );
            return;
        };

        if catch_unwind(AssertUnwindSafe(|| callback(args))).is_err() {
            error!("Callback {} panicked", callback_id);
        }
    }
}
