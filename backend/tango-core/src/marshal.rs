//! Callback marshaling.
//!
//! A function cannot cross a text channel. On the way out, the client swaps
//! each function argument for a [`CallbackPlaceholder`] and remembers the
//! function under the placeholder's id. On the way in, the server swaps each
//! placeholder for a [`RemoteCallback`], a proxy whose only behaviour is to
//! send a `callback` envelope carrying its arguments and that id.
//!
//! Proxies are live, not one-shot: a server may keep a [`RemoteCallback`]
//! and call it long after the originating call was answered.

use crate::channel::Outbox;
use crate::envelope::{Body, CALLBACK_ENVELOPE_ID, CallbackPlaceholder, EncodedArg};
use crate::error::{CallError, ProcedureError, ProtocolError};

use common::ErrorLocation;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Client-side function passed as a call argument.
pub type LocalCallback = Arc<dyn Fn(Vec<Value>) + Send + Sync>;

/// One positional argument of a client call.
#[derive(Clone)]
pub enum CallArg {
    Value(Value),
    Callback(LocalCallback),
}

impl CallArg {
    pub fn value(value: impl Into<Value>) -> Self {
        CallArg::Value(value.into())
    }

    /// Serialise any `Serialize` type as a plain argument.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Encode`] if serialisation fails (for example a
    /// map with non-string keys).
    #[track_caller]
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, CallError> {
        let location = ErrorLocation::here();
        serde_json::to_value(value)
            .map(CallArg::Value)
            .map_err(|e| CallError::Encode {
                message: format!("Failed to serialise argument: {e}"),
                location,
            })
    }

    pub fn callback<F>(callback: F) -> Self
    where
        F: Fn(Vec<Value>) + Send + Sync + 'static,
    {
        CallArg::Callback(Arc::new(callback))
    }
}

impl fmt::Debug for CallArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallArg::Value(value) => f.debug_tuple("Value").field(value).finish(),
            CallArg::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Build a `Vec<CallArg>` from plain values, e.g. `args![1, "two", json!({})]`.
///
/// Callback arguments are pushed with [`CallArg::callback`].
#[macro_export]
macro_rules! args {
    () => { ::std::vec::Vec::<$crate::CallArg>::new() };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::CallArg::value($value)),+]
    };
}

/// Id under which the callback at `position` of call `call_id` is registered.
pub fn callback_id(call_id: &str, position: usize) -> String {
    format!("{call_id}-{position}")
}

/// Result of preparing a call's arguments for the wire.
pub(crate) struct MarshaledArgs {
    pub(crate) encoded: Vec<EncodedArg>,
    pub(crate) callbacks: Vec<(String, LocalCallback)>,
}

pub(crate) fn marshal_args(call_id: &str, args: Vec<CallArg>) -> MarshaledArgs {
    let mut callbacks = Vec::new();
    let encoded = args
        .into_iter()
        .enumerate()
        .map(|(position, arg)| match arg {
            CallArg::Value(value) => EncodedArg::Value(value),
            CallArg::Callback(callback) => {
                let id = callback_id(call_id, position);
                callbacks.push((id.clone(), callback));
                EncodedArg::Callback(CallbackPlaceholder::new(id))
            }
        })
        .collect();

    MarshaledArgs { encoded, callbacks }
}

/// Server-side proxy for a function the client passed as an argument.
#[derive(Clone)]
pub struct RemoteCallback {
    callback_id: String,
    outbox: Outbox,
}

impl RemoteCallback {
    pub(crate) fn new(callback_id: String, outbox: Outbox) -> Self {
        Self {
            callback_id,
            outbox,
        }
    }

    pub fn callback_id(&self) -> &str {
        &self.callback_id
    }

    /// Invoke the client's function with `args`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Encode`] if the envelope cannot be encoded.
    pub fn call(&self, args: Vec<Value>) -> Result<(), ProtocolError> {
        self.outbox.send(
            CALLBACK_ENVELOPE_ID,
            Body::Callback {
                callback_id: self.callback_id.clone(),
                args,
            },
        )
    }

    /// Invoke the client's function with a single serialisable argument.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Encode`] if `arg` or the envelope fails to encode.
    #[track_caller]
    pub fn call_with<T: Serialize + ?Sized>(&self, arg: &T) -> Result<(), ProtocolError> {
        let arg = serde_json::to_value(arg).map_err(|error| ProtocolError::encode(error))?;
        self.call(vec![arg])
    }
}

impl fmt::Debug for RemoteCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCallback")
            .field("callback_id", &self.callback_id)
            .finish()
    }
}

/// One positional argument as seen by a procedure.
#[derive(Debug, Clone)]
pub enum Arg {
    Value(Value),
    Callback(RemoteCallback),
}

pub(crate) fn unmarshal_args(args: Vec<EncodedArg>, outbox: &Outbox) -> Vec<Arg> {
    args.into_iter()
        .map(|arg| match arg {
            EncodedArg::Value(value) => Arg::Value(value),
            EncodedArg::Callback(placeholder) => {
                Arg::Callback(RemoteCallback::new(placeholder.callback_id, outbox.clone()))
            }
        })
        .collect()
}

/// Positional arguments handed to a procedure, in the caller's order.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    args: Vec<Arg>,
}

impl CallArgs {
    pub fn new(args: Vec<Arg>) -> Self {
        Self { args }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arg> {
        self.args.get(index)
    }

    /// Deserialise the plain argument at `index`.
    ///
    /// A missing trailing argument reads as `null`, so `Option<T>` parameters
    /// may be omitted by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`ProcedureError::InvalidArgument`] if the argument is a
    /// callback or does not match `T`.
    #[track_caller]
    pub fn value<T: DeserializeOwned>(&self, index: usize) -> Result<T, ProcedureError> {
        let value = match self.args.get(index) {
            Some(Arg::Value(value)) => value.clone(),
            Some(Arg::Callback(_)) => {
                return Err(ProcedureError::invalid_argument(
                    index,
                    "expected a value, got a callback",
                ));
            }
            None => Value::Null,
        };

        let location = ErrorLocation::here();
        serde_json::from_value(value).map_err(|e| ProcedureError::InvalidArgument {
            index,
            message: e.to_string(),
            location,
        })
    }

    /// # Errors
    ///
    /// Returns [`ProcedureError::InvalidArgument`] if there is no callback at `index`.
    #[track_caller]
    pub fn callback(&self, index: usize) -> Result<RemoteCallback, ProcedureError> {
        match self.args.get(index) {
            Some(Arg::Callback(callback)) => Ok(callback.clone()),
            Some(Arg::Value(_)) => Err(ProcedureError::invalid_argument(
                index,
                "expected a callback, got a value",
            )),
            None => Err(ProcedureError::invalid_argument(index, "missing callback")),
        }
    }

    pub fn into_vec(self) -> Vec<Arg> {
        self.args
    }
}
