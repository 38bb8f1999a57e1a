//! Wire envelopes.
//!
//! Every message on the channel is one JSON object:
//!
//! ```json
//! {"id":"lk2f8x1c-9a0bqz","senderId":"client-lk2f8x0z-1x2y3z","messageType":"invoke",
//!  "procedure":"greet","args":["World"]}
//! ```
//!
//! `messageType` is one of `invoke`, `result`, `error`, `callback`,
//! `clientReady`, `serverReady`. The `...Message` spellings used by older
//! peers (`invokeMessage`, `resultMessage`, ...) are accepted on decode.

use crate::error::ProtocolError;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Id carried by `callback` envelopes, which answer no pending call.
pub const CALLBACK_ENVELOPE_ID: &str = "noop";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub id: String,
    pub sender_id: String,
    #[serde(flatten)]
    pub body: Body,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "messageType", rename_all = "camelCase")]
pub enum Body {
    #[serde(alias = "invokeMessage")]
    Invoke {
        procedure: String,
        #[serde(default)]
        args: Vec<EncodedArg>,
    },

    /// A procedure without a return value produces no `result` field on
    /// some peers; that decodes as `null`.
    #[serde(alias = "resultMessage")]
    Result {
        #[serde(default)]
        result: Value,
    },

    #[serde(alias = "errorMessage")]
    Error { error: String },

    #[serde(alias = "callbackMessage", rename_all = "camelCase")]
    Callback {
        callback_id: String,
        #[serde(default)]
        args: Vec<Value>,
    },

    #[serde(alias = "clientReadyMessage")]
    ClientReady,

    #[serde(alias = "serverReadyMessage")]
    ServerReady,
}

impl Body {
    pub fn kind(&self) -> &'static str {
        match self {
            Body::Invoke { .. } => "invoke",
            Body::Result { .. } => "result",
            Body::Error { .. } => "error",
            Body::Callback { .. } => "callback",
            Body::ClientReady => "clientReady",
            Body::ServerReady => "serverReady",
        }
    }
}

/// One positional argument of an `invoke` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EncodedArg {
    Callback(CallbackPlaceholder),
    Value(Value),
}

/// `{"type":"callback","callbackId":"..."}` standing in for a function argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackPlaceholder {
    #[serde(rename = "type")]
    kind: PlaceholderKind,
    pub callback_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PlaceholderKind {
    Callback,
}

impl CallbackPlaceholder {
    pub fn new(callback_id: impl Into<String>) -> Self {
        Self {
            kind: PlaceholderKind::Callback,
            callback_id: callback_id.into(),
        }
    }
}

impl Envelope {
    pub fn new(id: impl Into<String>, sender_id: impl Into<String>, body: Body) -> Self {
        Self {
            id: id.into(),
            sender_id: sender_id.into(),
            body,
        }
    }

    /// Parse one inbound channel message.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Decode`] for anything that is not a complete
    /// envelope: invalid JSON, a missing `id`/`senderId`, an unknown
    /// `messageType`, or variant fields of the wrong shape.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|error| ProtocolError::decode(error))
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|error| ProtocolError::encode(error))
    }
}
