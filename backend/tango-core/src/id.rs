//! Correlation and identity tokens.
//!
//! Endpoints never generate ids themselves; they pull from an injected
//! [`IdSource`]. Production uses [`TimestampIds`] (short, time-sortable,
//! practically unique across processes); tests use [`SequentialIds`] so
//! envelopes on the wire are predictable.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RANDOM_SUFFIX_LEN: usize = 6;

/// Produces tokens unique within one connection epoch.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> String;
}

/// `<ms since epoch in base36>-<6 random base36 chars>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimestampIds;

impl IdSource for TimestampIds {
    fn next_id(&self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();

        format!("{}-{}", to_base36(millis), random_suffix())
    }
}

/// Monotonic counter: `"0"`, `"1"`, ... optionally prefixed.
#[derive(Debug, Default)]
pub struct SequentialIds {
    prefix: Option<String>,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            next: AtomicU64::new(0),
        }
    }
}

impl IdSource for SequentialIds {
    fn next_id(&self) -> String {
        let value = self.next.fetch_add(1, Ordering::Relaxed);
        match &self.prefix {
            Some(prefix) => format!("{prefix}{value}"),
            None => value.to_string(),
        }
    }
}

/// Id source selection as it appears in configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum IdStrategy {
    #[default]
    Timestamp,
    Sequential,
}

impl IdStrategy {
    pub fn build(self) -> std::sync::Arc<dyn IdSource> {
        match self {
            IdStrategy::Timestamp => std::sync::Arc::new(TimestampIds),
            IdStrategy::Sequential => std::sync::Arc::new(SequentialIds::new()),
        }
    }
}

/// Which side of the channel an endpoint plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Server,
    Client,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Server => write!(f, "server"),
            Role::Client => write!(f, "client"),
        }
    }
}

/// Per-instance `senderId`, e.g. `server-lk2f8x1c-9a0bqz`.
pub fn endpoint_identity(role: Role, ids: &dyn IdSource) -> String {
    format!("{role}-{}", ids.next_id())
}

pub(crate) fn to_base36(mut value: u128) -> String {
    if value == 0 {
        return String::from("0");
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();

    String::from_utf8_lossy(&digits).into_owned()
}

fn random_suffix() -> String {
    let bytes = Uuid::new_v4().into_bytes();
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&bytes[..8]);

    let space = 36u64.pow(RANDOM_SUFFIX_LEN as u32);
    let encoded = to_base36(u128::from(u64::from_le_bytes(seed) % space));

    format!("{encoded:0>width$}", width = RANDOM_SUFFIX_LEN)
}
