//! Client-side correlation tables.
//!
//! Two maps with different lifetimes:
//!
//! - [`PendingCalls`]: one entry per outstanding call, inserted before the
//!   `invoke` is sent and removed exactly once when its `result` or `error`
//!   arrives.
//! - [`CallbackRegistry`]: one entry per function argument ever passed.
//!   Entries are *not* removed when the originating call settles, because
//!   the server may keep calling back (subscriptions). They live until
//!   released explicitly or the client is cleaned up.

use crate::error::CallError;
use crate::marshal::LocalCallback;

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::oneshot;

pub(crate) type Settlement = oneshot::Sender<Result<Value, CallError>>;

#[derive(Default)]
pub(crate) struct PendingCalls {
    entries: HashMap<String, Settlement>,
}

impl PendingCalls {
    /// Returns `false`, leaving the table unchanged, if `id` is already pending.
    pub(crate) fn register(&mut self, id: String, settlement: Settlement) -> bool {
        if self.entries.contains_key(&id) {
            return false;
        }
        self.entries.insert(id, settlement);
        true
    }

    pub(crate) fn take(&mut self, id: &str) -> Option<Settlement> {
        self.entries.remove(id)
    }

    pub(crate) fn drain(&mut self) -> Vec<Settlement> {
        self.entries.drain().map(|(_, settlement)| settlement).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Default)]
pub(crate) struct CallbackRegistry {
    entries: HashMap<String, LocalCallback>,
}

impl CallbackRegistry {
    pub(crate) fn register(&mut self, id: String, callback: LocalCallback) {
        self.entries.insert(id, callback);
    }

    /// Look up without removing; the callback stays registered.
    pub(crate) fn get(&self, id: &str) -> Option<LocalCallback> {
        self.entries.get(id).cloned()
    }

    pub(crate) fn release(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Default)]
pub(crate) struct CorrelationTables {
    pub(crate) pending: PendingCalls,
    pub(crate) callbacks: CallbackRegistry,
}
