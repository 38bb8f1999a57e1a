//! Procedure dispatch tables.

use crate::error::ProcedureError;
use crate::marshal::CallArgs;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;

pub type ProcedureFuture = BoxFuture<'static, Result<Value, ProcedureError>>;

/// Name-keyed dispatch onto a procedure implementation.
///
/// Implement this directly with a `match` on `procedure` for a hand-written
/// stub, or use [`ProcedureTable`].
pub trait Procedures: Send + Sync {
    /// Start executing `procedure`, or return `None` if no such procedure exists.
    fn dispatch(&self, procedure: &str, args: CallArgs) -> Option<ProcedureFuture>;
}

type Handler<S> = Box<dyn Fn(Arc<S>, CallArgs) -> ProcedureFuture + Send + Sync>;

/// Table of async handlers sharing one state value.
///
/// The state is what procedures are "methods" of: every handler receives a
/// clone of the same `Arc<S>`.
///
/// ```no_run
/// use tango_core::{CallArgs, ProcedureError, ProcedureTable};
///
/// struct Calculator;
///
/// let table = ProcedureTable::new(Calculator).procedure(
///     "add",
///     |_calc, args: CallArgs| async move {
///         let a: f64 = args.value(0)?;
///         let b: f64 = args.value(1)?;
///         Ok::<_, ProcedureError>(a + b)
///     },
/// );
/// ```
pub struct ProcedureTable<S> {
    state: Arc<S>,
    handlers: HashMap<String, Handler<S>>,
}

impl<S: Send + Sync + 'static> ProcedureTable<S> {
    pub fn new(state: S) -> Self {
        Self::from_shared(Arc::new(state))
    }

    pub fn from_shared(state: Arc<S>) -> Self {
        Self {
            state,
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` under `name`, replacing any previous handler.
    pub fn procedure<F, Fut, T, E>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Arc<S>, CallArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Serialize,
        E: Into<ProcedureError>,
    {
        let handler: Handler<S> = Box::new(move |state, args| {
            let running = handler(state, args);
            Box::pin(async move {
                let output = running.await.map_err(Into::<ProcedureError>::into)?;
                serde_json::to_value(output).map_err(|e| {
                    ProcedureError::execution(format!("Failed to serialise result: {e}"))
                })
            })
        });

        self.handlers.insert(name.into(), handler);
        self
    }

    pub fn state(&self) -> &Arc<S> {
        &self.state
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl<S: Send + Sync + 'static> Procedures for ProcedureTable<S> {
    fn dispatch(&self, procedure: &str, args: CallArgs) -> Option<ProcedureFuture> {
        let handler = self.handlers.get(procedure)?;
        Some(handler(Arc::clone(&self.state), args))
    }
}
