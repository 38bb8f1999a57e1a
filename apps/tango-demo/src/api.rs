//! The demo API: a server-side procedure table and a typed client stub for it.

use std::sync::{Mutex, PoisonError};

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tango_core::{
    CallArg, CallArgs, CallError, Client, ProcedureError, ProcedureTable, RemoteCallback, args,
};

/// Server-side state shared by every procedure of one connection.
#[derive(Default)]
pub struct DemoApi {
    event_listeners: Mutex<Vec<RemoteCallback>>,
}

impl DemoApi {
    pub fn subscriber_count(&self) -> usize {
        self.listeners().len()
    }

    fn listeners(&self) -> std::sync::MutexGuard<'_, Vec<RemoteCallback>> {
        self.event_listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn demo_api() -> ProcedureTable<DemoApi> {
    ProcedureTable::new(DemoApi::default())
        .procedure("add", |_, args: CallArgs| async move {
            let a: Value = args.value(0)?;
            let b: Value = args.value(1)?;
            add(&a, &b)
        })
        .procedure("greet", |_, args: CallArgs| async move {
            let name: String = args.value(0)?;
            Ok::<_, ProcedureError>(format!("Hello, {name}!"))
        })
        .procedure("processItems", |_, args: CallArgs| async move {
            let items: Vec<String> = args.value(0)?;
            let callback = args.callback(1)?;
            debug!("Processing {} item(s)", items.len());
            for item in items {
                callback.call_with(&item.to_uppercase())?;
            }
            Ok::<_, ProcedureError>(())
        })
        .procedure("triggerTwoCallbacks", |_, args: CallArgs| async move {
            let echo1: Value = args.value(0)?;
            let echo2: Value = args.value(1)?;
            args.callback(2)?.call(vec![echo1])?;
            args.callback(3)?.call(vec![echo2])?;
            Ok::<_, ProcedureError>(())
        })
        .procedure("subscribeToEvents", |api, args: CallArgs| async move {
            let callback = args.callback(0)?;
            info!("New event subscriber {}", callback.callback_id());
            api.listeners().push(callback);
            Ok::<_, ProcedureError>(())
        })
        .procedure("triggerEvent", |api, args: CallArgs| async move {
            let event: Value = args.value(0)?;
            // Snapshot so a listener sending synchronously never runs under the lock
            let listeners = api.listeners().clone();
            for listener in listeners {
                listener.call(vec![event.clone()])?;
            }
            Ok::<_, ProcedureError>(())
        })
        .procedure("errorProne", |_, _args: CallArgs| async move {
            Err::<(), _>("Something went wrong!")
        })
}

/// Integers stay integers unless the sum overflows `i64`; anything else numeric adds as `f64`.
fn add(a: &Value, b: &Value) -> Result<Value, ProcedureError> {
    let integer_sum = match (a.as_i64(), b.as_i64()) {
        (Some(a), Some(b)) => a.checked_add(b),
        _ => None,
    };
    if let Some(sum) = integer_sum {
        return Ok(Value::from(sum));
    }

    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => Ok(Value::from(a + b)),
        _ => Err(ProcedureError::invalid_argument(
            0,
            format!("add expects two numbers, got {a} and {b}"),
        )),
    }
}

/// Typed wrapper over a [`Client`] talking to [`demo_api`].
pub struct GreeterStub<'a> {
    client: &'a Client,
}

impl<'a> GreeterStub<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn add(&self, a: f64, b: f64) -> Result<f64, CallError> {
        self.client.call_as("add", args![a, b]).await
    }

    pub async fn greet(&self, name: &str) -> Result<String, CallError> {
        self.client.call_as("greet", args![name]).await
    }

    pub async fn process_items<F>(&self, items: &[&str], on_item: F) -> Result<(), CallError>
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        let callback = CallArg::callback(move |args: Vec<Value>| {
            if let Some(item) = first_as::<String>(args) {
                on_item(item);
            }
        });
        self.client
            .call("processItems", vec![CallArg::json(items)?, callback])
            .await
            .map(drop)
    }

    pub async fn trigger_two_callbacks<F1, F2>(
        &self,
        echo1: Value,
        echo2: Value,
        callback1: F1,
        callback2: F2,
    ) -> Result<(), CallError>
    where
        F1: Fn(Value) + Send + Sync + 'static,
        F2: Fn(Value) + Send + Sync + 'static,
    {
        let args = vec![
            CallArg::Value(echo1),
            CallArg::Value(echo2),
            CallArg::callback(move |args: Vec<Value>| {
                callback1(args.into_iter().next().unwrap_or(Value::Null));
            }),
            CallArg::callback(move |args: Vec<Value>| {
                callback2(args.into_iter().next().unwrap_or(Value::Null));
            }),
        ];
        self.client
            .call("triggerTwoCallbacks", args)
            .await
            .map(drop)
    }

    pub async fn subscribe_to_events<F>(&self, on_event: F) -> Result<(), CallError>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        let callback = CallArg::callback(move |args: Vec<Value>| {
            on_event(args.into_iter().next().unwrap_or(Value::Null));
        });
        self.client.call("subscribeToEvents", vec![callback]).await.map(drop)
    }

    pub async fn trigger_event(&self, event: &str) -> Result<(), CallError> {
        self.client.call("triggerEvent", args![event]).await.map(drop)
    }

    pub async fn error_prone(&self) -> Result<(), CallError> {
        self.client.call("errorProne", args![]).await.map(drop)
    }
}

fn first_as<T: DeserializeOwned>(args: Vec<Value>) -> Option<T> {
    let first = args.into_iter().next()?;
    match serde_json::from_value(first) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Dropping callback argument of unexpected shape: {}", e);
            None
        }
    }
}
