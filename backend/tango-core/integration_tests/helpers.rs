//! Test helpers for tango-core integration tests.
//!
//! - `TestApi`: a procedure table covering values, callbacks, subscriptions,
//!   failures, panics and delays
//! - endpoint setup over an in-memory broadcast bus (every send echoes back to
//!   the sender, so self-echo suppression is always exercised)
//! - wire recorders and callback collectors

use tango_core::{
    CallArg, CallArgs, Channel, Client, EndpointOptions, MemoryChannel, ProcedureError,
    ProcedureTable, RemoteCallback, SequentialIds, Server,
};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::mpsc;

#[derive(Default)]
pub struct TestApi {
    event_listeners: Mutex<Vec<RemoteCallback>>,
}

pub fn test_api() -> ProcedureTable<TestApi> {
    ProcedureTable::new(TestApi::default())
        .procedure("add", |_, args: CallArgs| async move {
            let a: Value = args.value(0)?;
            let b: Value = args.value(1)?;
            match (a.as_i64(), b.as_i64(), a.as_f64(), b.as_f64()) {
                (Some(a), Some(b), _, _) => Ok(json!(a + b)),
                (_, _, Some(a), Some(b)) => Ok(json!(a + b)),
                _ => Err(ProcedureError::execution("add expects two numbers")),
            }
        })
        .procedure("greet", |_, args: CallArgs| async move {
            let name: String = args.value(0)?;
            Ok::<_, ProcedureError>(format!("Hello, {name}!"))
        })
        .procedure("processItems", |_, args: CallArgs| async move {
            let items: Vec<String> = args.value(0)?;
            let callback = args.callback(1)?;
            for item in items {
                callback.call_with(&item.to_uppercase())?;
            }
            Ok::<_, ProcedureError>(())
        })
        .procedure("triggerTwoCallbacks", |_, args: CallArgs| async move {
            let echo1: String = args.value(0)?;
            let echo2: String = args.value(1)?;
            args.callback(2)?.call_with(&echo1)?;
            args.callback(3)?.call_with(&echo2)?;
            Ok::<_, ProcedureError>(())
        })
        .procedure("subscribeToEvents", |api: Arc<TestApi>, args: CallArgs| async move {
            let callback = args.callback(0)?;
            api.event_listeners.lock().expect("lock").push(callback);
            Ok::<_, ProcedureError>(())
        })
        .procedure("triggerEvent", |api: Arc<TestApi>, args: CallArgs| async move {
            let event: String = args.value(0)?;
            let listeners = api.event_listeners.lock().expect("lock").clone();
            for listener in listeners {
                listener.call_with(&event)?;
            }
            Ok::<_, ProcedureError>(())
        })
        .procedure("errorProne", |_, _args: CallArgs| async move {
            Err::<(), _>("Something went wrong!")
        })
        .procedure("panicky", |_, _args: CallArgs| async move {
            if true {
                panic!("kaboom");
            }
            Ok::<(), ProcedureError>(())
        })
        .procedure("delayedEcho", |_, args: CallArgs| async move {
            let value: Value = args.value(0)?;
            let delay_ms: u64 = args.value(1)?;
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            Ok::<_, ProcedureError>(value)
        })
        .procedure("callLater", |_, args: CallArgs| async move {
            let callback = args.callback(0)?;
            let delay_ms: u64 = args.value(1)?;
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                let _ = callback.call_with("late");
            });
            Ok::<_, ProcedureError>("scheduled")
        })
}

pub fn sequential() -> EndpointOptions {
    EndpointOptions::default().with_ids(Arc::new(SequentialIds::new()))
}

/// Server then client on one broadcast bus, both with sequential ids.
pub fn setup() -> (Arc<MemoryChannel>, Server, Client) {
    let channel = Arc::new(MemoryChannel::broadcast());
    let server = Server::with_options(Arc::clone(&channel), test_api(), sequential())
        .expect("server inside runtime");
    let client = Client::with_options(Arc::clone(&channel), sequential());
    (channel, server, client)
}

/// Capture every message crossing the channel.
pub fn record(channel: &MemoryChannel) -> Arc<Mutex<Vec<Value>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    channel.add_message_listener(Arc::new(move |message: String| {
        let value = serde_json::from_str(&message).unwrap_or(Value::String(message));
        sink.lock().expect("lock").push(value);
    }));
    seen
}

pub fn message_types(seen: &Arc<Mutex<Vec<Value>>>) -> Vec<String> {
    seen.lock()
        .expect("lock")
        .iter()
        .filter_map(|value| value["messageType"].as_str().map(str::to_string))
        .collect()
}

/// A callback argument that appends its first argument to a shared list.
pub fn collector() -> (Arc<Mutex<Vec<Value>>>, CallArg) {
    let collected = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&collected);
    let callback = CallArg::callback(move |args: Vec<Value>| {
        sink.lock()
            .expect("lock")
            .push(args.into_iter().next().unwrap_or(Value::Null));
    });
    (collected, callback)
}

/// A callback argument that forwards its first argument into a channel.
pub fn forwarder() -> (mpsc::UnboundedReceiver<Value>, CallArg) {
    let (tx, rx) = mpsc::unbounded_channel();
    let callback = CallArg::callback(move |args: Vec<Value>| {
        let _ = tx.send(args.into_iter().next().unwrap_or(Value::Null));
    });
    (rx, callback)
}
