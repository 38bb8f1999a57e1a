//! Scripted walkthrough of the demo API from the client side.

use crate::api::GreeterStub;
use crate::error::DemoError;

use common::ErrorLocation;

use std::panic::Location;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use log::info;
use serde::Serialize;
use serde_json::{Value, json};
use tango_core::Client;
use tokio::time::timeout;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// What the walkthrough observed.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoReport {
    pub sum: f64,
    pub greeting: String,
    pub processed: Vec<String>,
    pub first_callback: Vec<Value>,
    pub second_callback: Vec<Value>,
    pub events: Vec<Value>,
    pub remote_error: Option<String>,
}

/// Wait for the handshake, then exercise every demo procedure once.
///
/// # Errors
///
/// - [`DemoError::Rpc`] - no `serverReady` in time, or a call that should succeed failed
pub async fn run_demo(client: &Client) -> Result<DemoReport, DemoError> {
    timeout(CONNECT_TIMEOUT, client.wait_connected())
        .await
        .map_err(|_| DemoError::Rpc {
            message: format!("No serverReady within {CONNECT_TIMEOUT:?}"),
            location: ErrorLocation::from(Location::caller()),
        })??;
    info!("Client {} connected", client.sender_id());

    let stub = GreeterStub::new(client);
    let mut report = DemoReport {
        sum: stub.add(1.0, 2.0).await?,
        greeting: stub.greet("World").await?,
        ..DemoReport::default()
    };
    info!("add(1, 2) = {}", report.sum);
    info!("greet(\"World\") = {}", report.greeting);

    let processed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&processed);
    stub.process_items(&["apple", "banana", "cherry"], move |item| {
        sink.lock().unwrap_or_else(PoisonError::into_inner).push(item);
    })
    .await?;
    report.processed = take(&processed);
    info!("processItems -> {:?}", report.processed);

    let first = Arc::new(Mutex::new(Vec::new()));
    let second = Arc::new(Mutex::new(Vec::new()));
    let (first_sink, second_sink) = (Arc::clone(&first), Arc::clone(&second));
    stub.trigger_two_callbacks(
        json!("Hello"),
        json!("World"),
        move |value| first_sink.lock().unwrap_or_else(PoisonError::into_inner).push(value),
        move |value| second_sink.lock().unwrap_or_else(PoisonError::into_inner).push(value),
    )
    .await?;
    report.first_callback = take(&first);
    report.second_callback = take(&second);
    info!(
        "triggerTwoCallbacks -> {:?} / {:?}",
        report.first_callback, report.second_callback
    );

    let events = Arc::new(Mutex::new(Vec::new()));
    let events_sink = Arc::clone(&events);
    stub.subscribe_to_events(move |event| {
        info!("Event received: {}", event);
        events_sink.lock().unwrap_or_else(PoisonError::into_inner).push(event);
    })
    .await?;
    stub.trigger_event("Test event 1").await?;
    stub.trigger_event("Test event 2").await?;
    report.events = take(&events);

    report.remote_error = match stub.error_prone().await {
        Ok(()) => None,
        Err(e) => e.remote_message().map(str::to_string),
    };
    info!("errorProne rejected with {:?}", report.remote_error);

    Ok(report)
}

fn take<T>(shared: &Mutex<Vec<T>>) -> Vec<T> {
    std::mem::take(&mut *shared.lock().unwrap_or_else(PoisonError::into_inner))
}
