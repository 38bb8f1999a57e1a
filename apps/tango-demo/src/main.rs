use tango_demo::demo::run_demo;
use tango_demo::error::DemoError;
use tango_demo::host::start_rpc_host;
use tango_demo::logger::initialize as LoggerInitialize;

use common::ErrorLocation;

use std::env::current_dir;
use std::panic::Location;
use std::sync::Arc;

use log::{error, info};
use tango_core::{Client, RpcConfig, WebSocketChannel};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{e}");
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), DemoError> {
    let work_dir = current_dir().map_err(|e| DemoError::Demo {
        message: format!("Failed to get working directory: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Initialize logger FIRST
    LoggerInitialize(&work_dir)?;

    info!("Tango demo starting");
    info!("Working directory: {}", work_dir.display());

    let config = RpcConfig::load(&work_dir)?;
    let options = config.endpoint_options();

    let host = start_rpc_host(&config.transport.address(), options.clone()).await?;

    let channel = Arc::new(WebSocketChannel::connect(&host.url()).await?);
    let client = Client::with_options(channel, options);

    let report = run_demo(&client).await?;
    let summary = serde_json::to_string_pretty(&report).map_err(|e| DemoError::Demo {
        message: format!("Failed to render report: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;
    info!("Demo report:\n{summary}");

    info!("Serving on {}; press Ctrl-C to stop", host.url());
    tokio::signal::ctrl_c().await?;

    info!("Shutting down");
    client.cleanup();
    host.shutdown();
    Ok(())
}
