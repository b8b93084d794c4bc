//! This file defines the incident-atlas binary entry point.

use incident_atlas::app;
use incident_atlas::cli;
use incident_atlas::error::AtlasError;
use incident_atlas::metrics;
use incident_atlas::server;
use incident_atlas::tracing;

use ::tracing::{event, Level};
use std::error::Error;
use std::process::exit;

/// Log an error and its causes, flush traces and exit with status 1.
fn fail(context: &str, err: AtlasError) -> ! {
    event!(Level::ERROR, "{}: {}", context, err);
    let mut current = err.source();
    while let Some(source) = current {
        event!(Level::ERROR, "Caused by: {}", source);
        current = source.source();
    }
    tracing::shutdown_tracing();
    exit(1)
}

/// Application entry point
#[tokio::main]
async fn main() {
    let args = cli::parse();
    tracing::init_tracing(&args);
    event!(Level::DEBUG, "{:?}", args);
    metrics::register_metrics();
    let dataset = app::load_dataset(&args).unwrap_or_else(|err| fail("Failed to load dataset", err));
    let service = app::service(&args, dataset);
    if let Err(err) = server::serve(&args, service).await {
        fail("Failed to serve", err);
    }
    tracing::shutdown_tracing();
}
