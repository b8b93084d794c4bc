//! Incident Atlas API web application

use crate::aggregate::spatial::{self, SpatialQuery};
use crate::aggregate::timeline::{self, DateWindow};
use crate::app_state::{AppState, SharedAppState};
use crate::cli::CommandLineArgs;
use crate::dataset::Dataset;
use crate::error::AtlasError;
use crate::metrics::{
    self, metrics_handler, record_groups, record_response_metrics, request_counter,
};
use crate::models;
use crate::validated_json::ValidatedJson;

use axum::{
    extract::State,
    routing::{get, get_service, post},
    Json, Router,
};
use std::path::Path;
use std::sync::Arc;
use tower::Layer;
use tower::ServiceBuilder;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;
use tracing::{event, Level};

/// Load and clean the incident dataset named on the command line.
///
/// The dataset row gauges are set from the load statistics.
///
/// # Arguments
///
/// * `args`: Command line arguments
pub fn load_dataset(args: &CommandLineArgs) -> Result<Dataset, AtlasError> {
    let (dataset, stats) = Dataset::load(&args.data_file, args.data_encoding)?;
    event!(
        Level::INFO,
        "Loaded {} incidents from {} ({} rows read, {} dropped, {} undated)",
        dataset.len(),
        args.data_file,
        stats.rows_read,
        stats.rows_dropped,
        stats.rows_undated
    );
    event!(Level::DEBUG, "Dataset columns: {:?}", dataset.columns());
    metrics::record_load_stats(&stats, dataset.len())?;
    Ok(dataset)
}

/// Returns a [axum::Router] for the Incident Atlas API
///
/// The router is populated with all routes as well as the following middleware:
///
/// * a [tower_http::trace::TraceLayer] for tracing requests and responses
///
/// # Arguments
///
/// * `state`: Shared application state
pub fn router(state: SharedAppState) -> Router {
    let index = Path::new(&state.args.static_dir).join("index.html");

    Router::new()
        .route("/", get_service(ServeFile::new(index)))
        .route("/data", post(data))
        .route("/timeline_data", post(timeline_data))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new().layer(
                TraceLayer::new_for_http()
                    .on_request(request_counter)
                    .on_response(record_response_metrics),
            ),
        )
}

/// Incident Atlas Service type alias
///
/// This type implements [tower::Service].
pub type Service = NormalizePath<Router>;

/// Returns a [crate::app::Service] for the Incident Atlas API
///
/// The service is populated with all routes as well as the following middleware:
///
/// * a [tower_http::trace::TraceLayer] for tracing requests and responses
/// * a [tower_http::normalize_path::NormalizePath] for trimming trailing slashes from requests
///
/// # Arguments
///
/// * `args`: Command line arguments
/// * `dataset`: Cleaned incident dataset
pub fn service(args: &CommandLineArgs, dataset: Dataset) -> Service {
    let state = Arc::new(AppState::new(args, dataset));
    let router = router(state);
    let normalize_path_layer = NormalizePathLayer::trim_trailing_slash();
    normalize_path_layer.layer(router)
}

/// Run an aggregation over the shared state.
///
/// The aggregation runs on the Rayon thread pool if enabled, otherwise inline.
///
/// # Arguments
///
/// * `state`: Shared application state
/// * `aggregation`: Function computing the aggregation
async fn run_aggregation<F, T>(state: &SharedAppState, aggregation: F) -> T
where
    F: FnOnce(&AppState) -> T + Send + 'static,
    T: Send + 'static,
{
    if state.args.use_rayon {
        let state = state.clone();
        tokio_rayon::spawn(move || aggregation(&state)).await
    } else {
        aggregation(state)
    }
}

/// Handler for the map endpoint
///
/// Groups incidents inside the requested bounds at a granularity chosen by the zoom level.
///
/// # Arguments
///
/// * `state`: Shared application state
/// * `request_data`: Map request data
#[tracing::instrument(level = "DEBUG", skip(state))]
async fn data(
    State(state): State<SharedAppState>,
    ValidatedJson(request_data): ValidatedJson<models::DataRequest>,
) -> Result<Json<models::PointsResponse>, AtlasError> {
    let query = SpatialQuery::try_from(&request_data)?;
    let _task_permit = state.resource_manager.task().await?;
    let points = run_aggregation(&state, move |state| {
        spatial::aggregate(&state.dataset, &query, state.thresholds)
    })
    .await;
    record_groups("data", points.len());
    Ok(Json(models::PointsResponse::encode(&points)?))
}

/// Handler for the timeline endpoint
///
/// Counts incidents per calendar month, optionally within a date range.
///
/// # Arguments
///
/// * `state`: Shared application state
/// * `request_data`: Timeline request data
#[tracing::instrument(level = "DEBUG", skip(state))]
async fn timeline_data(
    State(state): State<SharedAppState>,
    ValidatedJson(request_data): ValidatedJson<models::TimelineRequest>,
) -> Result<Json<models::TimelineResponse>, AtlasError> {
    let window = DateWindow::from_request(&request_data)?;
    let _task_permit = state.resource_manager.task().await?;
    let timeline = run_aggregation(&state, move |state| {
        timeline::aggregate(&state.dataset, window.as_ref())
    })
    .await;
    record_groups("timeline_data", timeline.len());
    Ok(Json(models::TimelineResponse { timeline }))
}
