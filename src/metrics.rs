use crate::dataset::LoadStats;
use crate::error::AtlasError;

use axum::{body::Body, http::Request, response::Response};
use lazy_static::lazy_static;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry,
};
use tracing::Span;

lazy_static! {
    // Registry for holding metric state
    pub static ref REGISTRY: Registry = Registry::new();
    // Simple request counter
    pub static ref INCOMING_REQUESTS: IntCounterVec = IntCounterVec::new(
        Opts::new("incoming_requests", "The number of HTTP requests received"),
        &["http_method"]
    ).expect("Prometheus metric options should be valid");
    // Request counter by status code
    pub static ref RESPONSE_CODE_COLLECTOR: IntCounterVec = IntCounterVec::new(
        Opts::new("outgoing_response", "The number of responses sent."),
        &["status_code"]
    ).expect("Prometheus metric options should be valid");
    // Request histogram by response time
    pub static ref RESPONSE_TIME_COLLECTOR: HistogramVec = HistogramVec::new(
        HistogramOpts{
            common_opts: Opts::new("response_time", "The time taken to respond to each request"),
            buckets: prometheus::DEFAULT_BUCKETS.to_vec(), // Change buckets here if desired
        },
        &[],
    ).expect("Prometheus metric options should be valid");
    // Dataset rows by state after cleaning
    pub static ref DATASET_ROWS: IntGaugeVec = IntGaugeVec::new(
        Opts::new("dataset_rows", "The number of dataset rows, by state after cleaning"),
        &["state"]
    ).expect("Prometheus metric options should be valid");
    // Number of groups returned per request
    pub static ref AGGREGATED_GROUPS: HistogramVec = HistogramVec::new(
        HistogramOpts{
            common_opts: Opts::new("aggregated_groups", "The number of groups returned by each aggregation"),
            buckets: prometheus::exponential_buckets(1.0, 4.0, 8)
                .expect("Prometheus bucket options should be valid"),
        },
        &["endpoint"]
    ).expect("Prometheus metric options should be valid");
}

/// Register metrics with the registry
pub fn register_metrics() {
    REGISTRY
        .register(Box::new(INCOMING_REQUESTS.clone()))
        .expect("Prometheus metrics registration should not fail during initialization");
    REGISTRY
        .register(Box::new(RESPONSE_CODE_COLLECTOR.clone()))
        .expect("Prometheus metrics registration should not fail during initialization");
    REGISTRY
        .register(Box::new(RESPONSE_TIME_COLLECTOR.clone()))
        .expect("Prometheus metrics registration should not fail during initialization");
    REGISTRY
        .register(Box::new(DATASET_ROWS.clone()))
        .expect("Prometheus metrics registration should not fail during initialization");
    REGISTRY
        .register(Box::new(AGGREGATED_GROUPS.clone()))
        .expect("Prometheus metrics registration should not fail during initialization");
}

/// Returns currently gathered prometheus metrics
pub async fn metrics_handler() -> String {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();

    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .expect("could not encode gathered metrics into temporary buffer");

    String::from_utf8(buffer).expect("could not convert metrics buffer into string")
}

/// Increments the prometheus counter on all incoming requests, labelled by http method
pub fn request_counter(request: &Request<Body>, _span: &Span) {
    INCOMING_REQUESTS
        .with_label_values(&[&request.method().to_string().to_ascii_uppercase()])
        .inc();
}

/// Increment the prometheus counter on all outgoing responses, labelled by status code
pub fn record_response_metrics<B>(
    response: &Response<B>,
    latency: std::time::Duration,
    _span: &Span,
) {
    RESPONSE_CODE_COLLECTOR
        .with_label_values(&[response.status().as_str()])
        .inc();

    RESPONSE_TIME_COLLECTOR
        .with_label_values(&[])
        .observe(latency.as_secs_f64());
}

/// Set the dataset row gauges from the statistics of a load
pub fn record_load_stats(stats: &LoadStats, kept: usize) -> Result<(), AtlasError> {
    DATASET_ROWS
        .with_label_values(&["read"])
        .set(i64::try_from(stats.rows_read)?);
    DATASET_ROWS
        .with_label_values(&["dropped"])
        .set(i64::try_from(stats.rows_dropped)?);
    DATASET_ROWS
        .with_label_values(&["undated"])
        .set(i64::try_from(stats.rows_undated)?);
    DATASET_ROWS
        .with_label_values(&["kept"])
        .set(i64::try_from(kept)?);
    Ok(())
}

/// Record the number of groups returned by an aggregation endpoint
pub fn record_groups(endpoint: &str, groups: usize) {
    AGGREGATED_GROUPS
        .with_label_values(&[endpoint])
        .observe(groups as f64);
}
