//! This crate provides a map and timeline server for terrorism incident data. It loads a table
//! of incidents once at startup, cleans it, and answers two kinds of aggregation query.
//!
//! * The map endpoint groups the incidents inside a bounding box by region, country or city,
//!   depending on the zoom level, and reports totals, means and date extents per group.
//! * The timeline endpoint counts incidents per calendar month, optionally within a date range.
//!
//! The server is built on top of a number of open source components.
//!
//! * [Tokio](tokio), the most popular asynchronous Rust runtime.
//! * [Axum](axum) web framework, built by the Tokio team, on top of the [hyper] HTTP library.
//! * [Serde](serde) performs (de)serialisation of JSON request and response data.
//! * [csv] reads the incident table and [chrono] handles its dates.
//! * [Rayon](rayon) optionally runs aggregations on a dedicated thread pool.

pub mod aggregate;
pub mod app;
pub mod app_state;
pub mod cli;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod models;
pub mod resource_manager;
pub mod server;
#[cfg(test)]
pub mod test_utils;
pub mod tracing;
pub mod types;
pub mod validated_json;
