//! Request and response data types

use crate::error::AtlasError;
use crate::types::Reported;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Visible map area in degrees
///
/// All edges are required. They are optional here so that an absent edge is reported as a
/// missing field rather than a deserialisation failure.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize, Validate)]
pub struct Bounds {
    /// Northern latitude
    #[validate(required)]
    pub north: Option<f64>,
    /// Southern latitude
    #[validate(required)]
    pub south: Option<f64>,
    /// Eastern longitude
    #[validate(required)]
    pub east: Option<f64>,
    /// Western longitude
    #[validate(required)]
    pub west: Option<f64>,
}

/// Request data for the map endpoint
#[derive(Debug, Deserialize, PartialEq, Validate)]
pub struct DataRequest {
    /// Visible map area
    #[validate(required_nested)]
    pub bounds: Option<Bounds>,
    /// Map zoom level. Fractional zoom levels are accepted.
    #[validate(required)]
    pub zoom: Option<f64>,
}

/// Request data for the timeline endpoint
#[derive(Debug, Default, Deserialize, PartialEq, Validate)]
pub struct TimelineRequest {
    /// Optional filters
    #[validate]
    pub filters: Option<TimelineFilters>,
}

/// Filters applied to the timeline
#[derive(Debug, Default, Deserialize, PartialEq, Validate)]
pub struct TimelineFilters {
    /// Inclusive `[start, end]` dates. An empty range applies no filter.
    #[validate(custom = "validate_date_range")]
    pub date_range: Option<Vec<String>>,
}

impl TimelineRequest {
    /// Returns the requested `(start, end)` dates, if any.
    pub fn date_range(&self) -> Result<Option<(&str, &str)>, AtlasError> {
        let Some(range) = self
            .filters
            .as_ref()
            .and_then(|filters| filters.date_range.as_ref())
        else {
            return Ok(None);
        };
        match range.as_slice() {
            [] => Ok(None),
            [start, end] => Ok(Some((start, end))),
            _ => Err(AtlasError::DateRangeLength { len: range.len() }),
        }
    }
}

/// Validate a date range
fn validate_date_range(range: &[String]) -> Result<(), ValidationError> {
    if !range.is_empty() && range.len() != 2 {
        let mut error = ValidationError::new("date_range must contain a start and an end date");
        error.add_param("length".into(), &range.len());
        return Err(error);
    }
    Ok(())
}

/// A group of incidents on the map.
///
/// Field names are those used by existing clients.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClusterPoint {
    #[serde(rename = "region_txt_")]
    pub region: String,
    #[serde(rename = "country_txt_", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(rename = "city_", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub latitude_mean: Reported<f64>,
    pub longitude_mean: Reported<f64>,
    pub nkill_sum: f64,
    pub nwound_sum: f64,
    pub nperps_mean: Reported<f64>,
    pub nperps_sum: f64,
    /// Number of distinct events in the group
    pub event_count: usize,
    /// Earliest event date, as an ISO-8601 timestamp
    pub date_min: Reported<String>,
    /// Latest event date, as an ISO-8601 timestamp
    pub date_max: Reported<String>,
    /// `"<min date> to <max date>"`
    pub date_range: String,
}

/// Response from the map endpoint
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct PointsResponse {
    /// JSON-encoded array of [ClusterPoint]s
    pub points: String,
}

impl PointsResponse {
    /// Return a PointsResponse holding the JSON encoding of `points`.
    pub fn encode(points: &[ClusterPoint]) -> Result<Self, AtlasError> {
        Ok(Self {
            points: serde_json::to_string(points)?,
        })
    }
}

/// Incidents in one calendar month.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TimelineBucket {
    pub year: i32,
    pub month: u32,
    /// Number of incidents in the month
    pub event_count: usize,
    /// Earliest event date, as an HTTP date
    pub date_min: String,
    /// Latest event date, as an HTTP date
    pub date_max: String,
}

/// Response from the timeline endpoint
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct TimelineResponse {
    pub timeline: Vec<TimelineBucket>,
}
