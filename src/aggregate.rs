//! Aggregations over the incident dataset.
//!
//! * [spatial] groups incidents inside a bounding box by location, at a granularity chosen from
//!   the map zoom level.
//! * [timeline] groups incidents inside a date window by calendar month.

pub mod reduce;
pub mod spatial;
pub mod timeline;

use chrono::NaiveDate;

/// Format a date as an ISO-8601 timestamp at midnight, with millisecond precision.
pub fn iso_timestamp(date: NaiveDate) -> String {
    date.format("%Y-%m-%dT00:00:00.000").to_string()
}

/// Format a date as a calendar date.
pub fn calendar_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format a date as an HTTP date at midnight GMT.
pub fn http_date(date: NaiveDate) -> String {
    date.format("%a, %d %b %Y 00:00:00 GMT").to_string()
}
