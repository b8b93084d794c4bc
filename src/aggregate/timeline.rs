//! Monthly timeline of incidents.

use crate::aggregate::http_date;
use crate::aggregate::reduce::{Extent, Reduction};
use crate::dataset::Dataset;
use crate::error::AtlasError;
use crate::models::{TimelineBucket, TimelineRequest};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeMap;
use tracing::{event, Level};

/// Naive date-time formats accepted in a date range, tried after plain dates and RFC 3339.
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a date range boundary.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 date-times (converted to UTC) and naive date-times.
pub fn parse_boundary(value: &str) -> Result<NaiveDateTime, AtlasError> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::default()));
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| AtlasError::InvalidDate {
            value: value.to_owned(),
        })
}

/// An inclusive window of time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DateWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateWindow {
    /// Parse a window from its boundaries.
    pub fn parse(start: &str, end: &str) -> Result<Self, AtlasError> {
        Ok(Self {
            start: parse_boundary(start)?,
            end: parse_boundary(end)?,
        })
    }

    /// Returns the window requested by a timeline request, if any.
    pub fn from_request(request_data: &TimelineRequest) -> Result<Option<Self>, AtlasError> {
        request_data
            .date_range()?
            .map(|(start, end)| Self::parse(start, end))
            .transpose()
    }

    /// Returns whether midnight on `date` lies within the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        let instant = date.and_time(NaiveTime::default());
        self.start <= instant && instant <= self.end
    }
}

/// Count incidents per calendar month.
///
/// Incidents without a date are never counted. Buckets are returned in ascending
/// (year, month) order.
///
/// # Arguments
///
/// * `dataset`: The incident dataset
/// * `window`: Optional window restricting the incidents counted
#[tracing::instrument(level = "DEBUG", skip(dataset))]
pub fn aggregate(dataset: &Dataset, window: Option<&DateWindow>) -> Vec<TimelineBucket> {
    let mut months: BTreeMap<(i32, u32), (usize, Extent<NaiveDate>)> = BTreeMap::new();
    for date in dataset
        .incidents()
        .iter()
        .filter_map(|incident| incident.date)
        .filter(|date| window.map_or(true, |window| window.contains(*date)))
    {
        let (count, extent) = months.entry((date.year(), date.month())).or_default();
        *count += 1;
        extent.push(Some(date));
    }
    event!(Level::DEBUG, "Timeline spans {} months", months.len());
    months
        .into_iter()
        .filter_map(|((year, month), (count, extent))| {
            let (min, max) = extent.finish()?;
            Some(TimelineBucket {
                year,
                month,
                event_count: count,
                date_min: http_date(min),
                date_max: http_date(max),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{get_test_dataset, get_test_timeline_request};

    fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn parse_plain_date() {
        assert_eq!(
            datetime(2015, 1, 1, 0, 0, 0),
            parse_boundary("2015-01-01").unwrap()
        );
    }

    #[test]
    fn parse_rfc3339() {
        assert_eq!(
            datetime(2015, 12, 31, 23, 0, 0),
            parse_boundary("2016-01-01T00:00:00+01:00").unwrap()
        );
        assert_eq!(
            datetime(2015, 12, 31, 12, 30, 0),
            parse_boundary("2015-12-31T12:30:00.000Z").unwrap()
        );
    }

    #[test]
    fn parse_naive_datetime() {
        assert_eq!(
            datetime(2015, 12, 31, 12, 30, 0),
            parse_boundary("2015-12-31 12:30:00").unwrap()
        );
    }

    #[test]
    fn parse_invalid() {
        let err = parse_boundary("last tuesday").unwrap_err();
        assert_eq!("invalid date \"last tuesday\"", err.to_string());
    }

    #[test]
    fn window_inclusive() {
        let window = DateWindow::parse("2015-03-01", "2015-03-31").unwrap();
        assert!(window.contains(NaiveDate::from_ymd_opt(2015, 3, 1).unwrap()));
        assert!(window.contains(NaiveDate::from_ymd_opt(2015, 3, 31).unwrap()));
        assert!(!window.contains(NaiveDate::from_ymd_opt(2015, 4, 1).unwrap()));
        assert!(!window.contains(NaiveDate::from_ymd_opt(2015, 2, 28).unwrap()));
    }

    #[test]
    fn window_from_request() {
        let request_data = get_test_timeline_request("2015-01-01", "2015-12-31");
        let window = DateWindow::from_request(&request_data).unwrap().unwrap();
        assert_eq!(datetime(2015, 1, 1, 0, 0, 0), window.start);
        assert_eq!(datetime(2015, 12, 31, 0, 0, 0), window.end);
        assert_eq!(
            None,
            DateWindow::from_request(&TimelineRequest::default()).unwrap()
        );
    }

    #[test]
    fn full_timeline_sorted() {
        let dataset = get_test_dataset();
        let timeline = aggregate(&dataset, None);
        let keys: Vec<_> = timeline.iter().map(|b| (b.year, b.month)).collect();
        assert_eq!(vec![(2015, 3), (2015, 6), (2016, 7)], keys);
        let counts: Vec<_> = timeline.iter().map(|b| b.event_count).collect();
        assert_eq!(vec![2, 2, 3], counts);
        let dated = dataset
            .incidents()
            .iter()
            .filter(|incident| incident.date.is_some())
            .count();
        assert_eq!(dated, counts.iter().sum::<usize>());
    }

    #[test]
    fn bucket_extent() {
        let dataset = get_test_dataset();
        let timeline = aggregate(&dataset, None);
        let july = &timeline[2];
        assert_eq!("Fri, 01 Jul 2016 00:00:00 GMT", july.date_min);
        assert_eq!("Thu, 14 Jul 2016 00:00:00 GMT", july.date_max);
    }

    #[test]
    fn windowed_timeline() {
        let dataset = get_test_dataset();
        let window = DateWindow::parse("2015-03-20", "2015-06-01").unwrap();
        let timeline = aggregate(&dataset, Some(&window));
        assert_eq!(2, timeline.len());
        assert_eq!((2015, 3, 1), (timeline[0].year, timeline[0].month, timeline[0].event_count));
        assert_eq!((2015, 6, 1), (timeline[1].year, timeline[1].month, timeline[1].event_count));
        assert_eq!("Mon, 01 Jun 2015 00:00:00 GMT", timeline[1].date_min);
    }

    #[test]
    fn empty_window() {
        let dataset = get_test_dataset();
        let window = DateWindow::parse("1990-01-01", "1990-12-31").unwrap();
        assert!(aggregate(&dataset, Some(&window)).is_empty());
    }
}
