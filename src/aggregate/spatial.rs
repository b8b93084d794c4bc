//! Spatial aggregation of incidents for the map.
//!
//! Incidents inside the visible bounding box are grouped by location. The grouping key depends
//! on the zoom level: the further the client zooms in, the finer the key, from region through
//! country to city. Each group is reduced to a single [ClusterPoint].

use crate::aggregate::reduce::{CountDistinct, Extent, Mean, Reduction, Sum};
use crate::aggregate::{calendar_date, iso_timestamp};
use crate::dataset::{Dataset, Incident};
use crate::error::AtlasError;
use crate::models::{self, ClusterPoint};
use crate::types::missing;
use crate::types::reported::{self, Reported};

use chrono::NaiveDate;
use std::collections::BTreeMap;
use strum_macros::Display;
use tracing::{event, Level};

/// A rectangle in latitude/longitude space, edges inclusive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Returns whether a point lies within the box.
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        self.south <= latitude
            && latitude <= self.north
            && self.west <= longitude
            && longitude <= self.east
    }
}

impl TryFrom<&models::Bounds> for BoundingBox {
    type Error = AtlasError;

    fn try_from(bounds: &models::Bounds) -> Result<Self, Self::Error> {
        let edge = |value: Option<f64>, name: &str| {
            value.ok_or_else(|| AtlasError::MissingField {
                field: format!("bounds.{name}"),
            })
        };
        Ok(Self {
            north: edge(bounds.north, "north")?,
            south: edge(bounds.south, "south")?,
            east: edge(bounds.east, "east")?,
            west: edge(bounds.west, "west")?,
        })
    }
}

/// Grouping granularity, coarsest first.
#[derive(Clone, Copy, Debug, Display, Eq, Ord, PartialEq, PartialOrd)]
#[strum(serialize_all = "lowercase")]
pub enum Granularity {
    /// Group by region
    Region,
    /// Group by region and country
    Country,
    /// Group by region, country and city
    City,
}

/// Zoom levels at which grouping becomes finer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomThresholds {
    /// Minimum zoom for grouping by country
    pub country: i32,
    /// Minimum zoom for grouping by city
    pub city: i32,
}

impl Default for ZoomThresholds {
    fn default() -> Self {
        Self { country: 3, city: 6 }
    }
}

impl ZoomThresholds {
    /// Returns the grouping granularity for a zoom level.
    pub fn granularity(&self, zoom: f64) -> Granularity {
        if zoom >= f64::from(self.city) {
            Granularity::City
        } else if zoom >= f64::from(self.country) {
            Granularity::Country
        } else {
            Granularity::Region
        }
    }
}

/// A validated map query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialQuery {
    pub bounds: BoundingBox,
    pub zoom: f64,
}

impl TryFrom<&models::DataRequest> for SpatialQuery {
    type Error = AtlasError;

    fn try_from(request_data: &models::DataRequest) -> Result<Self, Self::Error> {
        let bounds = request_data
            .bounds
            .as_ref()
            .ok_or_else(|| AtlasError::MissingField {
                field: "bounds".to_string(),
            })?;
        let zoom = request_data.zoom.ok_or_else(|| AtlasError::MissingField {
            field: "zoom".to_string(),
        })?;
        Ok(Self {
            bounds: BoundingBox::try_from(bounds)?,
            zoom,
        })
    }
}

/// Grouping key. Fields finer than the granularity are `None`.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
struct GroupKey<'a> {
    region: &'a str,
    country: Option<&'a str>,
    city: Option<&'a str>,
}

impl<'a> GroupKey<'a> {
    fn new(incident: &'a Incident, granularity: Granularity) -> Self {
        Self {
            region: &incident.region,
            country: (granularity >= Granularity::Country).then_some(incident.country.as_str()),
            city: (granularity >= Granularity::City).then_some(incident.city.as_str()),
        }
    }
}

/// Reductions for one group.
#[derive(Default)]
struct Group<'a> {
    latitude: Mean,
    longitude: Mean,
    nkill: Sum,
    nwound: Sum,
    nperps_mean: Mean,
    nperps_sum: Sum,
    events: CountDistinct<'a>,
    dates: Extent<NaiveDate>,
}

impl<'a> Group<'a> {
    fn push(&mut self, incident: &'a Incident) {
        self.latitude.push(incident.latitude);
        self.longitude.push(incident.longitude);
        self.nkill.push(incident.nkill);
        self.nwound.push(incident.nwound);
        self.nperps_mean.push(incident.nperps);
        self.nperps_sum.push(incident.nperps);
        self.events.push(incident.eventid.as_deref());
        self.dates.push(incident.date);
    }

    fn finish(&self, key: GroupKey) -> ClusterPoint {
        let (date_min, date_max) = match self.dates.finish() {
            Some((min, max)) => (Some(min), Some(max)),
            None => (None, None),
        };
        let range_end = |date: Option<NaiveDate>| {
            date.map_or_else(|| missing::TEXT_SENTINEL.to_owned(), calendar_date)
        };
        ClusterPoint {
            region: key.region.to_owned(),
            country: key.country.map(str::to_owned),
            city: key.city.map(str::to_owned),
            latitude_mean: Reported::number(self.latitude.finish()),
            longitude_mean: Reported::number(self.longitude.finish()),
            nkill_sum: reported::scrub(self.nkill.finish()),
            nwound_sum: reported::scrub(self.nwound.finish()),
            nperps_mean: Reported::number(self.nperps_mean.finish()),
            nperps_sum: reported::scrub(self.nperps_sum.finish()),
            event_count: self.events.finish(),
            date_min: date_min.map(iso_timestamp).into(),
            date_max: date_max.map(iso_timestamp).into(),
            date_range: format!("{} to {}", range_end(date_min), range_end(date_max)),
        }
    }
}

/// Group the incidents inside the query's bounding box.
///
/// Incidents without coordinates are ignored. Groups are returned in ascending key order.
///
/// # Arguments
///
/// * `dataset`: The incident dataset
/// * `query`: Bounding box and zoom level
/// * `thresholds`: Zoom levels at which grouping becomes finer
#[tracing::instrument(level = "DEBUG", skip(dataset))]
pub fn aggregate(
    dataset: &Dataset,
    query: &SpatialQuery,
    thresholds: ZoomThresholds,
) -> Vec<ClusterPoint> {
    let granularity = thresholds.granularity(query.zoom);
    let mut groups: BTreeMap<GroupKey, Group> = BTreeMap::new();
    let mut selected = 0;
    for incident in dataset.incidents().iter().filter(|incident| {
        incident
            .coordinates()
            .is_some_and(|(latitude, longitude)| query.bounds.contains(latitude, longitude))
    }) {
        selected += 1;
        groups
            .entry(GroupKey::new(incident, granularity))
            .or_default()
            .push(incident);
    }
    event!(
        Level::DEBUG,
        "Grouped {} incidents into {} groups by {}",
        selected,
        groups.len(),
        granularity
    );
    groups
        .iter()
        .map(|(key, group)| group.finish(*key))
        .collect()
}
