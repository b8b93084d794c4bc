//! Incident dataset loading and cleaning.
//!
//! The dataset is a CSV extract of the Global Terrorism Database. It is read once at startup,
//! normalised field by field into [Incident] records and then shared read-only between request
//! handlers.

use crate::error::AtlasError;
use crate::types::missing::{self, Missing};

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use csv::StringRecord;
use std::io::Read;
use std::path::Path;
use strum_macros::Display;
use tracing::{event, Level};

/// Text encoding of the dataset file.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, ValueEnum)]
#[strum(serialize_all = "lowercase")]
pub enum Encoding {
    /// ISO-8859-1
    #[default]
    Latin1,
    /// UTF-8
    Utf8,
}

impl Encoding {
    /// Decode raw file contents to a string.
    pub fn decode(self, bytes: Vec<u8>) -> Result<String, AtlasError> {
        match self {
            // Every byte maps to the code point of the same value.
            Self::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
            Self::Utf8 => Ok(String::from_utf8(bytes)?),
        }
    }
}

/// A single cleaned incident record.
#[derive(Clone, Debug, PartialEq)]
pub struct Incident {
    /// Event identifier
    pub eventid: Option<String>,
    /// Region name
    pub region: String,
    /// Country name
    pub country: String,
    /// City name
    pub city: String,
    /// Latitude in degrees
    pub latitude: Option<f64>,
    /// Longitude in degrees
    pub longitude: Option<f64>,
    /// Year, or 0 if unrecorded
    pub iyear: i32,
    /// Month, or 0 if unrecorded
    pub imonth: i32,
    /// Day of month, 1 if unrecorded
    pub iday: i32,
    /// Number of people killed
    pub nkill: Option<f64>,
    /// Number of people wounded
    pub nwound: Option<f64>,
    /// Number of perpetrators
    pub nperps: Option<f64>,
    /// Date of the incident, if the date parts form a valid date
    pub date: Option<NaiveDate>,
}

impl Incident {
    /// Returns the coordinates of the incident, if both are known.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// Compose a calendar date from dataset date parts.
///
/// An unrecorded month counts as January and an unrecorded day as the first of the month.
/// Returns `None` for combinations that are not a date, or that fall outside the range of
/// nanosecond timestamps (1677-09-22 to 2262-04-11).
pub fn compose_date(year: i32, month: i32, day: i32) -> Option<NaiveDate> {
    let month = u32::try_from(month.max(1)).ok()?;
    let day = u32::try_from(if day == 0 { 1 } else { day }).ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let ymd = (date.year(), date.month(), date.day());
    if ymd < (1677, 9, 22) || ymd > (2262, 4, 11) {
        return None;
    }
    Some(date)
}

/// Statistics gathered while loading the dataset.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LoadStats {
    /// Rows read from the file
    pub rows_read: usize,
    /// Rows dropped due to a missing region, country or city
    pub rows_dropped: usize,
    /// Rows kept without a valid date
    pub rows_undated: usize,
}

/// Positions of the required columns in the dataset header.
struct ColumnLayout {
    eventid: usize,
    region: usize,
    country: usize,
    city: usize,
    latitude: usize,
    longitude: usize,
    iyear: usize,
    imonth: usize,
    iday: usize,
    nkill: usize,
    nwound: usize,
    nperps: usize,
}

impl ColumnLayout {
    fn from_headers(headers: &StringRecord) -> Result<Self, AtlasError> {
        let position = |column: &'static str| {
            headers
                .iter()
                .position(|header| header == column)
                .ok_or(AtlasError::DatasetMissingColumn { column })
        };
        Ok(Self {
            eventid: position("eventid")?,
            region: position("region_txt")?,
            country: position("country_txt")?,
            city: position("city")?,
            latitude: position("latitude")?,
            longitude: position("longitude")?,
            iyear: position("iyear")?,
            imonth: position("imonth")?,
            iday: position("iday")?,
            nkill: position("nkill")?,
            nwound: position("nwound")?,
            nperps: position("nperps")?,
        })
    }
}

/// Per-field missing value normalisation.
struct Cleaner {
    read_markers: Missing<&'static str>,
    text_sentinel: Missing<&'static str>,
    numeric_sentinel: Missing<f64>,
}

impl Cleaner {
    fn new() -> Self {
        Self {
            read_markers: missing::read_markers(),
            text_sentinel: missing::text_sentinel(),
            numeric_sentinel: missing::numeric_sentinel(),
        }
    }

    /// Returns the raw cell, or `None` if it is empty or holds a sentinel.
    ///
    /// The numeric sentinel applies to every column, including text columns.
    fn cell<'r>(&self, record: &'r StringRecord, index: usize) -> Option<&'r str> {
        record
            .get(index)
            .filter(|value| !self.read_markers.is_missing(value))
            .filter(|value| !self.text_sentinel.is_missing(value))
            .filter(|value| !self.is_numeric_sentinel(value))
    }

    fn is_numeric_sentinel(&self, value: &str) -> bool {
        value
            .trim()
            .parse::<f64>()
            .is_ok_and(|number| self.numeric_sentinel.is_missing(&number))
    }

    fn text(&self, record: &StringRecord, index: usize) -> Option<String> {
        self.cell(record, index).map(str::to_owned)
    }

    /// A numeric cell. Values that are not numbers are an error.
    fn number(
        &self,
        record: &StringRecord,
        index: usize,
        column: &'static str,
    ) -> Result<Option<f64>, AtlasError> {
        let Some(raw) = self.cell(record, index) else {
            return Ok(None);
        };
        let value = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| AtlasError::DatasetInvalidNumber {
                column,
                line: record.position().map_or(0, |position| position.line()),
                value: raw.to_owned(),
            })?;
        Ok(self.numeric_sentinel.mask(value).filter(|value| !value.is_nan()))
    }

    /// A numeric cell. Values that are not numbers are treated as missing.
    fn coerce_number(&self, record: &StringRecord, index: usize) -> Option<f64> {
        self.cell(record, index)
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .and_then(|value| self.numeric_sentinel.mask(value))
            .filter(|value| !value.is_nan())
    }

    /// An integral date part, or 0 if missing.
    fn date_part(
        &self,
        record: &StringRecord,
        index: usize,
        column: &'static str,
    ) -> Result<i32, AtlasError> {
        let Some(value) = self.number(record, index, column)? else {
            return Ok(0);
        };
        if value.fract() != 0.0 || value.abs() > f64::from(i32::MAX) {
            return Err(AtlasError::DatasetInvalidNumber {
                column,
                line: record.position().map_or(0, |position| position.line()),
                value: value.to_string(),
            });
        }
        Ok(value as i32)
    }

    /// Clean a single record.
    ///
    /// Returns `None` for records without a region, country or city.
    fn incident(
        &self,
        layout: &ColumnLayout,
        record: &StringRecord,
    ) -> Result<Option<Incident>, AtlasError> {
        let (Some(region), Some(country), Some(city)) = (
            self.text(record, layout.region),
            self.text(record, layout.country),
            self.text(record, layout.city),
        ) else {
            return Ok(None);
        };
        let iyear = self.date_part(record, layout.iyear, "iyear")?;
        let imonth = self.date_part(record, layout.imonth, "imonth")?;
        let iday = match self.date_part(record, layout.iday, "iday")? {
            0 => 1,
            day => day,
        };
        Ok(Some(Incident {
            eventid: self.text(record, layout.eventid),
            region,
            country,
            city,
            latitude: self.number(record, layout.latitude, "latitude")?,
            longitude: self.number(record, layout.longitude, "longitude")?,
            iyear,
            imonth,
            iday,
            nkill: self.number(record, layout.nkill, "nkill")?,
            nwound: self.number(record, layout.nwound, "nwound")?,
            nperps: self.coerce_number(record, layout.nperps),
            date: compose_date(iyear, imonth, iday),
        }))
    }
}

/// The cleaned, read-only incident table.
#[derive(Debug, Default)]
pub struct Dataset {
    /// Column names of the source file
    columns: Vec<String>,
    /// Cleaned records, in file order
    incidents: Vec<Incident>,
}

impl Dataset {
    /// Build a dataset from already cleaned incidents.
    pub fn from_incidents(incidents: Vec<Incident>) -> Self {
        Self {
            columns: Vec::new(),
            incidents,
        }
    }

    /// Load and clean the dataset at `path`.
    ///
    /// # Arguments
    ///
    /// * `path`: Path to the CSV file
    /// * `encoding`: Text encoding of the file
    #[tracing::instrument(level = "DEBUG", skip(path), fields(path = %path.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(
        path: P,
        encoding: Encoding,
    ) -> Result<(Self, LoadStats), AtlasError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| AtlasError::DatasetRead {
            path: path.display().to_string(),
            source,
        })?;
        let text = encoding.decode(bytes)?;
        Self::from_reader(text.as_bytes())
    }

    /// Parse and clean CSV data from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<(Self, LoadStats), AtlasError> {
        let mut reader = csv::ReaderBuilder::new().from_reader(reader);
        let headers = reader.headers()?.clone();
        let columns: Vec<String> = headers.iter().map(str::to_owned).collect();
        event!(Level::DEBUG, "Dataset columns: {:?}", columns);
        let layout = ColumnLayout::from_headers(&headers)?;
        let cleaner = Cleaner::new();

        let mut stats = LoadStats::default();
        let mut incidents = Vec::new();
        for record in reader.records() {
            let record = record?;
            stats.rows_read += 1;
            match cleaner.incident(&layout, &record)? {
                Some(incident) => {
                    if incident.date.is_none() {
                        stats.rows_undated += 1;
                    }
                    incidents.push(incident);
                }
                None => stats.rows_dropped += 1,
            }
        }

        Ok((Self { columns, incidents }, stats))
    }

    /// Column names of the source file.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All cleaned incidents.
    pub fn incidents(&self) -> &[Incident] {
        &self.incidents
    }

    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }
}
