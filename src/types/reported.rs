//! Values reported to clients, which may be unknown

use serde::{Serialize, Serializer};

use crate::types::missing::{NUMERIC_SENTINEL, TEXT_SENTINEL};

/// A value in an aggregated response.
///
/// Unknown values are serialised as the string `"Unknown"`, which existing clients expect in
/// place of `null`.
#[derive(Clone, Debug, PartialEq)]
pub enum Reported<T> {
    /// A known value
    Known(T),
    /// No value could be computed
    Unknown,
}

impl Reported<f64> {
    /// Report an optional number.
    ///
    /// `None` and NaN are unknown, and the numeric sentinel is reported as zero.
    pub fn number(value: Option<f64>) -> Self {
        match value {
            Some(value) if value.is_nan() => Self::Unknown,
            Some(value) => Self::Known(scrub(value)),
            None => Self::Unknown,
        }
    }
}

impl<T> From<Option<T>> for Reported<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unknown, Self::Known)
    }
}

impl<T: Serialize> Serialize for Reported<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Known(value) => value.serialize(serializer),
            Self::Unknown => serializer.serialize_str(TEXT_SENTINEL),
        }
    }
}

/// Replace the numeric sentinel with zero.
pub fn scrub(value: f64) -> f64 {
    if value == NUMERIC_SENTINEL {
        0.0
    } else {
        value
    }
}
