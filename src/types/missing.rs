//! Missing data descriptors
//!
//! The incident dataset marks absent values in several ways. Some are markers that a CSV reader
//! conventionally treats as empty (`NA`, `null`, an empty cell, ...), others are sentinels
//! specific to the dataset: `-99` in numeric fields and `Unknown` in any field. Each field is
//! normalised against these descriptors once, while loading, into an [Option].

/// Missing data
///
/// Describes which values of type `T` are to be treated as missing.
#[derive(Clone, Debug, PartialEq)]
pub enum Missing<T> {
    /// A single missing value
    MissingValue(T),
    /// Multiple missing values
    MissingValues(Vec<T>),
}

impl<T: PartialEq> Missing<T> {
    /// Filter function to check whether the provided value is a 'missing' value
    pub fn is_missing(&self, x: &T) -> bool {
        match self {
            Missing::MissingValue(value) => x == value,
            Missing::MissingValues(values) => values.contains(x),
        }
    }

    /// Returns `None` if `x` is missing, otherwise `Some(x)`.
    pub fn mask(&self, x: T) -> Option<T> {
        if self.is_missing(&x) {
            None
        } else {
            Some(x)
        }
    }
}

/// Numeric sentinel used by the dataset for an unrecorded value.
pub const NUMERIC_SENTINEL: f64 = -99.0;

/// Text sentinel used by the dataset for an unrecorded value.
pub const TEXT_SENTINEL: &str = "Unknown";

/// Cell contents that a CSV reader treats as empty before any dataset-specific cleaning.
pub fn read_markers() -> Missing<&'static str> {
    Missing::MissingValues(vec![
        "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
        "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
    ])
}

/// Missing descriptor for text fields.
pub fn text_sentinel() -> Missing<&'static str> {
    Missing::MissingValue(TEXT_SENTINEL)
}

/// Missing descriptor for numeric fields.
pub fn numeric_sentinel() -> Missing<f64> {
    Missing::MissingValue(NUMERIC_SENTINEL)
}
