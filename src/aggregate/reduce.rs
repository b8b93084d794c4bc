//! Reductions applied per group.
//!
//! Each reduction is implemented as a struct that implements the [Reduction] trait. Missing
//! values are pushed as `None` and skipped by every reduction.

use hashbrown::HashSet;

/// Trait for per-group reductions.
pub trait Reduction<T> {
    /// Type of the reduced value.
    type Output;

    /// Fold a value into the reduction.
    fn push(&mut self, value: Option<T>);

    /// Return the reduced value.
    fn finish(&self) -> Self::Output;
}

/// Sum of non-missing values. The sum of no values is zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sum {
    total: f64,
}

impl Reduction<f64> for Sum {
    type Output = f64;

    fn push(&mut self, value: Option<f64>) {
        if let Some(value) = value {
            self.total += value;
        }
    }

    fn finish(&self) -> f64 {
        self.total
    }
}

/// Arithmetic mean of non-missing values. The mean of no values is missing.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mean {
    sum: Sum,
    count: usize,
}

impl Reduction<f64> for Mean {
    type Output = Option<f64>;

    fn push(&mut self, value: Option<f64>) {
        if value.is_some() {
            self.count += 1;
            self.sum.push(value);
        }
    }

    fn finish(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum.finish() / self.count as f64)
    }
}

/// Number of distinct non-missing values.
#[derive(Clone, Debug, Default)]
pub struct CountDistinct<'a> {
    seen: HashSet<&'a str>,
}

impl<'a> Reduction<&'a str> for CountDistinct<'a> {
    type Output = usize;

    fn push(&mut self, value: Option<&'a str>) {
        if let Some(value) = value {
            self.seen.insert(value);
        }
    }

    fn finish(&self) -> usize {
        self.seen.len()
    }
}

/// Minimum and maximum of non-missing values.
#[derive(Clone, Copy, Debug)]
pub struct Extent<T> {
    bounds: Option<(T, T)>,
}

impl<T> Default for Extent<T> {
    fn default() -> Self {
        Self { bounds: None }
    }
}

impl<T: Copy + Ord> Reduction<T> for Extent<T> {
    type Output = Option<(T, T)>;

    fn push(&mut self, value: Option<T>) {
        let Some(value) = value else {
            return;
        };
        self.bounds = Some(match self.bounds {
            Some((min, max)) => (min.min(value), max.max(value)),
            None => (value, value),
        });
    }

    fn finish(&self) -> Option<(T, T)> {
        self.bounds
    }
}
