//! Mergeable running statistics for one group of numeric values.
//!
//! [`RunningStat`] uses Welford's single-pass update for individual values and
//! the parallel variance combination for partial results, so partial
//! accumulators built on different workers can be merged in any order.
//! Variance is the population variance (the accumulated squared deviations
//! divided by `count`).

use serde::{Deserialize, Serialize};

use crate::core::errors::{DiscrimError, Result};

/// Count, mean, variance accumulator plus value range for one group
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RunningStat {
    count: u64,
    mean: f64,
    /// Sum of squared deviations from the running mean
    m2: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl RunningStat {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an accumulator from already absorbed values
    pub fn from_values<I>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut stat = Self::new();
        for value in values {
            stat.absorb(value)?;
        }
        Ok(stat)
    }

    /// Rebuild an accumulator from its summary moments.
    ///
    /// The value range is unknown for such a stat and stays empty.
    pub fn from_moments(count: u64, mean: f64, variance: f64) -> Result<Self> {
        if !mean.is_finite() || !variance.is_finite() || variance < 0.0 {
            return Err(DiscrimError::invalid_input(format!(
                "moments must be finite with non-negative variance (mean={mean}, variance={variance})"
            )));
        }
        if count == 0 {
            return Ok(Self::new());
        }
        Ok(Self {
            count,
            mean,
            m2: variance * count as f64,
            min: None,
            max: None,
        })
    }

    /// Incorporate one value.
    ///
    /// Non-finite values are rejected and leave the accumulator untouched.
    pub fn absorb(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(DiscrimError::invalid_input(format!(
                "cannot absorb non-finite value {value}"
            )));
        }

        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
        Ok(())
    }

    /// Combine two independently accumulated stats into a new one covering both inputs
    pub fn merge(&self, other: &RunningStat) -> RunningStat {
        if other.count == 0 {
            return *self;
        }
        if self.count == 0 {
            return *other;
        }

        let count = self.count + other.count;
        let count_f = count as f64;
        let self_count = self.count as f64;
        let other_count = other.count as f64;

        let delta = other.mean - self.mean;
        let mean = self.mean + delta * other_count / count_f;
        let m2 = self.m2 + other.m2 + delta * delta * self_count * other_count / count_f;

        RunningStat {
            count,
            mean,
            m2,
            min: merge_bound(self.min, other.min, f64::min),
            max: merge_bound(self.max, other.max, f64::max),
        }
    }

    /// Merge any number of partial stats
    pub fn merge_all<'a, I>(stats: I) -> RunningStat
    where
        I: IntoIterator<Item = &'a RunningStat>,
    {
        stats
            .into_iter()
            .fold(RunningStat::new(), |acc, stat| acc.merge(stat))
    }

    /// Number of absorbed values
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Whether no value has been absorbed yet
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Running mean (0.0 for an empty stat)
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance
    pub fn variance(&self) -> Result<f64> {
        if self.count == 0 {
            return Err(DiscrimError::insufficient_data(
                "variance requested for a group with no observations",
            ));
        }
        Ok(self.m2 / self.count as f64)
    }

    /// Population standard deviation
    pub fn std_dev(&self) -> Result<f64> {
        self.variance().map(f64::sqrt)
    }

    /// Smallest absorbed value, if known
    pub fn min(&self) -> Option<f64> {
        self.min
    }

    /// Largest absorbed value, if known
    pub fn max(&self) -> Option<f64> {
        self.max
    }
}

fn merge_bound(a: Option<f64>, b: Option<f64>, pick: fn(f64, f64) -> f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (a, None) => a,
        (None, b) => b,
    }
}
