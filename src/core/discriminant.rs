//! Fisher univariate linear discriminant for two classes.
//!
//! The calculation is stateless: it takes the finalized statistics of the two
//! class-conditioned groups of one feature (in order of first appearance) and
//! derives the prior log-odds, the pooled variance and the decision
//! threshold.

use serde::{Deserialize, Serialize};

use crate::core::errors::{DiscrimError, Result, ResultExt};
use crate::core::stats::RunningStat;

/// Finalized statistics of one class-conditioned group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionedFeatureStat {
    condition: String,
    count: u64,
    mean: f64,
    variance: f64,
}

impl ConditionedFeatureStat {
    /// Create a snapshot from summary values
    pub fn new(condition: impl Into<String>, count: u64, mean: f64, variance: f64) -> Self {
        Self {
            condition: condition.into(),
            count,
            mean,
            variance,
        }
    }

    /// Snapshot a fully accumulated group.
    ///
    /// Fails with `InsufficientData` when the group never saw a value.
    pub fn from_stat(condition: impl Into<String>, stat: &RunningStat) -> Result<Self> {
        let condition = condition.into();
        let variance = stat
            .variance()
            .with_context(|| format!("class '{condition}'"))?;
        Ok(Self::new(condition, stat.count(), stat.mean(), variance))
    }

    /// Class label
    pub fn condition(&self) -> &str {
        &self.condition
    }

    /// Number of observations in the class
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Class mean
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Class population variance
    pub fn variance(&self) -> f64 {
        self.variance
    }
}

/// Discriminant parameters of one feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscriminantResult {
    /// ln(count0 / count1)
    pub log_odds_prior: f64,
    /// Count-weighted average of the two class variances
    pub pooled_variance: f64,
    /// Decision threshold on the feature value
    pub threshold: f64,
}

/// Compute the discriminant from the two class snapshots.
///
/// `stat0` and `stat1` keep the order in which their classes were first seen;
/// swapping them flips the sign of the log-odds term.
pub fn compute_discriminant(
    stat0: &ConditionedFeatureStat,
    stat1: &ConditionedFeatureStat,
) -> Result<DiscriminantResult> {
    if stat1.count == 0 {
        return Err(DiscrimError::degenerate_class(stat1.condition.clone()));
    }
    if stat0.count == 0 {
        return Err(DiscrimError::insufficient_data(format!(
            "class '{}' has no observations",
            stat0.condition
        )));
    }

    let n0 = stat0.count as f64;
    let n1 = stat1.count as f64;

    let mean_diff = stat0.mean - stat1.mean;
    if mean_diff == 0.0 {
        return Err(DiscrimError::degenerate_discriminant(stat0.mean));
    }

    let pooled_variance = (stat0.variance * n0 + stat1.variance * n1) / (n0 + n1);
    let log_odds_prior = (n0 / n1).ln();
    let threshold =
        (stat0.mean + stat1.mean) / 2.0 - log_odds_prior * pooled_variance / mean_diff;

    Ok(DiscriminantResult {
        log_odds_prior,
        pooled_variance,
        threshold,
    })
}
