//! Reduce side of the aggregation.
//!
//! A [`ReduceTask`] owns every feature routed to it and holds one
//! [`FeatureReducer`] per feature. Reducers go through two phases:
//! `accumulate` merges partial statistics in whatever order they arrive, and
//! `finalize` consumes the reducer once its input is complete. Consuming the
//! state is what keeps finalize a one-shot operation.

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::core::discriminant::{compute_discriminant, ConditionedFeatureStat};
use crate::core::errors::{DiscrimError, Result, ResultExt};
use crate::core::keys::{ConditionValue, FeatureId, GroupKey};
use crate::core::stats::RunningStat;
use crate::pipeline::results::{
    FeatureDiscriminant, FeatureReport, GroupStatRecord, ReduceTaskOutput,
};

/// Accumulation state of one feature
#[derive(Debug, Clone)]
pub struct FeatureReducer {
    feature: FeatureId,
    groups: IndexMap<ConditionValue, RunningStat>,
}

impl FeatureReducer {
    /// Create an empty reducer for `feature`
    pub fn new(feature: FeatureId) -> Self {
        Self {
            feature,
            groups: IndexMap::new(),
        }
    }

    /// Feature owned by this reducer
    pub fn feature(&self) -> FeatureId {
        self.feature
    }

    /// Number of distinct groups seen so far
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Merge a partial statistic into its group
    pub fn accumulate(&mut self, key: &GroupKey, partial: &RunningStat) -> Result<()> {
        self.check_feature(key)?;
        if partial.is_empty() {
            return Ok(());
        }

        match self.groups.get_mut(key.condition()) {
            Some(stat) => *stat = stat.merge(partial),
            None => {
                self.groups.insert(key.condition().clone(), *partial);
            }
        }
        Ok(())
    }

    /// Absorb a single observation into its group
    pub fn accumulate_value(&mut self, key: &GroupKey, value: f64) -> Result<()> {
        self.check_feature(key)?;
        let mut stat = self.groups.get(key.condition()).copied().unwrap_or_default();
        stat.absorb(value)?;
        self.groups.insert(key.condition().clone(), stat);
        Ok(())
    }

    /// Freeze group statistics and compute the discriminant
    pub fn finalize(self) -> FeatureReport {
        let mut groups = Vec::with_capacity(self.groups.len());
        for (condition, stat) in &self.groups {
            let key = GroupKey::new(self.feature, condition.clone());
            match GroupStatRecord::from_stat(key, stat) {
                Ok(record) => groups.push(record),
                Err(err) => warn!(feature = %self.feature, error = %err, "dropping empty group"),
            }
        }

        let outcome = self.discriminate();
        match &outcome {
            Ok(discriminant) => debug!(
                feature = %self.feature,
                threshold = discriminant.result.threshold,
                "feature finalized"
            ),
            Err(err) => warn!(feature = %self.feature, error = %err, "feature failed to finalize"),
        }

        FeatureReport {
            feature: self.feature,
            groups,
            outcome,
        }
    }

    fn discriminate(&self) -> Result<FeatureDiscriminant> {
        let classes: SmallVec<[(&str, &RunningStat); 2]> = self
            .groups
            .iter()
            .filter_map(|(condition, stat)| condition.label().map(|label| (label, stat)))
            .collect();

        if classes.len() != 2 {
            let observed = classes.iter().map(|(label, _)| (*label).to_string()).collect();
            return Err(DiscrimError::malformed_group_set(
                self.feature.to_string(),
                observed,
            ));
        }

        let stat0 = ConditionedFeatureStat::from_stat(classes[0].0, classes[0].1)?;
        let stat1 = ConditionedFeatureStat::from_stat(classes[1].0, classes[1].1)?;
        let result = compute_discriminant(&stat0, &stat1)
            .with_context(|| format!("feature {}", self.feature))?;

        Ok(FeatureDiscriminant {
            classes: [stat0, stat1],
            result,
        })
    }

    fn check_feature(&self, key: &GroupKey) -> Result<()> {
        if key.feature() != self.feature {
            return Err(DiscrimError::pipeline(
                "reduce",
                format!(
                    "group for feature {} routed to reducer of feature {}",
                    key.feature(),
                    self.feature
                ),
            ));
        }
        Ok(())
    }
}

/// One logical reduce task owning a set of features
#[derive(Debug, Default)]
pub struct ReduceTask {
    index: usize,
    features: IndexMap<FeatureId, FeatureReducer>,
}

impl ReduceTask {
    /// Create an empty reduce task
    pub fn new(index: usize) -> Self {
        Self {
            index,
            features: IndexMap::new(),
        }
    }

    /// Task index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Features still awaiting finalize
    pub fn pending_features(&self) -> impl Iterator<Item = FeatureId> + '_ {
        self.features.keys().copied()
    }

    /// Merge a partial statistic into the reducer of its feature
    pub fn accumulate(&mut self, key: &GroupKey, partial: &RunningStat) -> Result<()> {
        self.features
            .entry(key.feature())
            .or_insert_with(|| FeatureReducer::new(key.feature()))
            .accumulate(key, partial)
    }

    /// Finalize one feature. A feature can only be finalized once.
    pub fn finalize(&mut self, feature: FeatureId) -> Result<FeatureReport> {
        self.features
            .shift_remove(&feature)
            .map(FeatureReducer::finalize)
            .ok_or_else(|| {
                DiscrimError::pipeline(
                    "finalize",
                    format!(
                        "feature {feature} has no accumulated state in reduce task {}",
                        self.index
                    ),
                )
            })
    }

    /// Finalize every remaining feature; the end-of-input signal for this task
    pub fn finish(self) -> ReduceTaskOutput {
        let mut reducers: Vec<FeatureReducer> = self.features.into_values().collect();
        reducers.sort_by_key(FeatureReducer::feature);

        ReduceTaskOutput {
            task: self.index,
            reports: reducers.into_iter().map(FeatureReducer::finalize).collect(),
        }
    }
}
