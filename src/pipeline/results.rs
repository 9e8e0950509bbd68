//! Result types produced by the aggregation pipeline.

use serde::{Deserialize, Serialize};

use crate::core::discriminant::{ConditionedFeatureStat, DiscriminantResult};
use crate::core::errors::{DiscrimError, Result};
use crate::core::keys::{FeatureId, GroupKey};
use crate::core::stats::RunningStat;

/// Final statistics of one accumulated group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStatRecord {
    /// Group the statistics belong to
    pub key: GroupKey,
    /// Number of observations
    pub count: u64,
    /// Mean of the observations
    pub mean: f64,
    /// Population variance
    pub variance: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Smallest observation
    pub min: f64,
    /// Largest observation
    pub max: f64,
}

impl GroupStatRecord {
    /// Freeze a fully reduced statistic
    pub fn from_stat(key: GroupKey, stat: &RunningStat) -> Result<Self> {
        let variance = stat.variance()?;
        let (min, max) = match (stat.min(), stat.max()) {
            (Some(min), Some(max)) => (min, max),
            // Stats rebuilt from moments carry no extremes
            _ => (f64::NAN, f64::NAN),
        };

        Ok(Self {
            key,
            count: stat.count(),
            mean: stat.mean(),
            variance,
            std_dev: variance.sqrt(),
            min,
            max,
        })
    }
}

/// Discriminant of one feature together with the class snapshots it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDiscriminant {
    /// Class snapshots in order of first appearance
    pub classes: [ConditionedFeatureStat; 2],
    /// Discriminant parameters
    pub result: DiscriminantResult,
}

/// Everything finalize produced for one feature
#[derive(Debug)]
pub struct FeatureReport {
    /// Feature the report belongs to
    pub feature: FeatureId,
    /// Group statistics, unconditioned and class-conditioned, in first-appearance order
    pub groups: Vec<GroupStatRecord>,
    /// Discriminant or the reason it could not be computed
    pub outcome: Result<FeatureDiscriminant>,
}

impl FeatureReport {
    /// Discriminant if finalize succeeded
    pub fn discriminant(&self) -> Option<&FeatureDiscriminant> {
        self.outcome.as_ref().ok()
    }

    /// Failure if finalize did not produce a discriminant
    pub fn error(&self) -> Option<&DiscrimError> {
        self.outcome.as_ref().err()
    }

    /// Statistics of one group of this feature
    pub fn group(&self, key: &GroupKey) -> Option<&GroupStatRecord> {
        self.groups.iter().find(|group| &group.key == key)
    }
}

/// A feature whose discriminant could not be computed
#[derive(Debug, Clone, Copy)]
pub struct FeatureFailure<'a> {
    /// Failed feature
    pub feature: FeatureId,
    /// Reduce task that owned the feature
    pub reduce_task: usize,
    /// Cause
    pub error: &'a DiscrimError,
}

/// Output of one reduce task
#[derive(Debug, Default)]
pub struct ReduceTaskOutput {
    /// Reduce task index
    pub task: usize,
    /// Reports for every feature the task owned, ordered by feature id
    pub reports: Vec<FeatureReport>,
}

/// Counters describing one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStatistics {
    /// Map shards processed
    pub map_shards: usize,
    /// Reduce tasks run
    pub reduce_tasks: usize,
    /// Records read by the map phase
    pub records_read: u64,
    /// Input lines dropped before the map phase (unreadable text)
    #[serde(default)]
    pub records_rejected: u64,
    /// Feature values skipped as invalid
    pub values_rejected: u64,
    /// Observations absorbed on the map side
    pub pairs_emitted: u64,
    /// Partial statistics moved through the shuffle
    pub partials_shuffled: u64,
    /// Features that produced a discriminant
    pub features_finalized: usize,
    /// Features whose discriminant failed
    pub features_failed: usize,
    /// Wall time of the run in milliseconds
    pub elapsed_ms: u64,
}

/// Results of one aggregation run
#[derive(Debug, Default)]
pub struct AggregationResults {
    /// Output of each reduce task, ordered by task index
    pub tasks: Vec<ReduceTaskOutput>,
    /// Run counters
    pub statistics: PipelineStatistics,
}

impl AggregationResults {
    /// All feature reports across reduce tasks
    pub fn reports(&self) -> impl Iterator<Item = &FeatureReport> {
        self.tasks.iter().flat_map(|task| task.reports.iter())
    }

    /// Report of one feature
    pub fn report(&self, feature: FeatureId) -> Option<&FeatureReport> {
        self.reports().find(|report| report.feature == feature)
    }

    /// Successfully computed discriminants
    pub fn discriminants(&self) -> impl Iterator<Item = (FeatureId, &FeatureDiscriminant)> {
        self.reports()
            .filter_map(|report| report.discriminant().map(|d| (report.feature, d)))
    }

    /// Features whose discriminant could not be computed
    pub fn failures(&self) -> Vec<FeatureFailure<'_>> {
        self.tasks
            .iter()
            .flat_map(|task| {
                task.reports.iter().filter_map(move |report| {
                    report.error().map(|error| FeatureFailure {
                        feature: report.feature,
                        reduce_task: task.task,
                        error,
                    })
                })
            })
            .collect()
    }

    /// Whether any feature failed
    pub fn has_failures(&self) -> bool {
        self.reports().any(|report| report.outcome.is_err())
    }
}
