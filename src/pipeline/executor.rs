//! In-process map → combine → shuffle → reduce runtime.
//!
//! Map shards run independently on the rayon pool. Their partial statistics
//! are routed to reduce tasks by feature id, each reduce task merges its
//! partials in arrival order, and once a task has seen all of its input it
//! finalizes every feature it owns.

use std::borrow::Borrow;
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, info_span, warn};

use crate::core::config::AggregationConfig;
use crate::core::errors::{DiscrimError, Result};
use crate::core::extractor::Extractor;
use crate::core::keys::GroupKey;
use crate::core::stats::RunningStat;
use crate::pipeline::mapper::{MapCounters, MapOutput, ShardMapper};
use crate::pipeline::partition::{FeaturePartitioner, Partitioner};
use crate::pipeline::reducer::ReduceTask;
use crate::pipeline::results::{AggregationResults, PipelineStatistics, ReduceTaskOutput};

type Bucket = Vec<(GroupKey, RunningStat)>;

/// Aggregation pipeline over a shared extractor
pub struct AggregationPipeline<E, P = FeaturePartitioner> {
    extractor: E,
    partitioner: P,
    config: AggregationConfig,
    pool: Option<ThreadPool>,
}

impl<E: Extractor> AggregationPipeline<E> {
    /// Create a pipeline routing features by hash
    pub fn new(extractor: E, config: AggregationConfig) -> Result<Self> {
        Self::with_partitioner(extractor, FeaturePartitioner, config)
    }
}

impl<E: Extractor, P: Partitioner> AggregationPipeline<E, P> {
    /// Create a pipeline with a custom shuffle partitioner
    pub fn with_partitioner(
        extractor: E,
        partitioner: P,
        config: AggregationConfig,
    ) -> Result<Self> {
        config.validate()?;

        let pool = match config.num_workers {
            Some(workers) => Some(
                ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|index| format!("discrim-worker-{index}"))
                    .build()
                    .map_err(|e| {
                        DiscrimError::concurrency(format!("Failed to build worker pool: {e}"))
                    })?,
            ),
            None => None,
        };

        Ok(Self {
            extractor,
            partitioner,
            config,
            pool,
        })
    }

    /// Runtime settings
    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Extractor shared by the map workers
    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Run over records already split into shards
    pub fn run<T>(&self, shards: &[Vec<T>]) -> Result<AggregationResults>
    where
        T: Borrow<E::Record> + Sync,
    {
        let shards: Vec<&[T]> = shards.iter().map(Vec::as_slice).collect();
        self.install(|| self.execute(&shards))
    }

    /// Run over a flat list of records, sharded by `shard_size`
    pub fn run_records<T>(&self, records: &[T]) -> Result<AggregationResults>
    where
        T: Borrow<E::Record> + Sync,
    {
        let shards: Vec<&[T]> = records.chunks(self.config.shard_size).collect();
        self.install(|| self.execute(&shards))
    }

    fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    fn execute<T>(&self, shards: &[&[T]]) -> Result<AggregationResults>
    where
        T: Borrow<E::Record> + Sync,
    {
        let started = Instant::now();
        let num_reducers = self.config.num_reducers;
        info!(
            shards = shards.len(),
            reducers = num_reducers,
            combiner = self.config.enable_combiner,
            "Starting aggregation"
        );

        let map_outputs = self.map_phase(shards);
        let (buckets, counters, partials_shuffled) = self.shuffle(map_outputs)?;
        let tasks = Self::reduce_phase(buckets)?;

        let mut statistics = PipelineStatistics {
            map_shards: shards.len(),
            reduce_tasks: num_reducers,
            records_read: counters.records_read,
            values_rejected: counters.values_rejected,
            pairs_emitted: counters.pairs_emitted,
            partials_shuffled,
            ..PipelineStatistics::default()
        };
        for report in tasks.iter().flat_map(|task| task.reports.iter()) {
            if report.outcome.is_ok() {
                statistics.features_finalized += 1;
            } else {
                statistics.features_failed += 1;
            }
        }
        statistics.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            records = statistics.records_read,
            rejected = statistics.values_rejected,
            finalized = statistics.features_finalized,
            failed = statistics.features_failed,
            elapsed_ms = statistics.elapsed_ms,
            "Aggregation completed"
        );

        Ok(AggregationResults { tasks, statistics })
    }

    fn map_phase<T>(&self, shards: &[&[T]]) -> Vec<MapOutput>
    where
        T: Borrow<E::Record> + Sync,
    {
        let mapper = ShardMapper::new(&self.extractor, self.config.enable_combiner);

        #[cfg(feature = "parallel")]
        let outputs = shards
            .par_iter()
            .map(|shard| mapper.map_shard(*shard))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let outputs = shards.iter().map(|shard| mapper.map_shard(*shard)).collect();

        outputs
    }

    fn shuffle(&self, map_outputs: Vec<MapOutput>) -> Result<(Vec<Bucket>, MapCounters, u64)> {
        let num_reducers = self.config.num_reducers;
        let mut buckets: Vec<Bucket> = (0..num_reducers).map(|_| Vec::new()).collect();
        let mut counters = MapCounters::default();
        let mut shuffled = 0u64;

        for output in map_outputs {
            counters.add(&output.counters);
            for (key, partial) in output.partials {
                let task = self.partitioner.partition(key.feature(), num_reducers);
                let bucket = buckets.get_mut(task).ok_or_else(|| {
                    DiscrimError::pipeline(
                        "shuffle",
                        format!(
                            "feature {} routed to task {task} but only {num_reducers} exist",
                            key.feature()
                        ),
                    )
                })?;
                bucket.push((key, partial));
                shuffled += 1;
            }
        }

        for (task, bucket) in buckets.iter().enumerate() {
            if bucket.is_empty() {
                warn!(task, "Reduce task received no partials");
            } else {
                debug!(task, partials = bucket.len(), "Reduce task input ready");
            }
        }

        Ok((buckets, counters, shuffled))
    }

    fn reduce_phase(buckets: Vec<Bucket>) -> Result<Vec<ReduceTaskOutput>> {
        #[cfg(feature = "parallel")]
        let tasks = buckets
            .into_par_iter()
            .enumerate()
            .map(|(index, bucket)| Self::reduce_task(index, bucket))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let tasks = buckets
            .into_iter()
            .enumerate()
            .map(|(index, bucket)| Self::reduce_task(index, bucket))
            .collect();

        tasks
    }

    fn reduce_task(index: usize, bucket: Bucket) -> Result<ReduceTaskOutput> {
        let span = info_span!("reduce_task", task = index, partials = bucket.len());
        let _guard = span.enter();

        let mut task = ReduceTask::new(index);
        for (key, partial) in &bucket {
            task.accumulate(key, partial)?;
        }
        Ok(task.finish())
    }
}

impl<E, P> std::fmt::Debug for AggregationPipeline<E, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregationPipeline")
            .field("config", &self.config)
            .field("dedicated_pool", &self.pool.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
