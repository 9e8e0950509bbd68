//! Map → combine → reduce aggregation of group statistics.

pub mod executor;
pub mod mapper;
pub mod partition;
pub mod reducer;
pub mod results;

pub use executor::AggregationPipeline;
pub use mapper::{MapCounters, MapOutput, ShardMapper};
pub use partition::{FeaturePartitioner, Partitioner};
pub use reducer::{FeatureReducer, ReduceTask};
pub use results::{
    AggregationResults, FeatureDiscriminant, FeatureFailure, FeatureReport, GroupStatRecord,
    PipelineStatistics, ReduceTaskOutput,
};
