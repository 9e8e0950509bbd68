//! Shuffle routing between map workers and reduce tasks.
//!
//! Partitioners only ever see the [`FeatureId`] of a group, never its
//! conditioning value, so every group of a feature lands in the same reduce
//! task. Finalizing a feature needs both of its class-conditioned groups in
//! one place.

use xxhash_rust::xxh3::xxh3_64;

use crate::core::keys::FeatureId;

/// Assigns features to reduce tasks
pub trait Partitioner: Send + Sync {
    /// Reduce task index in `0..num_partitions` owning `feature`
    fn partition(&self, feature: FeatureId, num_partitions: usize) -> usize;
}

/// Stable hash partitioning on the feature id
#[derive(Debug, Clone, Copy, Default)]
pub struct FeaturePartitioner;

impl Partitioner for FeaturePartitioner {
    fn partition(&self, feature: FeatureId, num_partitions: usize) -> usize {
        if num_partitions <= 1 {
            return 0;
        }
        let hash = xxh3_64(&(feature.ordinal() as u64).to_le_bytes());
        (hash % num_partitions as u64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_is_stable_and_in_range() {
        let partitioner = FeaturePartitioner;
        for ordinal in 0..200 {
            let first = partitioner.partition(FeatureId(ordinal), 7);
            let second = partitioner.partition(FeatureId(ordinal), 7);
            assert_eq!(first, second);
            assert!(first < 7);
        }
    }

    #[test]
    fn test_single_partition_takes_everything() {
        let partitioner = FeaturePartitioner;
        assert_eq!(partitioner.partition(FeatureId(12), 1), 0);
        assert_eq!(partitioner.partition(FeatureId(12), 0), 0);
    }

    #[test]
    fn test_features_spread_over_partitions() {
        let partitioner = FeaturePartitioner;
        let mut used = std::collections::HashSet::new();
        for ordinal in 0..64 {
            used.insert(partitioner.partition(FeatureId(ordinal), 4));
        }
        assert!(used.len() > 1);
    }
}
