//! Map side of the aggregation: extraction plus optional local combining.

use std::borrow::Borrow;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::extractor::Extractor;
use crate::core::keys::GroupKey;
use crate::core::stats::RunningStat;

/// Counters collected while mapping one shard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapCounters {
    /// Records handed to the extractor
    pub records_read: u64,
    /// Feature values skipped as invalid input
    pub values_rejected: u64,
    /// (group, value) observations absorbed
    pub pairs_emitted: u64,
}

impl MapCounters {
    /// Add another shard's counters to these
    pub fn add(&mut self, other: &MapCounters) {
        self.records_read += other.records_read;
        self.values_rejected += other.values_rejected;
        self.pairs_emitted += other.pairs_emitted;
    }
}

/// Partial statistics shipped from one map shard to the shuffle
#[derive(Debug, Clone, Default)]
pub struct MapOutput {
    /// Partial stats in first-emission order
    pub partials: Vec<(GroupKey, RunningStat)>,
    /// Shard counters
    pub counters: MapCounters,
}

/// Runs the map (and combine) phase over one shard of records
#[derive(Debug)]
pub struct ShardMapper<'e, E> {
    extractor: &'e E,
    enable_combiner: bool,
}

impl<'e, E: Extractor> ShardMapper<'e, E> {
    /// Create a mapper over a shared extractor
    pub fn new(extractor: &'e E, enable_combiner: bool) -> Self {
        Self {
            extractor,
            enable_combiner,
        }
    }

    /// Map one shard.
    ///
    /// With the combiner enabled every group leaves the shard as a single
    /// partial; without it each observation ships as its own one-value stat.
    pub fn map_shard<T>(&self, records: &[T]) -> MapOutput
    where
        T: Borrow<E::Record>,
    {
        let mut counters = MapCounters::default();
        let mut combined: IndexMap<GroupKey, RunningStat> = IndexMap::new();
        let mut singletons: Vec<(GroupKey, RunningStat)> = Vec::new();

        for record in records {
            counters.records_read += 1;
            let extraction = self.extractor.extract(record.borrow());

            for err in &extraction.rejected {
                debug!(error = %err, "skipping feature value");
            }
            counters.values_rejected += extraction.rejected.len() as u64;

            for (key, value) in extraction.pairs {
                let absorbed = if self.enable_combiner {
                    combined.entry(key).or_default().absorb(value)
                } else {
                    let mut stat = RunningStat::new();
                    let absorbed = stat.absorb(value);
                    if absorbed.is_ok() {
                        singletons.push((key, stat));
                    }
                    absorbed
                };

                match absorbed {
                    Ok(()) => counters.pairs_emitted += 1,
                    Err(err) => {
                        debug!(error = %err, "extractor emitted an unusable value");
                        counters.values_rejected += 1;
                    }
                }
            }
        }

        let partials = if self.enable_combiner {
            combined.into_iter().collect()
        } else {
            singletons
        };

        MapOutput { partials, counters }
    }
}
