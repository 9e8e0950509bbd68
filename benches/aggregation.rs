//! Benchmarks for the statistics aggregation hot paths.
//!
//! Covers single-value absorb, partial merges, and full pipeline runs across
//! shard sizes with and without the map-side combiner.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use discrim_rs::core::config::AggregationConfig;
use discrim_rs::core::extractor::DelimitedExtractor;
use discrim_rs::core::keys::FeatureId;
use discrim_rs::core::stats::RunningStat;
use discrim_rs::pipeline::AggregationPipeline;

/// Generate synthetic delimited records with `features` numeric columns and a class label last
fn generate_records(count: usize, features: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let mut fields: Vec<String> = (0..features)
                .map(|j| format!("{:.3}", ((i * (j + 3)) % 997) as f64 * 0.1))
                .collect();
            fields.push(if i % 3 == 0 { "pos" } else { "neg" }.to_string());
            fields.join(",")
        })
        .collect()
}

fn benchmark_running_stat(c: &mut Criterion) {
    let values: Vec<f64> = (0..10_000).map(|i| (i % 113) as f64 * 0.5).collect();

    c.bench_function("running_stat_absorb_10k", |b| {
        b.iter(|| {
            let mut stat = RunningStat::new();
            for &value in &values {
                let _ = stat.absorb(black_box(value));
            }
            stat
        })
    });

    let partials: Vec<RunningStat> = values
        .chunks(100)
        .map(|chunk| RunningStat::from_values(chunk.iter().copied()).unwrap_or_default())
        .collect();

    c.bench_function("running_stat_merge_100_partials", |b| {
        b.iter(|| RunningStat::merge_all(black_box(&partials)))
    });
}

fn benchmark_pipeline(c: &mut Criterion) {
    let features = 8;
    let records = generate_records(50_000, features);
    let ordinals: Vec<FeatureId> = (0..features).map(FeatureId).collect();

    let mut group = c.benchmark_group("pipeline");
    group.sample_size(20);

    for shard_size in [1_000usize, 10_000] {
        for combiner in [true, false] {
            let config = AggregationConfig {
                shard_size,
                num_reducers: 4,
                enable_combiner: combiner,
                ..AggregationConfig::default()
            };
            let extractor = DelimitedExtractor::new(",", ordinals.clone(), features);
            let Ok(pipeline) = AggregationPipeline::new(extractor, config) else {
                continue;
            };

            let id = BenchmarkId::new(
                if combiner { "combined" } else { "raw" },
                shard_size,
            );
            group.bench_with_input(id, &records, |b, records| {
                b.iter(|| pipeline.run_records(black_box(records)))
            });
        }
    }

    group.finish();
}

criterion_group!(benches, benchmark_running_stat, benchmark_pipeline);
criterion_main!(benches);
