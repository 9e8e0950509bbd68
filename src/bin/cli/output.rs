//! Console Output and Display Functions
//!
//! Tables and messages printed after a run. Machine-readable results live in
//! the output directory; everything here is for humans.

use std::path::Path;

use owo_colors::OwoColorize;
use tabled::{settings::Style as TableStyle, Table, Tabled};

use discrim_rs::core::config::DiscrimConfig;
use discrim_rs::io::output::RunSummary;

/// Print the run header
pub fn print_header(inputs: usize, out_path: &Path) {
    println!("{}", "📐 Discrim - Fisher discriminant run".bright_blue().bold());
    println!(
        "   {} input file(s) → {}",
        inputs,
        out_path.display().to_string().cyan()
    );
    println!();
}

/// Table of computed discriminants
pub fn display_discriminants(summary: &RunSummary) {
    #[derive(Tabled)]
    struct DiscriminantRow {
        #[tabled(rename = "Feature")]
        feature: String,
        #[tabled(rename = "Classes")]
        classes: String,
        #[tabled(rename = "Log-odds prior")]
        log_odds: String,
        #[tabled(rename = "Pooled variance")]
        pooled: String,
        #[tabled(rename = "Threshold")]
        threshold: String,
    }

    if summary.discriminants.is_empty() {
        println!("{}", "No feature produced a discriminant.".yellow());
        return;
    }

    let rows: Vec<DiscriminantRow> = summary
        .discriminants
        .iter()
        .map(|d| DiscriminantRow {
            feature: d.feature.to_string(),
            classes: format!("{} / {}", d.classes[0], d.classes[1]),
            log_odds: format!("{:.6}", d.log_odds_prior),
            pooled: format!("{:.6}", d.pooled_variance),
            threshold: format!("{:.6}", d.threshold),
        })
        .collect();

    println!("{}", "📊 Discriminants".bright_blue().bold());
    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{}", table);
    println!();
}

/// Table of features that failed to finalize
pub fn display_failures(summary: &RunSummary) {
    #[derive(Tabled)]
    struct FailureRow {
        #[tabled(rename = "Feature")]
        feature: String,
        #[tabled(rename = "Task")]
        task: usize,
        #[tabled(rename = "Kind")]
        kind: String,
        #[tabled(rename = "Reason")]
        reason: String,
    }

    if summary.failures.is_empty() {
        return;
    }

    let rows: Vec<FailureRow> = summary
        .failures
        .iter()
        .map(|f| FailureRow {
            feature: f.feature.to_string(),
            task: f.reduce_task,
            kind: f.kind.clone(),
            reason: f.message.clone(),
        })
        .collect();

    println!("{}", "⚠️  Features without a discriminant".yellow().bold());
    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{}", table);
    println!();
}

/// Run counters and where the results went
pub fn display_completion_summary(summary: &RunSummary, out_path: &Path) {
    let stats = &summary.statistics;
    println!("{}", "✅ Run Complete!".bright_green().bold());
    println!(
        "   records: {}  rejected records: {}  rejected values: {}",
        stats.records_read, stats.records_rejected, stats.values_rejected
    );
    println!(
        "   shards: {}  reduce tasks: {}",
        stats.map_shards, stats.reduce_tasks
    );
    println!(
        "   features finalized: {}  failed: {}  elapsed: {} ms",
        stats.features_finalized, stats.features_failed, stats.elapsed_ms
    );
    println!(
        "{} {}",
        "📁 Results saved to:".bold(),
        out_path.display().to_string().cyan()
    );
    println!("   run id: {}", summary.run_id.to_string().dimmed());
}

/// Settings table shown by `validate-config`
pub fn display_config_summary(config: &DiscrimConfig) {
    #[derive(Tabled)]
    struct ConfigRow {
        #[tabled(rename = "Setting")]
        setting: String,
        #[tabled(rename = "Value")]
        value: String,
    }

    let ordinals = config
        .extraction
        .feature_ordinals
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");

    let rows = vec![
        ConfigRow {
            setting: "extraction.feature_ordinals".to_string(),
            value: ordinals,
        },
        ConfigRow {
            setting: "extraction.class_ordinal".to_string(),
            value: config.extraction.class_ordinal.to_string(),
        },
        ConfigRow {
            setting: "extraction.field_delimiter".to_string(),
            value: format!("{:?}", config.extraction.field_delimiter),
        },
        ConfigRow {
            setting: "extraction.unconditioned_marker".to_string(),
            value: config.extraction.unconditioned_marker.clone(),
        },
        ConfigRow {
            setting: "aggregation.num_reducers".to_string(),
            value: config.aggregation.num_reducers.to_string(),
        },
        ConfigRow {
            setting: "aggregation.num_workers".to_string(),
            value: config
                .aggregation
                .num_workers
                .map_or_else(|| "auto".to_string(), |n| n.to_string()),
        },
        ConfigRow {
            setting: "aggregation.shard_size".to_string(),
            value: config.aggregation.shard_size.to_string(),
        },
        ConfigRow {
            setting: "aggregation.enable_combiner".to_string(),
            value: config.aggregation.enable_combiner.to_string(),
        },
        ConfigRow {
            setting: "output.field_delimiter".to_string(),
            value: format!("{:?}", config.output.field_delimiter),
        },
    ];

    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{}", table);
}
