//! Result formatting and the on-disk job output layout.
//!
//! Each reduce task writes one `part-r-NNNNN` file: a line per accumulated
//! group followed by one discriminant line per successfully finalized
//! feature. `_SUMMARY.json` records the run counters and every per-feature
//! failure.
//!
//! Discriminant lines carry four fields, `featureId` first, followed by
//! `logOddsPrior, pooledVariance, threshold`. A reduce task usually owns
//! several features, so the leading id is what ties a line to its feature.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::config::OutputConfig;
use crate::core::errors::{DiscrimError, Result};
use crate::core::keys::FeatureId;
use crate::pipeline::results::{
    AggregationResults, FeatureDiscriminant, GroupStatRecord, PipelineStatistics, ReduceTaskOutput,
};

/// Name of the run summary file
pub const SUMMARY_FILE: &str = "_SUMMARY.json";

const PART_PREFIX: &str = "part-r-";

/// Part file name of a reduce task
pub fn part_file_name(task: usize) -> String {
    format!("{PART_PREFIX}{task:05}")
}

/// `featureId, condition, count, mean, variance, stdDev, min, max`
pub fn format_group_line(record: &GroupStatRecord, delimiter: &str, marker: &str) -> String {
    [
        record.key.feature().to_string(),
        record.key.condition().render(marker).to_string(),
        record.count.to_string(),
        record.mean.to_string(),
        record.variance.to_string(),
        record.std_dev.to_string(),
        record.min.to_string(),
        record.max.to_string(),
    ]
    .join(delimiter)
}

/// `featureId, logOddsPrior, pooledVariance, threshold`
///
/// The feature id leads so that lines of different features in one part file
/// stay distinguishable.
pub fn format_discriminant_line(
    feature: FeatureId,
    discriminant: &FeatureDiscriminant,
    delimiter: &str,
) -> String {
    let result = &discriminant.result;
    [
        feature.to_string(),
        result.log_odds_prior.to_string(),
        result.pooled_variance.to_string(),
        result.threshold.to_string(),
    ]
    .join(delimiter)
}

/// Render the lines of one reduce task: group lines first, then discriminants
pub fn render_task(task: &ReduceTaskOutput, delimiter: &str, marker: &str) -> Vec<String> {
    let groups = task
        .reports
        .iter()
        .flat_map(|report| report.groups.iter())
        .map(|record| format_group_line(record, delimiter, marker));

    let discriminants = task.reports.iter().filter_map(|report| {
        report
            .discriminant()
            .map(|d| format_discriminant_line(report.feature, d, delimiter))
    });

    groups.chain(discriminants).collect()
}

/// Discriminant of one feature as recorded in the summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscriminantSummary {
    /// Feature
    pub feature: FeatureId,
    /// Class labels in order of first appearance
    pub classes: [String; 2],
    /// ln(count0 / count1)
    pub log_odds_prior: f64,
    /// Pooled class variance
    pub pooled_variance: f64,
    /// Decision threshold
    pub threshold: f64,
}

/// A failed feature as recorded in the summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureSummary {
    /// Feature
    pub feature: FeatureId,
    /// Reduce task that owned the feature
    pub reduce_task: usize,
    /// Error variant name
    pub kind: String,
    /// Error message
    pub message: String,
}

/// Contents of `_SUMMARY.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique id of the run
    pub run_id: Uuid,
    /// When the results were written
    pub timestamp: DateTime<Utc>,
    /// Run counters
    pub statistics: PipelineStatistics,
    /// Successfully computed discriminants
    pub discriminants: Vec<DiscriminantSummary>,
    /// Features without a discriminant
    pub failures: Vec<FailureSummary>,
    /// Part files written, relative to the output directory
    pub part_files: Vec<String>,
}

impl RunSummary {
    /// Summarize aggregation results
    pub fn from_results(results: &AggregationResults, part_files: Vec<String>) -> Self {
        let discriminants = results
            .discriminants()
            .map(|(feature, d)| DiscriminantSummary {
                feature,
                classes: [
                    d.classes[0].condition().to_string(),
                    d.classes[1].condition().to_string(),
                ],
                log_odds_prior: d.result.log_odds_prior,
                pooled_variance: d.result.pooled_variance,
                threshold: d.result.threshold,
            })
            .collect();

        let failures = results
            .failures()
            .into_iter()
            .map(|failure| FailureSummary {
                feature: failure.feature,
                reduce_task: failure.reduce_task,
                kind: failure.error.kind().to_string(),
                message: failure.error.to_string(),
            })
            .collect();

        Self {
            run_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            statistics: results.statistics.clone(),
            discriminants,
            failures,
            part_files,
        }
    }

    /// Load a summary written by [`write_results`]
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DiscrimError::io(format!("Failed to read summary: {}", path.display()), e)
        })?;
        serde_json::from_str(&content).map_err(Into::into)
    }
}

fn is_job_output(name: &str) -> bool {
    name.starts_with(PART_PREFIX) || name == SUMMARY_FILE
}

/// Make sure `dir` exists and may receive job output.
///
/// A non-empty directory is refused unless `force` is set. Nothing is
/// removed here; earlier output is only replaced by [`write_results`].
pub fn prepare_output_dir(dir: &Path, force: bool) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(DiscrimError::validation_field(
            format!("output path is not a directory: {}", dir.display()),
            "out",
        ));
    }
    if !dir.exists() {
        return fs::create_dir_all(dir).map_err(|e| {
            DiscrimError::io(format!("Failed to create {}", dir.display()), e)
        });
    }
    if force {
        return Ok(());
    }

    let mut entries = fs::read_dir(dir)
        .map_err(|e| DiscrimError::io(format!("Failed to list {}", dir.display()), e))?;
    if entries.next().is_some() {
        return Err(DiscrimError::validation_field(
            format!(
                "output directory {} is not empty (use --force to overwrite)",
                dir.display()
            ),
            "out",
        ));
    }
    Ok(())
}

/// Remove part files and the summary of an earlier run; other files stay
pub fn remove_previous_output(dir: &Path) -> Result<usize> {
    let read_dir = fs::read_dir(dir)
        .map_err(|e| DiscrimError::io(format!("Failed to list {}", dir.display()), e))?;

    let mut removed = 0;
    for entry in read_dir {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_job_output(&name) {
            continue;
        }
        debug!(file = %name, "Removing previous job output");
        fs::remove_file(entry.path()).map_err(|e| {
            DiscrimError::io(format!("Failed to remove {}", entry.path().display()), e)
        })?;
        removed += 1;
    }
    Ok(removed)
}

/// Write part files and, when enabled, the run summary.
///
/// Part files and the summary left by an earlier run are removed first.
pub fn write_results(
    results: &AggregationResults,
    config: &OutputConfig,
    marker: &str,
    dir: &Path,
) -> Result<RunSummary> {
    let removed = remove_previous_output(dir)?;
    if removed > 0 {
        info!(dir = %dir.display(), removed, "Replacing previous job output");
    }

    let mut part_files = Vec::with_capacity(results.tasks.len());
    for task in &results.tasks {
        let name = part_file_name(task.task);
        let path = dir.join(&name);
        let lines = render_task(task, &config.field_delimiter, marker);
        write_lines(&path, &lines)?;
        debug!(file = %name, lines = lines.len(), "Wrote part file");
        part_files.push(name);
    }

    let summary = RunSummary::from_results(results, part_files);
    if config.write_summary {
        let path = dir.join(SUMMARY_FILE);
        let content = serde_json::to_string_pretty(&summary)?;
        fs::write(&path, content).map_err(|e| {
            DiscrimError::io(format!("Failed to write {}", path.display()), e)
        })?;
    }

    info!(
        dir = %dir.display(),
        parts = summary.part_files.len(),
        run_id = %summary.run_id,
        "Results written"
    );
    Ok(summary)
}

fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| DiscrimError::io(format!("Failed to create {}", path.display()), e))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AggregationConfig;
    use crate::core::extractor::DelimitedExtractor;
    use crate::core::keys::GroupKey;
    use crate::pipeline::AggregationPipeline;
    use tempfile::tempdir;

    fn results() -> AggregationResults {
        let extractor = DelimitedExtractor::new(",", vec![FeatureId(0), FeatureId(1)], 2);
        let config = AggregationConfig {
            num_reducers: 2,
            ..AggregationConfig::default()
        };
        let records = ["1,5,x", "3,5,y", "2,6,x", "4,6,y"];
        AggregationPipeline::new(extractor, config)
            .unwrap()
            .run_records(&records)
            .unwrap()
    }

    #[test]
    fn test_group_line_layout() {
        let record = GroupStatRecord {
            key: GroupKey::unconditioned(FeatureId(3)),
            count: 4,
            mean: 2.5,
            variance: 1.25,
            std_dev: 1.25_f64.sqrt(),
            min: 1.0,
            max: 4.0,
        };
        let line = format_group_line(&record, ",", "0");
        let fields: Vec<_> = line.split(',').collect();
        assert_eq!(fields.len(), 8);
        assert_eq!(&fields[..5], &["3", "0", "4", "2.5", "1.25"]);
        assert_eq!(&fields[6..], &["1", "4"]);

        let conditioned = GroupStatRecord {
            key: GroupKey::conditioned(FeatureId(3), "yes"),
            ..record
        };
        assert!(format_group_line(&conditioned, "\t", "ALL").starts_with("3\tyes\t4"));
    }

    #[test]
    fn test_discriminant_line_leads_with_feature() {
        let results = results();
        let (feature, discriminant) = results.discriminants().next().unwrap();

        let line = format_discriminant_line(feature, discriminant, "|");
        let fields: Vec<_> = line.split('|').collect();
        assert_eq!(fields, vec!["0", "0", "0.25", "2.5"]);
    }

    #[test]
    fn test_render_puts_discriminants_last() {
        let results = results();
        let lines: Vec<String> = results
            .tasks
            .iter()
            .flat_map(|task| render_task(task, ",", "0"))
            .collect();

        // 3 groups per feature, one discriminant for feature 0 only
        assert_eq!(lines.len(), 7);
        let discriminant_lines: Vec<_> = lines
            .iter()
            .filter(|line| line.split(',').count() == 4)
            .collect();
        assert_eq!(discriminant_lines, vec!["0,0,0.25,2.5"]);
    }

    #[test]
    fn test_write_results_layout() {
        let dir = tempdir().unwrap();
        let results = results();
        let summary = write_results(&results, &OutputConfig::default(), "0", dir.path()).unwrap();

        assert_eq!(summary.part_files, vec!["part-r-00000", "part-r-00001"]);
        for name in &summary.part_files {
            assert!(dir.path().join(name).is_file());
        }

        let loaded = RunSummary::from_json_file(&dir.path().join(SUMMARY_FILE)).unwrap();
        assert_eq!(loaded, summary);
        assert_eq!(loaded.discriminants.len(), 1);
        assert_eq!(loaded.discriminants[0].classes, ["x".to_string(), "y".to_string()]);
        assert_eq!(loaded.failures.len(), 1);
        assert_eq!(loaded.failures[0].feature, FeatureId(1));
        assert_eq!(loaded.failures[0].kind, "DegenerateDiscriminant");
    }

    #[test]
    fn test_summary_can_be_disabled() {
        let dir = tempdir().unwrap();
        let config = OutputConfig {
            write_summary: false,
            ..OutputConfig::default()
        };
        write_results(&results(), &config, "0", dir.path()).unwrap();
        assert!(!dir.path().join(SUMMARY_FILE).exists());
    }

    #[test]
    fn test_prepare_output_dir() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");

        prepare_output_dir(&out, false).unwrap();
        assert!(out.is_dir());

        fs::write(out.join("part-r-00000"), "old").unwrap();
        fs::write(out.join(SUMMARY_FILE), "{}").unwrap();
        fs::write(out.join("notes.txt"), "keep").unwrap();
        assert!(prepare_output_dir(&out, false).is_err());

        // Forcing only admits the directory; earlier output survives until results exist
        prepare_output_dir(&out, true).unwrap();
        assert!(out.join("part-r-00000").exists());
        assert!(out.join(SUMMARY_FILE).exists());
    }

    #[test]
    fn test_write_results_replaces_previous_output() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("part-r-00007"), "stale").unwrap();
        fs::write(dir.path().join(SUMMARY_FILE), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        let summary = write_results(&results(), &OutputConfig::default(), "0", dir.path()).unwrap();

        assert!(!dir.path().join("part-r-00007").exists());
        assert!(dir.path().join("notes.txt").exists());
        let loaded = RunSummary::from_json_file(&dir.path().join(SUMMARY_FILE)).unwrap();
        assert_eq!(loaded.run_id, summary.run_id);
    }

    #[test]
    fn test_output_path_must_be_a_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, "").unwrap();
        assert!(prepare_output_dir(&file, true).is_err());
    }
}
