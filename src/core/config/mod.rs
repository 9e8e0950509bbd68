//! Configuration types and management for discrim-rs.
//!
//! The configuration is split by pipeline concern: how records are turned
//! into observations, how the map/combine/reduce runtime is sized, and how
//! results are written. All sections are plain serde structs loaded from YAML.

pub mod validation;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::errors::{DiscrimError, Result};
use crate::core::keys::FeatureId;

pub use validation::{validate_non_empty, validate_positive_usize, validate_unique_ordinals};

/// Main configuration for a discriminant run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiscrimConfig {
    /// Record parsing and field selection
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Map/combine/reduce runtime sizing
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Result formatting and persistence
    #[serde(default)]
    pub output: OutputConfig,
}

/// Configuration construction and I/O methods for [`DiscrimConfig`].
impl DiscrimConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            DiscrimError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        serde_yaml::from_str(&content).map_err(Into::into)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content).map_err(|e| {
            DiscrimError::io(
                format!("Failed to write config file: {}", path.display()),
                e,
            )
        })
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        self.extraction.validate()?;
        self.aggregation.validate()?;
        self.output.validate()?;
        Ok(())
    }
}

/// How raw delimited records become (group, value) observations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionConfig {
    /// Delimiter separating fields of an input record
    #[serde(default = "ExtractionConfig::default_field_delimiter")]
    pub field_delimiter: String,

    /// Ordinals of the numeric fields to analyze; each ordinal is one feature
    #[serde(default = "ExtractionConfig::default_feature_ordinals")]
    pub feature_ordinals: Vec<usize>,

    /// Ordinal of the binary class label field
    #[serde(default = "ExtractionConfig::default_class_ordinal")]
    pub class_ordinal: usize,

    /// Literal written for the unconditioned group
    #[serde(default = "ExtractionConfig::default_unconditioned_marker")]
    pub unconditioned_marker: String,

    /// Drop the first line of every input file
    #[serde(default)]
    pub skip_header: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            field_delimiter: Self::default_field_delimiter(),
            feature_ordinals: Self::default_feature_ordinals(),
            class_ordinal: Self::default_class_ordinal(),
            unconditioned_marker: Self::default_unconditioned_marker(),
            skip_header: false,
        }
    }
}

impl ExtractionConfig {
    fn default_field_delimiter() -> String {
        ",".to_string()
    }

    fn default_feature_ordinals() -> Vec<usize> {
        vec![0]
    }

    const fn default_class_ordinal() -> usize {
        1
    }

    fn default_unconditioned_marker() -> String {
        "0".to_string()
    }

    /// Features selected by this configuration, in configured order
    pub fn features(&self) -> Vec<FeatureId> {
        self.feature_ordinals.iter().copied().map(FeatureId).collect()
    }

    /// Validate extraction settings
    pub fn validate(&self) -> Result<()> {
        validate_non_empty(&self.field_delimiter, "extraction.field_delimiter")?;
        validate_non_empty(&self.unconditioned_marker, "extraction.unconditioned_marker")?;
        validate_unique_ordinals(&self.feature_ordinals, "extraction.feature_ordinals")?;

        if self.feature_ordinals.contains(&self.class_ordinal) {
            return Err(DiscrimError::config_field(
                format!(
                    "class ordinal {} is also listed as a feature ordinal",
                    self.class_ordinal
                ),
                "extraction.class_ordinal",
            ));
        }
        Ok(())
    }
}

/// Sizing of the in-process map/combine/reduce runtime
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregationConfig {
    /// Number of map worker threads (None = one per core)
    #[serde(default)]
    pub num_workers: Option<usize>,

    /// Records per map shard
    #[serde(default = "AggregationConfig::default_shard_size")]
    pub shard_size: usize,

    /// Number of reduce tasks; features are routed to tasks by feature id
    #[serde(default = "AggregationConfig::default_num_reducers")]
    pub num_reducers: usize,

    /// Merge partial stats on the map side before the shuffle
    #[serde(default = "AggregationConfig::default_enable_combiner")]
    pub enable_combiner: bool,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            num_workers: None,
            shard_size: Self::default_shard_size(),
            num_reducers: Self::default_num_reducers(),
            enable_combiner: Self::default_enable_combiner(),
        }
    }
}

impl AggregationConfig {
    const fn default_shard_size() -> usize {
        10_000
    }

    const fn default_num_reducers() -> usize {
        1
    }

    const fn default_enable_combiner() -> bool {
        true
    }

    /// Validate aggregation settings
    pub fn validate(&self) -> Result<()> {
        validate_positive_usize(self.shard_size, "aggregation.shard_size")?;
        validate_positive_usize(self.num_reducers, "aggregation.num_reducers")?;
        if let Some(workers) = self.num_workers {
            validate_positive_usize(workers, "aggregation.num_workers")?;
        }
        Ok(())
    }
}

/// Result formatting and persistence settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// Delimiter separating fields of an output line
    #[serde(default = "OutputConfig::default_field_delimiter")]
    pub field_delimiter: String,

    /// Write `_SUMMARY.json` next to the part files
    #[serde(default = "OutputConfig::default_write_summary")]
    pub write_summary: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            field_delimiter: Self::default_field_delimiter(),
            write_summary: Self::default_write_summary(),
        }
    }
}

impl OutputConfig {
    fn default_field_delimiter() -> String {
        ",".to_string()
    }

    const fn default_write_summary() -> bool {
        true
    }

    /// Validate output settings
    pub fn validate(&self) -> Result<()> {
        validate_non_empty(&self.field_delimiter, "output.field_delimiter")
    }
}

#[cfg(test)]
mod tests;
