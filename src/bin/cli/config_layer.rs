//! Configuration Layer Management
//!
//! Layers are applied in order: defaults, then a config file (explicit
//! `--config` or an implicit `.discrim.yml`/`.discrim.yaml`), then CLI
//! overrides. The merged result is validated once at the end.

use std::path::{Path, PathBuf};

use discrim_rs::core::config::DiscrimConfig;

use crate::cli::args::RunArgs;

/// Convert CLI arguments into overrides on top of a loaded configuration
pub trait ApplyCliArgs<T> {
    /// Apply every override present in `args`
    fn apply_cli_args(&mut self, args: &T);
}

impl ApplyCliArgs<RunArgs> for DiscrimConfig {
    fn apply_cli_args(&mut self, args: &RunArgs) {
        if let Some(features) = &args.features {
            self.extraction.feature_ordinals = features.clone();
        }
        if let Some(ordinal) = args.class_ordinal {
            self.extraction.class_ordinal = ordinal;
        }
        if let Some(delimiter) = &args.delimiter {
            self.extraction.field_delimiter = unescape_delimiter(delimiter);
        }
        if let Some(marker) = &args.unconditioned_marker {
            self.extraction.unconditioned_marker = marker.clone();
        }
        if args.skip_header {
            self.extraction.skip_header = true;
        }

        if let Some(reducers) = args.reducers {
            self.aggregation.num_reducers = reducers;
        }
        if let Some(workers) = args.workers {
            self.aggregation.num_workers = Some(workers);
        }
        if let Some(shard_size) = args.shard_size {
            self.aggregation.shard_size = shard_size;
        }
        if args.no_combiner {
            self.aggregation.enable_combiner = false;
        }

        if let Some(delimiter) = &args.out_delimiter {
            self.output.field_delimiter = unescape_delimiter(delimiter);
        }
    }
}

/// Translate shell-friendly escapes such as `\t` into the delimiter itself
pub fn unescape_delimiter(raw: &str) -> String {
    match raw {
        "\\t" | "tab" => "\t".to_string(),
        "\\n" => "\n".to_string(),
        "\\s" | "space" => " ".to_string(),
        other => other.to_string(),
    }
}

/// Config file named on the command line, or the first implicit one that exists
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => [".discrim.yml", ".discrim.yaml"]
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists()),
    }
}

/// Load and validate a configuration file, or the defaults when no path is given
pub fn load_configuration(path: Option<&Path>) -> anyhow::Result<DiscrimConfig> {
    let config = match path {
        Some(path) => DiscrimConfig::from_yaml_file(path).map_err(|e| {
            anyhow::anyhow!("Failed to load configuration from {}: {}", path.display(), e)
        })?,
        None => DiscrimConfig::default(),
    };

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;
    Ok(config)
}

/// Build the effective configuration of a run
pub fn build_layered_config(args: &RunArgs) -> anyhow::Result<DiscrimConfig> {
    let mut config = match resolve_config_path(args.config.as_deref()) {
        Some(path) => DiscrimConfig::from_yaml_file(&path).map_err(|e| {
            anyhow::anyhow!("Failed to load configuration from {}: {}", path.display(), e)
        })?,
        None => DiscrimConfig::default(),
    };

    config.apply_cli_args(args);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;

    Ok(config)
}
