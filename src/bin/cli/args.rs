//! CLI Argument Structures
//!
//! All argument definitions and command structures used by the discrim binary.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fisher discriminants over a parallel map/combine/reduce pipeline
#[derive(Parser)]
#[command(name = "discrim")]
#[command(version = VERSION)]
#[command(about = "Discrim - univariate Fisher discriminants for two-class data")]
#[command(long_about = "
Aggregate per-class statistics of numeric features and compute a Fisher linear
discriminant threshold for every feature.

Common Usage:

  # Feature in column 0, class label in column 1
  discrim run data/ --out results/

  # Several features, tab separated input with a header row
  discrim run data.tsv --out results/ --features 1,2,3 --class-ordinal 0 \\
      --delimiter '\\t' --skip-header

  # Start from a config file
  discrim init-config
  discrim run data/ --out results/ --config .discrim.yml
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and skip the result tables
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Aggregate statistics and compute discriminants
    Run(Box<RunArgs>),

    /// Print default configuration in YAML format
    #[command(name = "print-default-config")]
    PrintDefaultConfig,

    /// Initialize a configuration file with defaults
    #[command(name = "init-config")]
    InitConfig(InitConfigArgs),

    /// Validate a discrim configuration file
    #[command(name = "validate-config")]
    ValidateConfig(ValidateConfigArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Input files or directories
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output directory for part files and the run summary
    #[arg(short, long)]
    pub out: PathBuf,

    /// Configuration file (defaults to .discrim.yml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Comma separated ordinals of the feature fields
    #[arg(long, value_delimiter = ',')]
    pub features: Option<Vec<usize>>,

    /// Ordinal of the class label field
    #[arg(long)]
    pub class_ordinal: Option<usize>,

    /// Number of reduce tasks
    #[arg(long)]
    pub reducers: Option<usize>,

    /// Number of worker threads
    #[arg(long)]
    pub workers: Option<usize>,

    /// Records per map shard
    #[arg(long)]
    pub shard_size: Option<usize>,

    /// Input field delimiter ('\t' for tab)
    #[arg(long)]
    pub delimiter: Option<String>,

    /// Output field delimiter ('\t' for tab)
    #[arg(long)]
    pub out_delimiter: Option<String>,

    /// Literal written as the condition of unconditioned groups
    #[arg(long)]
    pub unconditioned_marker: Option<String>,

    /// Drop the first line of every input file
    #[arg(long)]
    pub skip_header: bool,

    /// Ship every observation to the reducers without map-side combining
    #[arg(long)]
    pub no_combiner: bool,

    /// Remove earlier job output from the output directory
    #[arg(short, long)]
    pub force: bool,

    /// Exit with code 1 if any feature fails to produce a discriminant
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args)]
pub struct InitConfigArgs {
    /// Output configuration file name
    #[arg(short, long, default_value = ".discrim.yml")]
    pub output: PathBuf,

    /// Overwrite existing configuration file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ValidateConfigArgs {
    /// Path to configuration file to validate
    #[arg(short, long, required = true)]
    pub config: PathBuf,

    /// Show detailed configuration breakdown
    #[arg(long)]
    pub detailed: bool,
}
