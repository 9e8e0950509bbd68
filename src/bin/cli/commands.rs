//! Command Execution Logic
//!
//! Each subcommand is one function returning `anyhow::Result`. Library errors
//! propagate through `?`; user-facing failures print a message and exit 1.

use owo_colors::OwoColorize;
use tracing::{info, warn};

use discrim_rs::core::config::DiscrimConfig;
use discrim_rs::core::extractor::DelimitedExtractor;
use discrim_rs::io::input::{discover_input_files, load_shards};
use discrim_rs::io::output::{prepare_output_dir, write_results};
use discrim_rs::pipeline::AggregationPipeline;

use crate::cli::args::*;
use crate::cli::config_layer::{build_layered_config, load_configuration};
use crate::cli::output::*;

/// Main run command implementation
pub fn run_command(args: RunArgs, quiet: bool) -> anyhow::Result<()> {
    let config = build_layered_config(&args)?;

    let files = discover_input_files(&args.inputs)?;
    if !quiet {
        print_header(files.len(), &args.out);
    }
    prepare_output_dir(&args.out, args.force)?;

    let loaded = load_shards(
        &files,
        config.aggregation.shard_size,
        config.extraction.skip_header,
    )?;
    info!(
        files = files.len(),
        shards = loaded.shards.len(),
        rejected = loaded.records_rejected,
        "Loaded input"
    );

    let extractor = DelimitedExtractor::from_config(&config.extraction)?;
    let pipeline = AggregationPipeline::new(extractor, config.aggregation.clone())?;
    let mut results = pipeline.run(&loaded.shards)?;
    results.statistics.records_rejected = loaded.records_rejected;

    let summary = write_results(
        &results,
        &config.output,
        &config.extraction.unconditioned_marker,
        &args.out,
    )?;

    if !quiet {
        display_discriminants(&summary);
        display_failures(&summary);
        display_completion_summary(&summary, &args.out);
    }

    if !summary.failures.is_empty() {
        warn!(
            failed = summary.failures.len(),
            "Some features did not produce a discriminant"
        );
        if args.strict {
            eprintln!(
                "{} {} feature(s) failed to finalize",
                "❌ Strict mode:".red(),
                summary.failures.len()
            );
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Print default configuration
pub fn print_default_config() -> anyhow::Result<()> {
    println!("{}", "# Default discrim configuration".dimmed());
    println!("{}", "# Save this to a file and customize as needed".dimmed());
    println!(
        "{}",
        "# Usage: discrim run <inputs> --out <dir> --config your-config.yml".dimmed()
    );
    println!();

    let config = DiscrimConfig::default();
    let yaml_output = serde_yaml::to_string(&config)?;
    println!("{}", yaml_output);

    Ok(())
}

/// Initialize a configuration file with defaults
pub fn init_config(args: InitConfigArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        eprintln!(
            "{} {}",
            "❌ Configuration file already exists:".red(),
            args.output.display()
        );
        eprintln!("   Use --force to overwrite or choose a different name with --output");
        std::process::exit(1);
    }

    DiscrimConfig::default().to_yaml_file(&args.output)?;

    println!(
        "{} {}",
        "✅ Configuration saved to:".bright_green().bold(),
        args.output.display().to_string().cyan()
    );
    println!();
    println!("{}", "📝 Next steps:".bright_blue().bold());
    println!("   1. Set extraction.feature_ordinals and extraction.class_ordinal for your data");
    println!(
        "   2. Run with: {}",
        format!(
            "discrim run <inputs> --out <dir> --config {}",
            args.output.display()
        )
        .cyan()
    );

    Ok(())
}

/// Validate a configuration file
pub fn validate_config(args: ValidateConfigArgs) -> anyhow::Result<()> {
    println!(
        "{} {}",
        "🔍 Validating configuration:".bright_blue().bold(),
        args.config.display().to_string().cyan()
    );
    println!();

    let config = match load_configuration(Some(args.config.as_path())) {
        Ok(config) => {
            println!("{}", "✅ Configuration file is valid!".bright_green().bold());
            println!();
            config
        }
        Err(e) => {
            eprintln!("{} {}", "❌ Configuration validation failed:".red(), e);
            println!();
            println!("{}", "🔧 Common issues:".bright_blue().bold());
            println!("   • Check YAML syntax (indentation, colons, quotes)");
            println!("   • The class ordinal must not also be a feature ordinal");
            println!("   • Sizes such as num_reducers and shard_size must be positive");
            println!();
            println!(
                "{}",
                "💡 Tip: Use 'discrim print-default-config' to see valid format".dimmed()
            );
            std::process::exit(1);
        }
    };

    if args.detailed {
        display_config_summary(&config);
    } else {
        println!(
            "   features: {:?}  class ordinal: {}  reducers: {}",
            config.extraction.feature_ordinals,
            config.extraction.class_ordinal,
            config.aggregation.num_reducers
        );
    }

    Ok(())
}
