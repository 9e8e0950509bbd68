//! # Discrim-RS: Fisher Discriminants over a Map/Combine/Reduce Pipeline
//!
//! Computes a univariate Fisher linear discriminant for every selected numeric
//! feature of a two-class dataset. The work is split the way a batch
//! map/reduce job splits it:
//!
//! - **Map**: shards of records are turned into `(group, value)` observations
//!   and absorbed into running statistics
//! - **Combine**: statistics of the same group are merged before leaving a shard
//! - **Reduce**: partials are routed by feature id, merged, then finalized once
//!   per feature into group statistics and a discriminant
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   Extractor  │ → │  ShardMapper │ → │   Shuffle    │ → │  ReduceTask  │
//! │ record→pairs │   │ absorb/merge │   │ by featureId │   │ accumulate + │
//! │              │   │  per shard   │   │   (xxh3)     │   │   finalize   │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use discrim_rs::core::config::AggregationConfig;
//! use discrim_rs::core::extractor::DelimitedExtractor;
//! use discrim_rs::core::keys::FeatureId;
//! use discrim_rs::pipeline::AggregationPipeline;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let extractor = DelimitedExtractor::new(",", vec![FeatureId(0)], 1);
//!     let pipeline = AggregationPipeline::new(extractor, AggregationConfig::default())?;
//!     let results = pipeline.run_records(&["1.0,a", "2.0,b", "1.5,a"])?;
//!
//!     for (feature, discriminant) in results.discriminants() {
//!         println!("feature {feature}: threshold {}", discriminant.result.threshold);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Memory allocator selection (mutually exclusive)
#[cfg(all(feature = "mimalloc", not(feature = "jemalloc")))]
#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[cfg(all(feature = "jemalloc", not(feature = "mimalloc")))]
#[global_allocator]
static ALLOC: jemallocator::Jemalloc = jemallocator::Jemalloc;

// Statistics, keys and configuration
pub mod core {
    //! Core statistics, keys and discriminant arithmetic.

    pub mod config;
    pub mod discriminant;
    pub mod errors;
    pub mod extractor;
    pub mod keys;
    pub mod stats;
}

// Map/combine/reduce runtime
pub mod pipeline;

// Input discovery and result persistence
pub mod io {
    //! Input sharding and job output files.

    pub mod input;
    pub mod output;
}

// Re-export primary types for convenience
pub use core::config::DiscrimConfig;
pub use core::errors::{DiscrimError, Result, ResultExt};
pub use pipeline::{AggregationPipeline, AggregationResults};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build-time feature detection
pub mod features {
    //! Runtime feature detection.

    /// Check if parallel processing is enabled
    pub const fn has_parallel() -> bool {
        cfg!(feature = "parallel")
    }

    /// Check if the mimalloc allocator is in use
    pub const fn has_mimalloc() -> bool {
        cfg!(all(feature = "mimalloc", not(feature = "jemalloc")))
    }
}
