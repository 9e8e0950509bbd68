//! Error types for the discrim-rs library.
//!
//! Domain failures (bad input values, degenerate class statistics, malformed
//! group sets) live next to the ambient failures of the surrounding tool
//! (I/O, configuration, serialization) so that every layer of the pipeline can
//! propagate a single error type.

use std::io;

use thiserror::Error;

/// Main result type for discrim operations.
pub type Result<T> = std::result::Result<T, DiscrimError>;

/// Error type for all discrim operations.
#[derive(Error, Debug)]
pub enum DiscrimError {
    /// A value could not be used as a numeric observation
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Human-readable error message
        message: String,
        /// Field ordinal the value came from (if known)
        field: Option<usize>,
        /// Offending raw value (if available)
        value: Option<String>,
    },

    /// A statistic was requested from a group without observations
    #[error("Insufficient data: {message}")]
    InsufficientData {
        /// Error description
        message: String,
        /// Additional context (group or feature)
        context: Option<String>,
    },

    /// A feature did not accumulate exactly two class-conditioned groups
    #[error("Malformed group set for feature {feature}: expected 2 class labels, observed {}", .observed.len())]
    MalformedGroupSet {
        /// Feature identifier
        feature: String,
        /// Class labels observed, in order of first appearance
        observed: Vec<String>,
    },

    /// The second class has no observations, so the prior odds are undefined
    #[error("Degenerate class '{condition}': class count is zero")]
    DegenerateClass {
        /// Conditioning value of the empty class
        condition: String,
        /// Additional context
        context: Option<String>,
    },

    /// Both classes share the same mean, so no threshold separates them
    #[error("Degenerate discriminant: both classes have mean {mean}")]
    DegenerateDiscriminant {
        /// The shared class mean
        mean: f64,
        /// Additional context
        context: Option<String>,
    },

    /// I/O related errors
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// Validation errors for configuration values and arguments
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
        /// Field or input that failed validation
        field: Option<String>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Data type being serialized
        data_type: Option<String>,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Aggregation pipeline errors
    #[error("Pipeline error at stage '{stage}': {message}")]
    Pipeline {
        /// Pipeline stage where error occurred
        stage: String,
        /// Error description
        message: String,
    },

    /// Worker pool errors
    #[error("Concurrency error: {message}")]
    Concurrency {
        /// Error description
        message: String,
    },

}

impl DiscrimError {
    /// Create a new invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
            value: None,
        }
    }

    /// Create a new invalid input error pointing at a record field
    pub fn invalid_field(
        message: impl Into<String>,
        field: usize,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field),
            value: Some(value.into()),
        }
    }

    /// Create a new insufficient data error
    pub fn insufficient_data(message: impl Into<String>) -> Self {
        Self::InsufficientData {
            message: message.into(),
            context: None,
        }
    }

    /// Create a new malformed group set error
    pub fn malformed_group_set(feature: impl Into<String>, observed: Vec<String>) -> Self {
        Self::MalformedGroupSet {
            feature: feature.into(),
            observed,
        }
    }

    /// Create a new degenerate class error
    pub fn degenerate_class(condition: impl Into<String>) -> Self {
        Self::DegenerateClass {
            condition: condition.into(),
            context: None,
        }
    }

    /// Create a new degenerate discriminant error
    pub fn degenerate_discriminant(mean: f64) -> Self {
        Self::DegenerateDiscriminant {
            mean,
            context: None,
        }
    }

    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new validation error with field context
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new pipeline error
    pub fn pipeline(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pipeline {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create a new concurrency error
    pub fn concurrency(message: impl Into<String>) -> Self {
        Self::Concurrency {
            message: message.into(),
        }
    }

    /// Short machine-readable name of the error variant
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "InvalidInput",
            Self::InsufficientData { .. } => "InsufficientData",
            Self::MalformedGroupSet { .. } => "MalformedGroupSet",
            Self::DegenerateClass { .. } => "DegenerateClass",
            Self::DegenerateDiscriminant { .. } => "DegenerateDiscriminant",
            Self::Io { .. } => "Io",
            Self::Config { .. } => "Config",
            Self::Validation { .. } => "Validation",
            Self::Serialization { .. } => "Serialization",
            Self::Pipeline { .. } => "Pipeline",
            Self::Concurrency { .. } => "Concurrency",
        }
    }

    /// Add context to an existing error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        match &mut self {
            Self::InsufficientData { context: ctx, .. }
            | Self::DegenerateClass { context: ctx, .. }
            | Self::DegenerateDiscriminant { context: ctx, .. } => {
                *ctx = Some(context.into());
            }
            _ => {} // Other variants carry their own location fields
        }
        self
    }
}

impl From<io::Error> for DiscrimError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for DiscrimError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            data_type: Some("JSON".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for DiscrimError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            data_type: Some("YAML".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

/// Result extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<DiscrimError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
