//! Group identification for the aggregation pipeline.
//!
//! A [`GroupKey`] pairs a feature with a conditioning value. Every feature
//! owns one unconditioned group (all observations) and one group per class
//! label. Routing between workers only ever looks at the [`FeatureId`] half
//! of the key.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an analyzed feature (the field ordinal it is read from)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(pub usize);

impl FeatureId {
    /// Field ordinal backing this feature
    pub fn ordinal(self) -> usize {
        self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for FeatureId {
    fn from(ordinal: usize) -> Self {
        Self(ordinal)
    }
}

/// Conditioning value of a group
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionValue {
    /// Statistics across all classes
    Unconditioned,
    /// Statistics restricted to one class label
    Class(String),
}

impl ConditionValue {
    /// Conditioning value for a class label
    pub fn class(label: impl Into<String>) -> Self {
        Self::Class(label.into())
    }

    /// Whether this is the unconditioned marker
    pub fn is_unconditioned(&self) -> bool {
        matches!(self, Self::Unconditioned)
    }

    /// Class label, if this is a class-conditioned value
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Unconditioned => None,
            Self::Class(label) => Some(label.as_str()),
        }
    }

    /// Text written to output, substituting `marker` for the unconditioned value
    pub fn render<'a>(&'a self, marker: &'a str) -> &'a str {
        match self {
            Self::Unconditioned => marker,
            Self::Class(label) => label.as_str(),
        }
    }
}

/// (feature, conditioning value) pair identifying one accumulated group
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey {
    feature: FeatureId,
    condition: ConditionValue,
}

impl GroupKey {
    /// Create a key
    pub fn new(feature: FeatureId, condition: ConditionValue) -> Self {
        Self {
            feature,
            condition,
        }
    }

    /// Key of the unconditioned group of a feature
    pub fn unconditioned(feature: FeatureId) -> Self {
        Self::new(feature, ConditionValue::Unconditioned)
    }

    /// Key of a class-conditioned group of a feature
    pub fn conditioned(feature: FeatureId, label: impl Into<String>) -> Self {
        Self::new(feature, ConditionValue::class(label))
    }

    /// Feature half of the key, used for partitioning
    pub fn feature(&self) -> FeatureId {
        self.feature
    }

    /// Conditioning half of the key
    pub fn condition(&self) -> &ConditionValue {
        &self.condition
    }
}
