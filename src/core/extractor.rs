//! Record extraction: turning one raw record into (group, value) observations.
//!
//! Extraction failures are local to a single feature value. A record whose
//! value for one feature cannot be parsed still contributes its other
//! features, and the rejection is reported back to the caller so it can be
//! counted instead of aborting the run.

use smallvec::SmallVec;

use crate::core::config::ExtractionConfig;
use crate::core::errors::{DiscrimError, Result};
use crate::core::keys::{ConditionValue, FeatureId, GroupKey};

/// Observations and rejections produced from one record
#[derive(Debug, Default)]
pub struct Extraction {
    /// Observations to absorb, in emission order
    pub pairs: SmallVec<[(GroupKey, f64); 4]>,
    /// Values that were skipped
    pub rejected: SmallVec<[DiscrimError; 1]>,
}

impl Extraction {
    /// Record one observation
    pub fn emit(&mut self, key: GroupKey, value: f64) {
        self.pairs.push((key, value));
    }

    /// Record one skipped value
    pub fn reject(&mut self, error: DiscrimError) {
        self.rejected.push(error);
    }

    /// Whether the record produced nothing at all
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty() && self.rejected.is_empty()
    }
}

/// Maps one raw record to zero or more observations.
///
/// Implementations must be pure with respect to the record so that map
/// workers can share one extractor.
pub trait Extractor: Send + Sync {
    /// Raw record type consumed by this extractor
    type Record: ?Sized;

    /// Features this extractor produces observations for
    fn features(&self) -> &[FeatureId];

    /// Extract all observations from one record
    fn extract(&self, record: &Self::Record) -> Extraction;
}

/// Extractor for delimited text records addressed by field ordinal
#[derive(Debug, Clone)]
pub struct DelimitedExtractor {
    delimiter: String,
    features: Vec<FeatureId>,
    class_ordinal: usize,
}

impl DelimitedExtractor {
    /// Create an extractor reading `features` and the class label at `class_ordinal`
    pub fn new(
        delimiter: impl Into<String>,
        features: Vec<FeatureId>,
        class_ordinal: usize,
    ) -> Self {
        Self {
            delimiter: delimiter.into(),
            features,
            class_ordinal,
        }
    }

    /// Create an extractor from validated extraction settings
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            config.field_delimiter.clone(),
            config.features(),
            config.class_ordinal,
        ))
    }

    fn parse_value(field: usize, raw: Option<&str>) -> Result<f64> {
        let raw = raw.ok_or_else(|| {
            DiscrimError::invalid_field(format!("record has no field {field}"), field, "")
        })?;
        if raw.is_empty() {
            return Err(DiscrimError::invalid_field("missing value", field, raw));
        }

        let value: f64 = raw.parse().map_err(|_| {
            DiscrimError::invalid_field(format!("'{raw}' is not numeric"), field, raw)
        })?;
        if !value.is_finite() {
            return Err(DiscrimError::invalid_field(
                format!("'{raw}' is not a finite number"),
                field,
                raw,
            ));
        }
        Ok(value)
    }
}

impl Extractor for DelimitedExtractor {
    type Record = str;

    fn features(&self) -> &[FeatureId] {
        &self.features
    }

    fn extract(&self, record: &str) -> Extraction {
        let fields: SmallVec<[&str; 16]> = record
            .split(self.delimiter.as_str())
            .map(str::trim)
            .collect();

        let class = fields
            .get(self.class_ordinal)
            .filter(|label| !label.is_empty())
            .map(|label| ConditionValue::class(*label));

        let mut extraction = Extraction::default();
        for &feature in &self.features {
            let ordinal = feature.ordinal();
            match Self::parse_value(ordinal, fields.get(ordinal).copied()) {
                Ok(value) => {
                    extraction.emit(GroupKey::unconditioned(feature), value);
                    if let Some(class) = &class {
                        extraction.emit(GroupKey::new(feature, class.clone()), value);
                    }
                }
                Err(err) => extraction.reject(err),
            }
        }
        extraction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> DelimitedExtractor {
        DelimitedExtractor::new(",", vec![FeatureId(1), FeatureId(2)], 3)
    }

    #[test]
    fn test_labeled_record_emits_both_groups_per_feature() {
        let extraction = extractor().extract("id-1, 4.5, 10, yes");

        assert!(extraction.rejected.is_empty());
        let pairs: Vec<_> = extraction.pairs.into_iter().collect();
        assert_eq!(
            pairs,
            vec![
                (GroupKey::unconditioned(FeatureId(1)), 4.5),
                (GroupKey::conditioned(FeatureId(1), "yes"), 4.5),
                (GroupKey::unconditioned(FeatureId(2)), 10.0),
                (GroupKey::conditioned(FeatureId(2), "yes"), 10.0),
            ]
        );
    }

    #[test]
    fn test_unlabeled_record_emits_only_unconditioned() {
        let extraction = extractor().extract("id-2,1.0,2.0,");
        assert_eq!(extraction.pairs.len(), 2);
        assert!(extraction
            .pairs
            .iter()
            .all(|(key, _)| key.condition().is_unconditioned()));

        let short = extractor().extract("id-3,1.0,2.0");
        assert_eq!(short.pairs.len(), 2);
    }

    #[test]
    fn test_bad_value_only_skips_that_feature() {
        let extraction = extractor().extract("id-4,abc,7,no");

        assert_eq!(extraction.rejected.len(), 1);
        assert!(matches!(
            extraction.rejected[0],
            DiscrimError::InvalidInput {
                field: Some(1),
                ..
            }
        ));
        assert_eq!(extraction.pairs.len(), 2);
        assert!(extraction
            .pairs
            .iter()
            .all(|(key, _)| key.feature() == FeatureId(2)));
    }

    #[test]
    fn test_missing_and_non_finite_values_are_rejected() {
        let extraction = extractor().extract("id-5,,NaN,no");
        assert!(extraction.pairs.is_empty());
        assert_eq!(extraction.rejected.len(), 2);

        let extraction = extractor().extract("id-6");
        assert_eq!(extraction.rejected.len(), 2);
    }

    #[test]
    fn test_custom_delimiter_from_config() {
        let config = ExtractionConfig {
            field_delimiter: "|".to_string(),
            feature_ordinals: vec![0],
            class_ordinal: 1,
            ..ExtractionConfig::default()
        };
        let extractor = DelimitedExtractor::from_config(&config).unwrap();
        let extraction = extractor.extract("3.25|b");

        assert_eq!(extractor.features(), &[FeatureId(0)]);
        assert_eq!(extraction.pairs[1].0, GroupKey::conditioned(FeatureId(0), "b"));
        assert_eq!(extraction.pairs[1].1, 3.25);
    }
}
