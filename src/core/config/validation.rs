//! Validation helper functions for configuration types.

use crate::core::errors::{DiscrimError, Result};

/// Validate that a usize value is greater than zero.
pub fn validate_positive_usize(value: usize, field: &str) -> Result<()> {
    if value == 0 {
        return Err(DiscrimError::validation_field(
            format!("{} must be greater than 0", field),
            field,
        ));
    }
    Ok(())
}

/// Validate that a delimiter or marker string is usable.
pub fn validate_non_empty(value: &str, field: &str) -> Result<()> {
    if value.is_empty() {
        return Err(DiscrimError::validation_field(
            format!("{} must not be empty", field),
            field,
        ));
    }
    Ok(())
}

/// Validate that a list of field ordinals is non-empty and free of duplicates.
pub fn validate_unique_ordinals(ordinals: &[usize], field: &str) -> Result<()> {
    if ordinals.is_empty() {
        return Err(DiscrimError::validation_field(
            format!("{} must name at least one field", field),
            field,
        ));
    }

    let mut seen = std::collections::HashSet::with_capacity(ordinals.len());
    for ordinal in ordinals {
        if !seen.insert(*ordinal) {
            return Err(DiscrimError::validation_field(
                format!("{} contains duplicate ordinal {}", field, ordinal),
                field,
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_and_empty_values() {
        assert!(validate_positive_usize(0, "aggregation.num_reducers").is_err());
        assert!(validate_positive_usize(4, "aggregation.num_reducers").is_ok());
        assert!(validate_non_empty("", "output.field_delimiter").is_err());
        assert!(validate_non_empty("\t", "output.field_delimiter").is_ok());
    }

    #[test]
    fn rejects_duplicate_ordinals() {
        let err = validate_unique_ordinals(&[1, 2, 1], "extraction.feature_ordinals").unwrap_err();
        assert!(format!("{err}").contains("duplicate ordinal 1"));
        assert!(validate_unique_ordinals(&[], "extraction.feature_ordinals").is_err());
        assert!(validate_unique_ordinals(&[3, 0], "extraction.feature_ordinals").is_ok());
    }
}
