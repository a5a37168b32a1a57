// Configuration validation

use crate::{ConfigError, Result};
use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

/// Trait for validating configuration
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Reusable validation rules
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate that a value is not empty
    pub fn not_empty(value: &str, field: &str) -> Result<()> {
        if value.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                field
            )));
        }
        Ok(())
    }

    /// Validate that a number is within an inclusive range
    pub fn in_range<T: PartialOrd + Display>(value: T, min: T, max: T, field: &str) -> Result<()> {
        // Written as a negated containment check so NaN is rejected too.
        if !(value >= min && value <= max) {
            return Err(ConfigError::ValidationError(format!(
                "{} must be between {} and {}, got {}",
                field, min, max, value
            )));
        }
        Ok(())
    }

    /// Validate that a number is greater than zero
    pub fn positive<T: PartialOrd + Default>(value: T, field: &str) -> Result<()> {
        if value <= T::default() {
            return Err(ConfigError::ValidationError(format!(
                "{} must be greater than zero",
                field
            )));
        }
        Ok(())
    }

    /// Validate that no value appears twice
    pub fn unique<'a, T, I>(values: I, field: &str) -> Result<()>
    where
        T: Eq + Hash + Display + ?Sized + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let mut seen = HashSet::new();
        for value in values {
            if !seen.insert(value) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate {}: {}",
                    field, value
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_empty() {
        assert!(ConfigValidator::not_empty("beta", "flag key").is_ok());
        assert!(ConfigValidator::not_empty("", "flag key").is_err());
    }

    #[test]
    fn test_in_range() {
        assert!(ConfigValidator::in_range(25.0, 0.0, 100.0, "percentage").is_ok());
        assert!(ConfigValidator::in_range(100.0, 0.0, 100.0, "percentage").is_ok());
        assert!(ConfigValidator::in_range(100.5, 0.0, 100.0, "percentage").is_err());
        assert!(ConfigValidator::in_range(f64::NAN, 0.0, 100.0, "percentage").is_err());
    }

    #[test]
    fn test_positive() {
        assert!(ConfigValidator::positive(1, "workers").is_ok());
        assert!(ConfigValidator::positive(0usize, "workers").is_err());
        assert!(ConfigValidator::positive(0u64, "timeout").is_err());
    }

    #[test]
    fn test_unique() {
        assert!(ConfigValidator::unique(["a", "b"].iter().copied(), "flag key").is_ok());

        let err = ConfigValidator::unique(["a", "b", "a"].iter().copied(), "flag key").unwrap_err();
        assert_eq!(err.to_string(), "Invalid configuration: duplicate flag key: a");
    }
}
