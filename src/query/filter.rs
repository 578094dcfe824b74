//! Filter criteria
//!
//! Validates and normalizes the city and vehicle-variant selection criteria
//! supplied on the command line.

use std::fmt;

use serde::Serialize;

use super::city::resolve_city;
use super::variant::ALL_VARIANTS;
use crate::error::{InputError, Result};

/// Selection criteria for one export run.
///
/// Constructed once through [`FilterSpec::create`] and immutable afterwards.
/// `city` is never empty and `variant` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterSpec {
    city: String,
    variant: String,
}

impl FilterSpec {
    /// Validate and normalize user-supplied criteria.
    ///
    /// # Arguments
    /// * `city` - City name or dashboard city code (`std:011`)
    /// * `variant` - Vehicle variant token; `ALL` when absent or blank
    ///
    /// # Returns
    /// * `Result<Self>` - Normalized spec, or `InvalidInput` for an empty city
    pub fn create(city: &str, variant: Option<&str>) -> Result<Self> {
        let city = city.trim();
        if city.is_empty() {
            return Err(InputError::MissingCity.into());
        }

        let variant = match variant.map(str::trim) {
            Some(v) if !v.is_empty() => v.to_ascii_uppercase(),
            _ => ALL_VARIANTS.to_string(),
        };

        Ok(Self {
            city: resolve_city(city).to_string(),
            variant,
        })
    }

    /// City name matched against the city column
    pub fn city(&self) -> &str {
        &self.city
    }

    /// Requested vehicle variant
    pub fn variant(&self) -> &str {
        &self.variant
    }

    /// Whether both invariants still hold.
    pub fn is_valid(&self) -> bool {
        !self.city.trim().is_empty() && !self.variant.trim().is_empty()
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "city={}, variant={}", self.city, self.variant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;

    #[test]
    fn test_empty_city_rejected() {
        let err = FilterSpec::create("", Some("ALL")).unwrap_err();
        assert!(matches!(
            err,
            ExportError::InvalidInput(InputError::MissingCity)
        ));

        assert!(FilterSpec::create("   \t", None).is_err());
    }

    #[test]
    fn test_variant_defaults_to_all() {
        let spec = FilterSpec::create("Delhi", None).unwrap();
        assert_eq!(spec.city(), "Delhi");
        assert_eq!(spec.variant(), "ALL");

        let spec = FilterSpec::create("Delhi", Some("  ")).unwrap();
        assert_eq!(spec.variant(), "ALL");
    }

    #[test]
    fn test_normalization() {
        let spec = FilterSpec::create("  Mumbai ", Some(" bike ")).unwrap();
        assert_eq!(spec.city(), "Mumbai");
        assert_eq!(spec.variant(), "BIKE");
    }

    #[test]
    fn test_city_code_resolved() {
        let spec = FilterSpec::create("std:011", Some("CAB")).unwrap();
        assert_eq!(spec.city(), "Delhi");
        assert!(spec.is_valid());
        assert_eq!(spec.to_string(), "city=Delhi, variant=CAB");
    }
}
