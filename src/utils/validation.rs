//! Validation helpers
//!
//! Custom validators plugged into `#[derive(Validate)]` request bodies.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use validator::ValidationError;

lazy_static! {
    /// Registration plates: letters, digits, spaces and dashes.
    pub static ref LICENSE_PLATE_RE: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9\- ]{2,18}[A-Za-z0-9]$").unwrap();
    /// Phone numbers: optional leading +, then 7 to 15 digits with optional separators.
    pub static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9][0-9 \-]{5,18}[0-9]$").unwrap();
}

/// Reject blank strings
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank"));
    }
    Ok(())
}

pub fn non_negative_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("actual".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

pub fn positive_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if value <= &Decimal::ZERO {
        let mut error = ValidationError::new("positive");
        error.add_param("actual".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Trim and drop empty optional strings
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_license_plate_pattern() {
        assert!(LICENSE_PLATE_RE.is_match("MH-12-PQ-1234"));
        assert!(LICENSE_PLATE_RE.is_match("KA03MN4455"));
        assert!(!LICENSE_PLATE_RE.is_match("-AB"));
        assert!(!LICENSE_PLATE_RE.is_match("AB#123"));
    }

    #[test]
    fn test_phone_pattern() {
        assert!(PHONE_RE.is_match("9876543210"));
        assert!(PHONE_RE.is_match("+91 98765 43210"));
        assert!(!PHONE_RE.is_match("12ab"));
    }

    #[test]
    fn test_decimal_validators() {
        assert!(non_negative_decimal(&Decimal::ZERO).is_ok());
        assert!(non_negative_decimal(&Decimal::new(-1, 0)).is_err());
        assert!(positive_decimal(&Decimal::ZERO).is_err());
        assert!(positive_decimal(&Decimal::new(15, 1)).is_ok());
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("Mumbai").is_ok());
        assert!(not_blank("   ").is_err());
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(Some("  West ".into())), Some("West".into()));
        assert_eq!(normalize_optional(Some("   ".into())), None);
        assert_eq!(normalize_optional(None), None);
    }
}
