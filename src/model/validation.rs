use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::model::apperror::ApplicationError;

/**
 * Mobile numbers: ten digits, optionally prefixed with a country code.
 */
static MOBILE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\+[0-9]{1,3})?[0-9]{10}$").unwrap());

/**
 * Indian postal pincodes: six digits, not starting with zero.
 */
static PINCODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[1-9][0-9]{5}$").unwrap());

/**
 * GST identification numbers (GSTIN).
 */
static GSTIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{2}[A-Z]{5}[0-9]{4}[A-Z][1-9A-Z]Z[0-9A-Z]$").unwrap());

static EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

static URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^https?://[^\s]+$").unwrap());

/**
 * Accumulates declarative field checks for one request body and converts the
 * collected failures into a single validation error. No data access happens
 * until `finish` has returned Ok.
 */
#[derive(Debug, Default)]
pub struct Validator {
    errors: BTreeMap<String, String>,
}

impl Validator {
    /**
     * Creates a new empty validator.
     */
    pub fn new() -> Self {
        Validator { errors: BTreeMap::new() }
    }

    /**
     * Records a failure for a field unless one is already present. The first
     * failing rule per field wins, matching how the forms show one message
     * per field.
     */
    fn fail(&mut self, field: &str, message: String) {
        self.errors.entry(field.to_string()).or_insert(message);
    }

    /**
     * Records a failure that does not fit a declarative rule, e.g. a
     * cross-field check.
     */
    pub fn custom(&mut self, field: &str, message: &str) -> &mut Self {
        self.fail(field, format!("{field} {message}"));
        self
    }

    /**
     * Requires a non-blank string value.
     */
    pub fn require(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.fail(field, format!("{field} is required"));
        }
        self
    }

    /**
     * Bounds the length of a string value. Skipped when the value is blank so
     * `require` keeps the single authoritative message.
     */
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.trim().chars().count();
        if len > 0 && (len < min || len > max) {
            self.fail(field, format!("{field} must be between {min} and {max} characters"));
        }
        self
    }

    /**
     * Bounds the length of an optional string value when present.
     */
    pub fn optional_length(&mut self, field: &str, value: Option<&str>, min: usize, max: usize) -> &mut Self {
        if let Some(value) = value {
            self.length(field, value, min, max);
        }
        self
    }

    /**
     * Requires an integer value to fall within an inclusive range.
     */
    pub fn range_i64(&mut self, field: &str, value: i64, min: i64, max: i64) -> &mut Self {
        if value < min || value > max {
            self.fail(field, format!("{field} must be between {min} and {max}"));
        }
        self
    }

    /**
     * Requires a decimal value to fall within an inclusive range.
     */
    pub fn range_decimal(&mut self, field: &str, value: Decimal, min: Decimal, max: Decimal) -> &mut Self {
        if value < min || value > max {
            self.fail(field, format!("{field} must be between {min} and {max}"));
        }
        self
    }

    /**
     * Requires a value to be one of a fixed set of allowed strings.
     */
    pub fn one_of(&mut self, field: &str, value: &str, allowed: &[&str]) -> &mut Self {
        if !allowed.contains(&value) {
            self.fail(field, format!("{field} must be one of: {}", allowed.join(", ")));
        }
        self
    }

    /**
     * Matches a non-blank value against a format regex.
     */
    fn format(&mut self, field: &str, value: &str, pattern: &Regex, message: &str) -> &mut Self {
        let value = value.trim();
        if !value.is_empty() && !pattern.is_match(value) {
            self.fail(field, format!("{field} {message}"));
        }
        self
    }

    /**
     * Validates a mobile number format.
     */
    pub fn mobile(&mut self, field: &str, value: &str) -> &mut Self {
        self.format(field, value, &MOBILE, "must be a valid mobile number")
    }

    /**
     * Validates a pincode format when present.
     */
    pub fn pincode(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.format(field, value, &PINCODE, "must be a valid 6 digit pincode");
        }
        self
    }

    /**
     * Validates a GST number format when present.
     */
    pub fn gst_number(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.format(field, value, &GSTIN, "must be a valid GST number");
        }
        self
    }

    /**
     * Validates an email address format.
     */
    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        self.format(field, value, &EMAIL, "must be a valid email address")
    }

    /**
     * Validates an optional email address format.
     */
    pub fn optional_email(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.email(field, value);
        }
        self
    }

    /**
     * Validates a URL format when present.
     */
    pub fn url(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.format(field, value, &URL, "must be a valid http or https URL");
        }
        self
    }

    /**
     * Converts the collected failures into a validation error, or Ok when
     * every rule passed.
     */
    pub fn finish(self) -> Result<(), ApplicationError> {
        if self.errors.is_empty() { Ok(()) } else { Err(ApplicationError::validation(self.errors)) }
    }
}

#[cfg(test)]
mod test {
    use rust_decimal::Decimal;

    use super::*;
    use crate::model::apperror::ErrorType;

    #[test]
    fn test_valid_input_passes() {
        let mut validator = Validator::new();
        validator.require("name", "Plumbing").length("name", "Plumbing", 2, 100).mobile("mobile", "9876543210").email("email", "a@b.com");
        assert!(validator.finish().is_ok());
    }

    #[test]
    fn test_missing_required_field() {
        let mut validator = Validator::new();
        validator.require("name", "   ");
        let error = validator.finish().unwrap_err();
        assert_eq!(error.error_type, ErrorType::Validation);
        assert_eq!(error.field_errors.unwrap().get("name").unwrap(), "name is required");
    }

    #[test]
    fn test_short_mobile_rejected() {
        let mut validator = Validator::new();
        validator.require("mobile", "12345").mobile("mobile", "12345");
        let error = validator.finish().unwrap_err();
        assert_eq!(error.field_errors.unwrap().get("mobile").unwrap(), "mobile must be a valid mobile number");
    }

    #[test]
    fn test_mobile_with_country_code_accepted() {
        let mut validator = Validator::new();
        validator.mobile("mobile", "+919876543210");
        assert!(validator.finish().is_ok());
    }

    #[test]
    fn test_malformed_gst_rejected() {
        let mut validator = Validator::new();
        validator.gst_number("gstNumber", Some("BADGST"));
        let error = validator.finish().unwrap_err();
        assert!(error.field_errors.unwrap().contains_key("gstNumber"));
    }

    #[test]
    fn test_wellformed_gst_accepted() {
        let mut validator = Validator::new();
        validator.gst_number("gstNumber", Some("27AAPFU0939F1ZV"));
        assert!(validator.finish().is_ok());
    }

    #[test]
    fn test_first_failure_per_field_wins() {
        let mut validator = Validator::new();
        validator.require("name", "").length("name", "", 2, 100);
        let error = validator.finish().unwrap_err();
        assert_eq!(error.field_errors.unwrap().get("name").unwrap(), "name is required");
    }

    #[test]
    fn test_decimal_range() {
        let mut validator = Validator::new();
        validator.range_decimal("gstRate", Decimal::new(101, 0), Decimal::ZERO, Decimal::new(100, 0));
        assert!(validator.finish().is_err());
    }

    #[test]
    fn test_one_of_rejects_unknown_value() {
        let mut validator = Validator::new();
        validator.one_of("status", "archived", &["active", "inactive"]);
        let error = validator.finish().unwrap_err();
        assert_eq!(error.field_errors.unwrap().get("status").unwrap(), "status must be one of: active, inactive");
    }

    #[test]
    fn test_pincode_formats() {
        let mut ok = Validator::new();
        ok.pincode("pincode", Some("400001"));
        assert!(ok.finish().is_ok());
        let mut bad = Validator::new();
        bad.pincode("pincode", Some("0401"));
        assert!(bad.finish().is_err());
    }
}
