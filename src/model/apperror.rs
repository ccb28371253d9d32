use std::collections::BTreeMap;
use std::fmt;

/**
 * Represents the type of error that can occur within the application.
 *
 * Every error carries a stable numeric code on the wire (see `api::rest`),
 * so clients match on codes rather than message substrings.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorType {
    Initialization,
    JwtAuthorization,
    Authorization,
    Validation,
    NotFound,
    ConfirmationRequired,
    BusinessRule(BusinessRule),
    ConstraintViolation,
    DatabaseError,
    Application,
}

/**
 * Business-rule rejections with their own error codes.
 */
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BusinessRule {
    /**
     * The requested status transition is not allowed from the current status.
     */
    StatusLocked,
    /**
     * A thank-you slip names a reference that has not reached business done.
     */
    ReferenceNotConverted,
}

/**
 * Represents an error that occurs within the application.
 */
#[derive(Debug, Clone)]
pub struct ApplicationError {
    /**
     * Error type.
     */
    pub error_type: ErrorType,
    /**
     * Error message describing problem.
     */
    pub message: String,
    /**
     * Field-level validation messages, keyed by wire field name. Only
     * populated for validation errors that can be mapped onto form fields.
     */
    pub field_errors: Option<BTreeMap<String, String>>,
}

impl ApplicationError {
    /**
     * Creates a new ApplicationError.
     *
     * #Arguments
     * `error_type`: The type of error.
     * `message`: A description of the error.
     */
    pub fn new(error_type: ErrorType, message: String) -> Self {
        ApplicationError { error_type, message, field_errors: None }
    }

    /**
     * Creates a validation error carrying per-field messages.
     *
     * #Arguments
     * `field_errors`: Messages keyed by the wire name of the offending field.
     */
    pub fn validation(field_errors: BTreeMap<String, String>) -> Self {
        ApplicationError { error_type: ErrorType::Validation, message: "Validation failed".to_string(), field_errors: Some(field_errors) }
    }

    /**
     * Creates a not-found error for an entity.
     *
     * #Arguments
     * `entity`: Human readable entity name.
     */
    pub fn not_found(entity: &str) -> Self {
        ApplicationError::new(ErrorType::NotFound, format!("{entity} not found"))
    }
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validation_error_carries_fields() {
        let mut fields = BTreeMap::new();
        fields.insert("mobile".to_string(), "Mobile number is invalid".to_string());
        let error = ApplicationError::validation(fields);
        assert_eq!(error.error_type, ErrorType::Validation);
        assert_eq!(error.field_errors.unwrap().get("mobile").unwrap(), "Mobile number is invalid");
    }

    #[test]
    fn test_not_found_message() {
        let error = ApplicationError::not_found("Category");
        assert_eq!(error.error_type, ErrorType::NotFound);
        assert_eq!(error.message, "Category not found");
    }
}
