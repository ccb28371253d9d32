use std::collections::BTreeMap;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::model::apperror::{ApplicationError, BusinessRule, ErrorType};

/***************** Error models *********************/

/**
 * Custom error response for the application.
 *
 * The numeric code is the stable contract: clients branch on it, never on
 * the message text.
 */
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /**
     * The error code associated with the error type.
     */
    pub code: u16,
    /**
     * A human-readable message describing the error.
     */
    pub message: String,
    /**
     * Field-level validation messages, keyed by wire field name.
     */
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

impl ResponseError for ApplicationError {
    /**
     * Generates an error response for the application error.
     */
    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse { code: get_error_code(&self.error_type), message: self.message.clone(), errors: self.field_errors.clone() };
        HttpResponse::build(get_statuscode(&self.error_type)).json(&error_response)
    }
}

/**
* Maps application errors to HTTP status codes.
*
* # Arguments
* `application_error`: The type of error that occurred.
*
* # Returns
* The corresponding HTTP status code.
*/
fn get_statuscode(application_error: &ErrorType) -> StatusCode {
    match application_error {
        ErrorType::JwtAuthorization => StatusCode::UNAUTHORIZED,
        ErrorType::Authorization => StatusCode::FORBIDDEN,
        ErrorType::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorType::NotFound => StatusCode::NOT_FOUND,
        ErrorType::ConfirmationRequired => StatusCode::BAD_REQUEST,
        ErrorType::BusinessRule(_) | ErrorType::ConstraintViolation => StatusCode::CONFLICT,
        ErrorType::Initialization => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorType::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorType::Application => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/**
 * Maps application errors to error codes.
 *
 * # Arguments
 * `application_error`: The type of error that occurred.
 *
 * # Returns
 * The corresponding error code.
 */
fn get_error_code(application_error: &ErrorType) -> u16 {
    match application_error {
        ErrorType::JwtAuthorization => 1000,
        ErrorType::Initialization => 1001,
        ErrorType::Authorization => 1002,
        ErrorType::DatabaseError => 1003,
        ErrorType::Application => 1004,
        ErrorType::Validation => 2000,
        ErrorType::NotFound => 2001,
        ErrorType::ConfirmationRequired => 2002,
        ErrorType::ConstraintViolation => 2003,
        ErrorType::BusinessRule(BusinessRule::StatusLocked) => 3001,
        ErrorType::BusinessRule(BusinessRule::ReferenceNotConverted) => 3002,
    }
}

/***************** Common models *********************/

/**
 * Query parameters for delete endpoints. Deletion is destructive, so the
 * caller must acknowledge it explicitly with `confirm=true`.
 */
#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub confirm: Option<bool>,
}

impl DeleteQuery {
    /**
     * Checks the confirmation acknowledgement.
     *
     * # Returns
     * Ok when the caller sent `confirm=true`, otherwise a confirmation
     * required error with its own code.
     */
    pub fn require_confirmation(&self) -> Result<(), ApplicationError> {
        if self.confirm == Some(true) {
            Ok(())
        } else {
            Err(ApplicationError::new(ErrorType::ConfirmationRequired, "Deletion must be confirmed with confirm=true".to_string()))
        }
    }
}

/**
 * Status filter shared by most list endpoints.
 */
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(get_statuscode(&ErrorType::JwtAuthorization), StatusCode::UNAUTHORIZED);
        assert_eq!(get_statuscode(&ErrorType::Authorization), StatusCode::FORBIDDEN);
        assert_eq!(get_statuscode(&ErrorType::Validation), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(get_statuscode(&ErrorType::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(get_statuscode(&ErrorType::ConfirmationRequired), StatusCode::BAD_REQUEST);
        assert_eq!(get_statuscode(&ErrorType::BusinessRule(BusinessRule::StatusLocked)), StatusCode::CONFLICT);
        assert_eq!(get_statuscode(&ErrorType::ConstraintViolation), StatusCode::CONFLICT);
        assert_eq!(get_statuscode(&ErrorType::DatabaseError), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let codes = [
            get_error_code(&ErrorType::JwtAuthorization),
            get_error_code(&ErrorType::Initialization),
            get_error_code(&ErrorType::Authorization),
            get_error_code(&ErrorType::DatabaseError),
            get_error_code(&ErrorType::Application),
            get_error_code(&ErrorType::Validation),
            get_error_code(&ErrorType::NotFound),
            get_error_code(&ErrorType::ConfirmationRequired),
            get_error_code(&ErrorType::ConstraintViolation),
            get_error_code(&ErrorType::BusinessRule(BusinessRule::StatusLocked)),
            get_error_code(&ErrorType::BusinessRule(BusinessRule::ReferenceNotConverted)),
        ];
        let unique: std::collections::HashSet<u16> = codes.iter().copied().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn test_confirmation_gate() {
        assert!(DeleteQuery { confirm: Some(true) }.require_confirmation().is_ok());
        let error = DeleteQuery { confirm: None }.require_confirmation().unwrap_err();
        assert_eq!(error.error_type, ErrorType::ConfirmationRequired);
        assert_eq!(get_error_code(&error.error_type), 2002);
        let error = DeleteQuery { confirm: Some(false) }.require_confirmation().unwrap_err();
        assert_eq!(error.error_type, ErrorType::ConfirmationRequired);
    }

    #[test]
    fn test_validation_response_carries_field_errors() {
        let mut fields = BTreeMap::new();
        fields.insert("mobile".to_string(), "mobile must be a valid mobile number".to_string());
        let error = ApplicationError::validation(fields);
        let response = error.error_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
