use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{apperror::ApplicationError, validation::Validator};

/**
 * A chapter member. Account type separates chapter administrators from
 * regular members; status carries the active/inactive toggle driven by the
 * user-status endpoint.
 */
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: i64,
    pub chapter_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub business_name: Option<String>,
    pub category_id: Option<i64>,
    pub gst_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state_id: Option<i64>,
    pub pincode: Option<String>,
    pub profile_picture: Option<String>,
    pub account_type: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/**
 * Editable fields of a member, shared by create and update.
 */
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInput {
    pub chapter_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub business_name: Option<String>,
    pub category_id: Option<i64>,
    pub gst_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state_id: Option<i64>,
    pub pincode: Option<String>,
    pub profile_picture: Option<String>,
    #[serde(default = "default_member")]
    pub account_type: String,
    #[serde(default = "default_active")]
    pub status: String,
}

impl MemberInput {
    /**
     * Validates the member fields. Format failures (mobile, GST, pincode,
     * email, picture URL) surface per field before any data access.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        let mut validator = Validator::new();
        validator
            .require("firstName", &self.first_name)
            .length("firstName", &self.first_name, 2, 50)
            .require("lastName", &self.last_name)
            .length("lastName", &self.last_name, 1, 50)
            .require("email", &self.email)
            .email("email", &self.email)
            .require("mobile", &self.mobile)
            .mobile("mobile", &self.mobile)
            .optional_length("businessName", self.business_name.as_deref(), 2, 150)
            .gst_number("gstNumber", self.gst_number.as_deref())
            .optional_length("address", self.address.as_deref(), 5, 500)
            .optional_length("city", self.city.as_deref(), 2, 100)
            .pincode("pincode", self.pincode.as_deref())
            .url("profilePicture", self.profile_picture.as_deref())
            .one_of("accountType", &self.account_type, &["admin", "member"])
            .one_of("status", &self.status, &["active", "inactive"]);
        validator.finish()?;
        Ok(self)
    }
}

/**
 * Body of the user-status PATCH: the only field an activation toggle may
 * change.
 */
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberStatusInput {
    pub status: String,
}

impl MemberStatusInput {
    /**
     * Validates the requested status value.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        let mut validator = Validator::new();
        validator.one_of("status", &self.status, &["active", "inactive"]);
        validator.finish()?;
        Ok(self)
    }
}

fn default_active() -> String {
    "active".to_string()
}

fn default_member() -> String {
    "member".to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    fn valid_input() -> MemberInput {
        MemberInput {
            chapter_id: Some(1),
            first_name: "Asha".to_string(),
            last_name: "Patil".to_string(),
            email: "asha@example.com".to_string(),
            mobile: "9876543210".to_string(),
            business_name: Some("Patil Interiors".to_string()),
            category_id: Some(3),
            gst_number: Some("27AAPFU0939F1ZV".to_string()),
            address: Some("12 MG Road".to_string()),
            city: Some("Pune".to_string()),
            state_id: Some(14),
            pincode: Some("411001".to_string()),
            profile_picture: None,
            account_type: "member".to_string(),
            status: "active".to_string(),
        }
    }

    #[test]
    fn test_valid_member_passes() {
        assert!(valid_input().validate().is_ok());
    }

    #[test]
    fn test_short_mobile_rejected_with_field_message() {
        let input = MemberInput { mobile: "12345".to_string(), ..valid_input() };
        let error = input.validate().unwrap_err();
        assert_eq!(error.field_errors.unwrap().get("mobile").unwrap(), "mobile must be a valid mobile number");
    }

    #[test]
    fn test_bad_gst_rejected() {
        let input = MemberInput { gst_number: Some("BADGST".to_string()), ..valid_input() };
        let error = input.validate().unwrap_err();
        assert!(error.field_errors.unwrap().contains_key("gstNumber"));
    }

    #[test]
    fn test_multiple_failures_reported_together() {
        let input = MemberInput { first_name: String::new(), email: "not-an-email".to_string(), ..valid_input() };
        let error = input.validate().unwrap_err();
        let fields = error.field_errors.unwrap();
        assert!(fields.contains_key("firstName"));
        assert!(fields.contains_key("email"));
    }

    #[test]
    fn test_status_input_one_of() {
        assert!(MemberStatusInput { status: "inactive".to_string() }.validate().is_ok());
        assert!(MemberStatusInput { status: "paused".to_string() }.validate().is_err());
    }
}
