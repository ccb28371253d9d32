use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::{apperror::ApplicationError, status::ReferenceStatus, validation::Validator};

/**
 * A business reference passed from one member (the giver) to another (the
 * receiver). Status is owned by the receiver and every transition is logged
 * in the append-only history.
 */
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub id: i64,
    pub giver_id: i64,
    pub giver_name: String,
    pub receiver_id: i64,
    pub receiver_name: String,
    pub referral_name: String,
    pub mobile: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub urgency: String,
    pub status: String,
    pub comments: Option<String>,
    pub self_referral: bool,
    #[sqlx(skip)]
    #[serde(default)]
    pub status_history: Vec<ReferenceStatusEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/**
 * One immutable entry in a reference's status history. Appended server side
 * on every transition, never edited.
 */
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceStatusEntry {
    pub id: i64,
    pub reference_id: i64,
    pub status: String,
    pub entry_date: NaiveDate,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/**
 * Editable fields of a reference. The giver is always the caller; a
 * self-referral leaves the referral contact fields blank and has them filled
 * from the giver's own member record.
 */
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceInput {
    pub receiver_id: i64,
    #[serde(default)]
    pub referral_name: String,
    #[serde(default)]
    pub mobile: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub urgency: String,
    pub comments: Option<String>,
    #[serde(default)]
    pub self_referral: bool,
}

impl ReferenceInput {
    /**
     * Validates the reference fields. Referral name and mobile are only
     * required for non-self referrals; for self-referrals the service fills
     * them from the caller's member record after validation.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        let mut validator = Validator::new();
        validator.range_i64("receiverId", self.receiver_id, 1, i64::MAX);
        if !self.self_referral {
            validator.require("referralName", &self.referral_name).require("mobile", &self.mobile);
        }
        validator
            .length("referralName", &self.referral_name, 2, 100)
            .mobile("mobile", &self.mobile)
            .optional_email("email", self.email.as_deref())
            .optional_length("address", self.address.as_deref(), 5, 500)
            .one_of("urgency", &self.urgency, &["immediate", "within_week", "within_month"])
            .optional_length("comments", self.comments.as_deref(), 1, 1000);
        validator.finish()?;
        Ok(self)
    }
}

/**
 * Body of the reference status PATCH.
 */
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceStatusInput {
    pub status: ReferenceStatus,
    pub date: NaiveDate,
    pub comment: Option<String>,
}

impl ReferenceStatusInput {
    /**
     * Validates the status transition body.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        let mut validator = Validator::new();
        validator.optional_length("comment", self.comment.as_deref(), 1, 500);
        if self.status == ReferenceStatus::Pending {
            validator.custom("status", "cannot be set back to pending");
        }
        validator.finish()?;
        Ok(self)
    }
}

/**
 * A thank-you slip recording business closed from a reference. The giver of
 * the slip is the caller (who received the business); the receiver is the
 * member being thanked.
 */
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ThankYouSlip {
    pub id: i64,
    pub reference_id: Option<i64>,
    pub giver_id: i64,
    pub giver_name: String,
    pub receiver_id: i64,
    pub receiver_name: String,
    pub amount: Decimal,
    pub comment: Option<String>,
    pub slip_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/**
 * Editable fields of a thank-you slip. When a reference is named, the slip's
 * receiver is derived from it and the reference must be business done.
 */
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThankYouSlipInput {
    pub reference_id: Option<i64>,
    pub receiver_id: Option<i64>,
    pub amount: Decimal,
    pub comment: Option<String>,
    pub slip_date: NaiveDate,
}

impl ThankYouSlipInput {
    /**
     * Validates the thank-you slip fields. A receiver is required when no
     * reference is named to derive it from.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        let mut validator = Validator::new();
        if self.reference_id.is_none() && self.receiver_id.is_none() {
            validator.custom("receiverId", "is required when no reference is given");
        }
        if self.amount <= Decimal::ZERO {
            validator.custom("amount", "must be greater than zero");
        }
        validator.optional_length("comment", self.comment.as_deref(), 1, 500);
        validator.finish()?;
        Ok(self)
    }
}

/**
 * A requirement (ask) raised by a member towards the chapter.
 */
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    pub id: i64,
    pub member_id: i64,
    pub member_name: String,
    pub text: String,
    pub urgency: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/**
 * Editable fields of a requirement. The owning member is the caller.
 */
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementInput {
    pub text: String,
    pub urgency: String,
    #[serde(default = "default_open")]
    pub status: String,
}

impl RequirementInput {
    /**
     * Validates the requirement fields.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        let mut validator = Validator::new();
        validator
            .require("text", &self.text)
            .length("text", &self.text, 5, 500)
            .one_of("urgency", &self.urgency, &["immediate", "within_week", "within_month"])
            .one_of("status", &self.status, &["open", "closed"]);
        validator.finish()?;
        Ok(self)
    }
}

fn default_open() -> String {
    "open".to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    fn reference_input() -> ReferenceInput {
        ReferenceInput {
            receiver_id: 2,
            referral_name: "Sanjay Mehta".to_string(),
            mobile: "9876543210".to_string(),
            email: None,
            address: None,
            urgency: "within_week".to_string(),
            comments: Some("Looking for office interiors".to_string()),
            self_referral: false,
        }
    }

    #[test]
    fn test_valid_reference() {
        assert!(reference_input().validate().is_ok());
    }

    #[test]
    fn test_referral_contact_required_unless_self() {
        let input = ReferenceInput { referral_name: String::new(), mobile: String::new(), ..reference_input() };
        let error = input.validate().unwrap_err();
        let fields = error.field_errors.unwrap();
        assert!(fields.contains_key("referralName"));
        assert!(fields.contains_key("mobile"));

        let input = ReferenceInput { referral_name: String::new(), mobile: String::new(), self_referral: true, ..reference_input() };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_unknown_urgency_rejected() {
        let input = ReferenceInput { urgency: "yesterday".to_string(), ..reference_input() };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_status_input_rejects_pending() {
        let input = ReferenceStatusInput { status: ReferenceStatus::Pending, date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(), comment: None };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_slip_requires_receiver_or_reference() {
        let input = ThankYouSlipInput { reference_id: None, receiver_id: None, amount: Decimal::new(5000, 0), comment: None, slip_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap() };
        let error = input.validate().unwrap_err();
        assert!(error.field_errors.unwrap().contains_key("receiverId"));
    }

    #[test]
    fn test_slip_amount_positive() {
        let input = ThankYouSlipInput { reference_id: Some(1), receiver_id: None, amount: Decimal::ZERO, comment: None, slip_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap() };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_requirement_text_bounds() {
        let input = RequirementInput { text: "Hi".to_string(), urgency: "immediate".to_string(), status: "open".to_string() };
        assert!(input.validate().is_err());
        let input = RequirementInput { text: "Need a CA for GST filings".to_string(), urgency: "immediate".to_string(), status: "open".to_string() };
        assert!(input.validate().is_ok());
    }
}
