use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::{
    apperror::ApplicationError,
    fees::{FeeBreakdown, derive_fees},
    validation::Validator,
};

/**
 * A membership package. Only `basic_fees` and `gst_rate` are stored; the GST
 * amount and total are derived on every read.
 */
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub basic_fees: Decimal,
    pub gst_rate: Decimal,
    #[sqlx(skip)]
    #[serde(default)]
    pub gst_amount: Decimal,
    #[sqlx(skip)]
    #[serde(default)]
    pub total_fees: Decimal,
    pub duration_months: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Package {
    /**
     * Fills in the derived GST amount and total from the stored inputs.
     */
    pub fn with_derived_fees(mut self) -> Self {
        let FeeBreakdown { gst_amount, total_fees } = derive_fees(self.basic_fees, self.gst_rate);
        self.gst_amount = gst_amount;
        self.total_fees = total_fees;
        self
    }
}

/**
 * Editable fields of a package.
 */
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageInput {
    pub name: String,
    pub description: Option<String>,
    pub basic_fees: Decimal,
    pub gst_rate: Decimal,
    #[serde(default = "default_duration")]
    pub duration_months: i32,
    #[serde(default = "default_active")]
    pub status: String,
}

impl PackageInput {
    /**
     * Validates the package fields.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        let mut validator = Validator::new();
        validator
            .require("name", &self.name)
            .length("name", &self.name, 2, 100)
            .optional_length("description", self.description.as_deref(), 1, 500)
            .range_decimal("basicFees", self.basic_fees, Decimal::ZERO, Decimal::new(10_000_000, 0))
            .range_decimal("gstRate", self.gst_rate, Decimal::ZERO, Decimal::ONE_HUNDRED)
            .range_i64("durationMonths", i64::from(self.duration_months), 1, 60)
            .one_of("status", &self.status, &["active", "inactive"]);
        validator.finish()?;
        Ok(self)
    }
}

fn default_active() -> String {
    "active".to_string()
}

fn default_duration() -> i32 {
    12
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_derived_fees_filled_on_read() {
        let package = Package {
            id: 1,
            name: "Gold".to_string(),
            description: None,
            basic_fees: Decimal::new(1000, 0),
            gst_rate: Decimal::new(18, 0),
            gst_amount: Decimal::ZERO,
            total_fees: Decimal::ZERO,
            duration_months: 12,
            status: "active".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
        .with_derived_fees();
        assert_eq!(package.gst_amount, Decimal::new(180, 0));
        assert_eq!(package.total_fees, Decimal::new(1180, 0));
    }

    #[test]
    fn test_gst_rate_out_of_range() {
        let input = PackageInput {
            name: "Gold".to_string(),
            description: None,
            basic_fees: Decimal::new(1000, 0),
            gst_rate: Decimal::new(101, 0),
            duration_months: 12,
            status: "active".to_string(),
        };
        let error = input.validate().unwrap_err();
        assert!(error.field_errors.unwrap().contains_key("gstRate"));
    }

    #[test]
    fn test_negative_basic_fees_rejected() {
        let input = PackageInput {
            name: "Gold".to_string(),
            description: None,
            basic_fees: Decimal::new(-1, 0),
            gst_rate: Decimal::new(18, 0),
            duration_months: 12,
            status: "active".to_string(),
        };
        assert!(input.validate().is_err());
    }
}
