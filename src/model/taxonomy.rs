use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{apperror::ApplicationError, validation::Validator};

/**
 * A business category a member can belong to.
 */
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/**
 * Editable fields of a category, shared by create and update.
 */
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub status: String,
}

impl CategoryInput {
    /**
     * Validates the category fields.
     *
     * # Returns
     * The input itself or a field-mapped validation error.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        let mut validator = Validator::new();
        validator
            .require("name", &self.name)
            .length("name", &self.name, 2, 100)
            .optional_length("description", self.description.as_deref(), 1, 500)
            .one_of("status", &self.status, &["active", "inactive"]);
        validator.finish()?;
        Ok(self)
    }
}

/**
 * A sub category under one category. List rows embed the parent category
 * name for display.
 */
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SubCategory {
    pub id: i64,
    pub category_id: i64,
    pub category_name: String,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/**
 * Editable fields of a sub category.
 */
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCategoryInput {
    pub category_id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub status: String,
}

impl SubCategoryInput {
    /**
     * Validates the sub category fields.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        let mut validator = Validator::new();
        validator
            .range_i64("categoryId", self.category_id, 1, i64::MAX)
            .require("name", &self.name)
            .length("name", &self.name, 2, 100)
            .optional_length("description", self.description.as_deref(), 1, 500)
            .one_of("status", &self.status, &["active", "inactive"]);
        validator.finish()?;
        Ok(self)
    }
}

/**
 * A state used for member addresses.
 */
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/**
 * Editable fields of a state.
 */
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateInput {
    pub name: String,
    pub code: String,
}

impl StateInput {
    /**
     * Validates the state fields.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        let mut validator = Validator::new();
        validator.require("name", &self.name).length("name", &self.name, 2, 100).require("code", &self.code).length("code", &self.code, 2, 5);
        validator.finish()?;
        Ok(self)
    }
}

fn default_active() -> String {
    "active".to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_category_input_valid() {
        let input = CategoryInput { name: "Construction".to_string(), description: None, status: "active".to_string() };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_category_input_rejects_blank_name() {
        let input = CategoryInput { name: " ".to_string(), description: None, status: "active".to_string() };
        let error = input.validate().unwrap_err();
        assert!(error.field_errors.unwrap().contains_key("name"));
    }

    #[test]
    fn test_subcategory_input_requires_parent() {
        let input = SubCategoryInput { category_id: 0, name: "Residential".to_string(), description: None, status: "active".to_string() };
        let error = input.validate().unwrap_err();
        assert!(error.field_errors.unwrap().contains_key("categoryId"));
    }

    #[test]
    fn test_state_code_length() {
        let input = StateInput { name: "Maharashtra".to_string(), code: "M".to_string() };
        let error = input.validate().unwrap_err();
        assert!(error.field_errors.unwrap().contains_key("code"));
    }

    #[test]
    fn test_category_default_status() {
        let input: CategoryInput = serde_json::from_str(r#"{"name": "Legal"}"#).unwrap();
        assert_eq!(input.status, "active");
    }
}
