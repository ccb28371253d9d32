use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{apperror::ApplicationError, validation::Validator};

/**
 * A power team groups related categories and sub categories so members in
 * complementary trades meet together. The linked ids live in join tables and
 * are stitched onto the row after fetching.
 */
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PowerTeam {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    #[sqlx(skip)]
    #[serde(default)]
    pub category_ids: Vec<i64>,
    #[sqlx(skip)]
    #[serde(default)]
    pub sub_category_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/**
 * Editable fields of a power team, including the full set of linked
 * category/sub-category ids (replaced wholesale on update).
 */
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerTeamInput {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub category_ids: Vec<i64>,
    #[serde(default)]
    pub sub_category_ids: Vec<i64>,
    #[serde(default = "default_active")]
    pub status: String,
}

impl PowerTeamInput {
    /**
     * Validates the power team fields. At least one category link is
     * required; duplicates in either id list are rejected.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        let mut validator = Validator::new();
        validator
            .require("name", &self.name)
            .length("name", &self.name, 2, 100)
            .optional_length("description", self.description.as_deref(), 1, 500)
            .one_of("status", &self.status, &["active", "inactive"]);
        if self.category_ids.is_empty() {
            validator.custom("categoryIds", "must contain at least one category");
        }
        if has_duplicates(&self.category_ids) {
            validator.custom("categoryIds", "must not contain duplicates");
        }
        if has_duplicates(&self.sub_category_ids) {
            validator.custom("subCategoryIds", "must not contain duplicates");
        }
        validator.finish()?;
        Ok(self)
    }
}

fn has_duplicates(ids: &[i64]) -> bool {
    let mut seen = std::collections::HashSet::new();
    ids.iter().any(|id| !seen.insert(id))
}

fn default_active() -> String {
    "active".to_string()
}
