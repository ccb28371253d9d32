use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{apperror::ApplicationError, validation::Validator};

/**
 * A scheduled chapter meeting.
 */
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChapterMeeting {
    pub id: i64,
    pub chapter_id: Option<i64>,
    pub title: String,
    pub venue: String,
    pub meeting_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/**
 * Editable fields of a chapter meeting.
 */
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterMeetingInput {
    pub chapter_id: Option<i64>,
    pub title: String,
    pub venue: String,
    pub meeting_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub description: Option<String>,
    #[serde(default = "default_scheduled")]
    pub status: String,
}

impl ChapterMeetingInput {
    /**
     * Validates the meeting fields, including that the meeting ends after it
     * starts.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        let mut validator = Validator::new();
        validator
            .require("title", &self.title)
            .length("title", &self.title, 3, 150)
            .require("venue", &self.venue)
            .length("venue", &self.venue, 3, 200)
            .optional_length("description", self.description.as_deref(), 1, 1000)
            .one_of("status", &self.status, &["scheduled", "completed", "cancelled"]);
        validator.finish()?;
        check_time_order(self.start_time, self.end_time)?;
        Ok(self)
    }
}

/**
 * A chapter training session. Same scheduling shape as a meeting plus the
 * trainer's name.
 */
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Training {
    pub id: i64,
    pub chapter_id: Option<i64>,
    pub title: String,
    pub trainer_name: Option<String>,
    pub venue: String,
    pub training_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/**
 * Editable fields of a training.
 */
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingInput {
    pub chapter_id: Option<i64>,
    pub title: String,
    pub trainer_name: Option<String>,
    pub venue: String,
    pub training_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub description: Option<String>,
    #[serde(default = "default_scheduled")]
    pub status: String,
}

impl TrainingInput {
    /**
     * Validates the training fields.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        let mut validator = Validator::new();
        validator
            .require("title", &self.title)
            .length("title", &self.title, 3, 150)
            .optional_length("trainerName", self.trainer_name.as_deref(), 2, 100)
            .require("venue", &self.venue)
            .length("venue", &self.venue, 3, 200)
            .optional_length("description", self.description.as_deref(), 1, 1000)
            .one_of("status", &self.status, &["scheduled", "completed", "cancelled"]);
        validator.finish()?;
        check_time_order(self.start_time, self.end_time)?;
        Ok(self)
    }
}

fn check_time_order(start: NaiveTime, end: NaiveTime) -> Result<(), ApplicationError> {
    if end <= start {
        let mut validator = Validator::new();
        validator.custom("endTime", "must be after startTime");
        return validator.finish();
    }
    Ok(())
}

fn default_scheduled() -> String {
    "scheduled".to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    fn meeting_input() -> ChapterMeetingInput {
        ChapterMeetingInput {
            chapter_id: Some(1),
            title: "Weekly meeting".to_string(),
            venue: "Hotel Central".to_string(),
            meeting_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            description: None,
            status: "scheduled".to_string(),
        }
    }

    #[test]
    fn test_valid_meeting() {
        assert!(meeting_input().validate().is_ok());
    }

    #[test]
    fn test_end_before_start_rejected() {
        let input = ChapterMeetingInput { end_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(), ..meeting_input() };
        let error = input.validate().unwrap_err();
        assert!(error.field_errors.unwrap().contains_key("endTime"));
    }

    #[test]
    fn test_unknown_meeting_status_rejected() {
        let input = ChapterMeetingInput { status: "postponed".to_string(), ..meeting_input() };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_training_requires_title_and_venue() {
        let input = TrainingInput {
            chapter_id: None,
            title: String::new(),
            trainer_name: None,
            venue: String::new(),
            training_date: NaiveDate::from_ymd_opt(2026, 9, 15).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            description: None,
            status: "scheduled".to_string(),
        };
        let error = input.validate().unwrap_err();
        let fields = error.field_errors.unwrap();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("venue"));
    }
}
