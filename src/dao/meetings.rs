use sqlx::PgConnection;
use tracing::instrument;

use crate::dao::crud::{self, Filter, ResourceTable, handle_database_error};
use crate::model::{
    apperror::ApplicationError,
    listing::ListQuery,
    meetings::{ChapterMeeting, ChapterMeetingInput, Training, TrainingInput},
};

/**
 * Descriptor for chapter meeting rows.
 */
pub const MEETING_TABLE: ResourceTable = ResourceTable {
    entity: "Chapter meeting",
    base_table: "chapter_meetings",
    from_clause: "chapter_meetings cm",
    select_columns: "cm.id, cm.chapter_id, cm.title, cm.venue, cm.meeting_date, cm.start_time, cm.end_time, cm.description, cm.status, cm.created_at, cm.updated_at",
    id_column: "cm.id",
    search_columns: &["cm.title", "cm.venue"],
    sortable: &[("title", "cm.title"), ("venue", "cm.venue"), ("meetingDate", "cm.meeting_date"), ("status", "cm.status")],
    default_order: "cm.meeting_date DESC, cm.start_time DESC",
};

/**
 * Descriptor for training rows.
 */
pub const TRAINING_TABLE: ResourceTable = ResourceTable {
    entity: "Training",
    base_table: "trainings",
    from_clause: "trainings t",
    select_columns: "t.id, t.chapter_id, t.title, t.trainer_name, t.venue, t.training_date, t.start_time, t.end_time, t.description, t.status, t.created_at, t.updated_at",
    id_column: "t.id",
    search_columns: &["t.title", "t.trainer_name", "t.venue"],
    sortable: &[("title", "t.title"), ("trainerName", "t.trainer_name"), ("trainingDate", "t.training_date"), ("status", "t.status")],
    default_order: "t.training_date DESC, t.start_time DESC",
};

const ADD_MEETING: &str = "INSERT INTO chapter_meetings (chapter_id, title, venue, meeting_date, start_time, end_time, description, status, created_at, updated_at) \
                           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now(), now()) RETURNING id";

const UPDATE_MEETING: &str = "UPDATE chapter_meetings SET chapter_id = $1, title = $2, venue = $3, meeting_date = $4, start_time = $5, end_time = $6, description = $7, status = $8, updated_at = now() WHERE id = $9";

const ADD_TRAINING: &str = "INSERT INTO trainings (chapter_id, title, trainer_name, venue, training_date, start_time, end_time, description, status, created_at, updated_at) \
                            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now(), now()) RETURNING id";

const UPDATE_TRAINING: &str = "UPDATE trainings SET chapter_id = $1, title = $2, trainer_name = $3, venue = $4, training_date = $5, start_time = $6, end_time = $7, description = $8, status = $9, updated_at = now() WHERE id = $10";

/**
 * DAO for chapter meeting and training database operations.
 */
pub struct MeetingDao {}

impl MeetingDao {
    /**
     * Creates a new instance of `MeetingDao`.
     */
    pub fn new() -> Self {
        MeetingDao {}
    }

    /**
     * Retrieves one page of chapter meetings.
     */
    pub async fn list_meetings(&self, connection: &mut PgConnection, query: &ListQuery, status: Option<String>) -> Result<(Vec<ChapterMeeting>, i64), ApplicationError> {
        let filters: Vec<Filter> = status.map(|status| Filter::text("cm.status", status)).into_iter().collect();
        crud::fetch_page(connection, &MEETING_TABLE, query, &filters).await
    }

    /**
     * Fetches a chapter meeting by id.
     */
    pub async fn get_meeting(&self, connection: &mut PgConnection, id: i64) -> Result<ChapterMeeting, ApplicationError> {
        crud::fetch_by_id(connection, &MEETING_TABLE, id).await
    }

    /**
     * Inserts a new chapter meeting.
     */
    #[instrument(skip(self, transaction, input), fields(result))]
    pub async fn add_meeting(&self, transaction: &mut PgConnection, input: &ChapterMeetingInput) -> Result<i64, ApplicationError> {
        let id: (i64,) = sqlx::query_as(ADD_MEETING)
            .bind(input.chapter_id)
            .bind(&input.title)
            .bind(&input.venue)
            .bind(input.meeting_date)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(&input.description)
            .bind(&input.status)
            .fetch_one(transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        Ok(id.0)
    }

    /**
     * Updates an existing chapter meeting.
     */
    #[instrument(skip(self, transaction, input), fields(result))]
    pub async fn update_meeting(&self, transaction: &mut PgConnection, id: i64, input: &ChapterMeetingInput) -> Result<(), ApplicationError> {
        let result = sqlx::query(UPDATE_MEETING)
            .bind(input.chapter_id)
            .bind(&input.title)
            .bind(&input.venue)
            .bind(input.meeting_date)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(&input.description)
            .bind(&input.status)
            .bind(id)
            .execute(transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        if result.rows_affected() == 0 {
            return Err(ApplicationError::not_found("Chapter meeting"));
        }
        Ok(())
    }

    /**
     * Deletes a chapter meeting by id.
     */
    pub async fn delete_meeting(&self, transaction: &mut PgConnection, id: i64) -> Result<(), ApplicationError> {
        crud::delete_by_id(transaction, &MEETING_TABLE, id).await
    }

    /**
     * Retrieves one page of trainings.
     */
    pub async fn list_trainings(&self, connection: &mut PgConnection, query: &ListQuery, status: Option<String>) -> Result<(Vec<Training>, i64), ApplicationError> {
        let filters: Vec<Filter> = status.map(|status| Filter::text("t.status", status)).into_iter().collect();
        crud::fetch_page(connection, &TRAINING_TABLE, query, &filters).await
    }

    /**
     * Fetches a training by id.
     */
    pub async fn get_training(&self, connection: &mut PgConnection, id: i64) -> Result<Training, ApplicationError> {
        crud::fetch_by_id(connection, &TRAINING_TABLE, id).await
    }

    /**
     * Inserts a new training.
     */
    #[instrument(skip(self, transaction, input), fields(result))]
    pub async fn add_training(&self, transaction: &mut PgConnection, input: &TrainingInput) -> Result<i64, ApplicationError> {
        let id: (i64,) = sqlx::query_as(ADD_TRAINING)
            .bind(input.chapter_id)
            .bind(&input.title)
            .bind(&input.trainer_name)
            .bind(&input.venue)
            .bind(input.training_date)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(&input.description)
            .bind(&input.status)
            .fetch_one(transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        Ok(id.0)
    }

    /**
     * Updates an existing training.
     */
    #[instrument(skip(self, transaction, input), fields(result))]
    pub async fn update_training(&self, transaction: &mut PgConnection, id: i64, input: &TrainingInput) -> Result<(), ApplicationError> {
        let result = sqlx::query(UPDATE_TRAINING)
            .bind(input.chapter_id)
            .bind(&input.title)
            .bind(&input.trainer_name)
            .bind(&input.venue)
            .bind(input.training_date)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(&input.description)
            .bind(&input.status)
            .bind(id)
            .execute(transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        if result.rows_affected() == 0 {
            return Err(ApplicationError::not_found("Training"));
        }
        Ok(())
    }

    /**
     * Deletes a training by id.
     */
    pub async fn delete_training(&self, transaction: &mut PgConnection, id: i64) -> Result<(), ApplicationError> {
        crud::delete_by_id(transaction, &TRAINING_TABLE, id).await
    }
}
