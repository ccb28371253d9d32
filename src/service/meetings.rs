use std::sync::Arc;

use sqlx::{Pool, Postgres};

use crate::{
    dao::meetings::MeetingDao,
    model::{
        apperror::{ApplicationError, ErrorType},
        listing::{ListQuery, Page},
        meetings::{ChapterMeeting, ChapterMeetingInput, Training, TrainingInput},
    },
    service::{
        acquire, begin, cache_key, cache_lookup, cache_store,
        cache::{EntityKind, ListCache},
        commit, rollback,
    },
};

/**
 * Represents the service for managing chapter meetings and trainings.
 */
pub struct MeetingService {
    /**
     * The DAO for meeting and training operations.
     */
    meeting_dao: MeetingDao,
    /**
     * Optional connection pool for database operations. Optional for test purposes until we have a better way to mock the database.
     */
    connection_pool: Option<Pool<Postgres>>,
    /**
     * Shared list cache.
     */
    cache: Arc<ListCache>,
}

impl MeetingService {
    /**
     * Creates a new instance of `MeetingService`.
     */
    pub fn new(meeting_dao: MeetingDao, connection_pool: Option<Pool<Postgres>>, cache: Arc<ListCache>) -> Self {
        MeetingService { meeting_dao, connection_pool, cache }
    }

    /**
     * Retrieves one page of chapter meetings.
     */
    pub async fn get_meeting_list(&self, query: ListQuery, status: Option<String>) -> Result<Page<ChapterMeeting>, ApplicationError> {
        let query = query.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let key = cache_key(&query, &[("status", status.clone())]);
        let generation = self.cache.generation(EntityKind::ChapterMeeting);
        if let Some(page) = cache_lookup(&self.cache, EntityKind::ChapterMeeting, &key) {
            return Ok(page);
        }
        let mut connection = acquire(connection_pool).await?;
        let (items, total) = self.meeting_dao.list_meetings(&mut connection, &query, status).await?;
        let page = Page::new(items, &query, total);
        cache_store(&self.cache, EntityKind::ChapterMeeting, key, generation, &page);
        Ok(page)
    }

    /**
     * Retrieves a single chapter meeting by id.
     */
    pub async fn get_meeting(&self, id: i64) -> Result<ChapterMeeting, ApplicationError> {
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut connection = acquire(connection_pool).await?;
        self.meeting_dao.get_meeting(&mut connection, id).await
    }

    /**
     * Adds a new chapter meeting and returns the stored entity.
     */
    pub async fn add_meeting(&self, input: ChapterMeetingInput) -> Result<ChapterMeeting, ApplicationError> {
        let input = input.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        let id = match self.meeting_dao.add_meeting(&mut transaction, &input).await {
            Ok(id) => {
                commit(transaction).await?;
                id
            }
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        };
        self.cache.invalidate(EntityKind::ChapterMeeting);
        self.get_meeting(id).await
    }

    /**
     * Updates an existing chapter meeting and returns the stored entity.
     */
    pub async fn update_meeting(&self, id: i64, input: ChapterMeetingInput) -> Result<ChapterMeeting, ApplicationError> {
        let input = input.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        match self.meeting_dao.update_meeting(&mut transaction, id, &input).await {
            Ok(()) => commit(transaction).await?,
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        }
        self.cache.invalidate(EntityKind::ChapterMeeting);
        self.get_meeting(id).await
    }

    /**
     * Deletes a chapter meeting by id.
     */
    pub async fn delete_meeting(&self, id: i64) -> Result<(), ApplicationError> {
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        match self.meeting_dao.delete_meeting(&mut transaction, id).await {
            Ok(()) => commit(transaction).await?,
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        }
        self.cache.invalidate(EntityKind::ChapterMeeting);
        Ok(())
    }

    /**
     * Retrieves one page of trainings.
     */
    pub async fn get_training_list(&self, query: ListQuery, status: Option<String>) -> Result<Page<Training>, ApplicationError> {
        let query = query.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let key = cache_key(&query, &[("status", status.clone())]);
        let generation = self.cache.generation(EntityKind::Training);
        if let Some(page) = cache_lookup(&self.cache, EntityKind::Training, &key) {
            return Ok(page);
        }
        let mut connection = acquire(connection_pool).await?;
        let (items, total) = self.meeting_dao.list_trainings(&mut connection, &query, status).await?;
        let page = Page::new(items, &query, total);
        cache_store(&self.cache, EntityKind::Training, key, generation, &page);
        Ok(page)
    }

    /**
     * Retrieves a single training by id.
     */
    pub async fn get_training(&self, id: i64) -> Result<Training, ApplicationError> {
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut connection = acquire(connection_pool).await?;
        self.meeting_dao.get_training(&mut connection, id).await
    }

    /**
     * Adds a new training and returns the stored entity.
     */
    pub async fn add_training(&self, input: TrainingInput) -> Result<Training, ApplicationError> {
        let input = input.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        let id = match self.meeting_dao.add_training(&mut transaction, &input).await {
            Ok(id) => {
                commit(transaction).await?;
                id
            }
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        };
        self.cache.invalidate(EntityKind::Training);
        self.get_training(id).await
    }

    /**
     * Updates an existing training and returns the stored entity.
     */
    pub async fn update_training(&self, id: i64, input: TrainingInput) -> Result<Training, ApplicationError> {
        let input = input.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        match self.meeting_dao.update_training(&mut transaction, id, &input).await {
            Ok(()) => commit(transaction).await?,
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        }
        self.cache.invalidate(EntityKind::Training);
        self.get_training(id).await
    }

    /**
     * Deletes a training by id.
     */
    pub async fn delete_training(&self, id: i64) -> Result<(), ApplicationError> {
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        match self.meeting_dao.delete_training(&mut transaction, id).await {
            Ok(()) => commit(transaction).await?,
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        }
        self.cache.invalidate(EntityKind::Training);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;

    #[tokio::test]
    async fn test_time_order_checked_before_data_access() {
        let service = MeetingService::new(MeetingDao::new(), None, Arc::new(ListCache::new()));
        let input = ChapterMeetingInput {
            chapter_id: Some(1),
            title: "Weekly meeting".to_string(),
            venue: "Hotel Grand".to_string(),
            meeting_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            description: None,
            status: "scheduled".to_string(),
        };
        let error = service.add_meeting(input).await.unwrap_err();
        assert_eq!(error.error_type, ErrorType::Validation);
        assert!(error.field_errors.unwrap().contains_key("endTime"));
    }
}
