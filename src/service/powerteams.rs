use std::sync::Arc;

use sqlx::{Pool, Postgres};

use crate::{
    dao::powerteams::PowerTeamDao,
    model::{
        apperror::{ApplicationError, ErrorType},
        listing::{ListQuery, Page},
        powerteams::{PowerTeam, PowerTeamInput},
    },
    service::{
        acquire, begin, cache_key, cache_lookup, cache_store,
        cache::{EntityKind, ListCache},
        commit, rollback,
    },
};

/**
 * Represents the service for managing power teams. A power team's category
 * and sub category links are replaced wholesale on every update, inside the
 * same transaction as the team row itself.
 */
pub struct PowerTeamService {
    /**
     * The DAO for power team operations.
     */
    powerteam_dao: PowerTeamDao,
    /**
     * Optional connection pool for database operations. Optional for test purposes until we have a better way to mock the database.
     */
    connection_pool: Option<Pool<Postgres>>,
    /**
     * Shared list cache.
     */
    cache: Arc<ListCache>,
}

impl PowerTeamService {
    /**
     * Creates a new instance of `PowerTeamService`.
     */
    pub fn new(powerteam_dao: PowerTeamDao, connection_pool: Option<Pool<Postgres>>, cache: Arc<ListCache>) -> Self {
        PowerTeamService { powerteam_dao, connection_pool, cache }
    }

    /**
     * Retrieves one page of power teams.
     */
    pub async fn get_powerteam_list(&self, query: ListQuery, status: Option<String>) -> Result<Page<PowerTeam>, ApplicationError> {
        let query = query.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let key = cache_key(&query, &[("status", status.clone())]);
        let generation = self.cache.generation(EntityKind::PowerTeam);
        if let Some(page) = cache_lookup(&self.cache, EntityKind::PowerTeam, &key) {
            return Ok(page);
        }
        let mut connection = acquire(connection_pool).await?;
        let (items, total) = self.powerteam_dao.list(&mut connection, &query, status).await?;
        let page = Page::new(items, &query, total);
        cache_store(&self.cache, EntityKind::PowerTeam, key, generation, &page);
        Ok(page)
    }

    /**
     * Retrieves a single power team by id.
     */
    pub async fn get_powerteam(&self, id: i64) -> Result<PowerTeam, ApplicationError> {
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut connection = acquire(connection_pool).await?;
        self.powerteam_dao.get(&mut connection, id).await
    }

    /**
     * Adds a new power team with its links and returns the stored entity.
     */
    pub async fn add_powerteam(&self, input: PowerTeamInput) -> Result<PowerTeam, ApplicationError> {
        let input = input.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        let id = match self.powerteam_dao.add(&mut transaction, &input).await {
            Ok(id) => {
                commit(transaction).await?;
                id
            }
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        };
        self.cache.invalidate(EntityKind::PowerTeam);
        self.get_powerteam(id).await
    }

    /**
     * Updates an existing power team and returns the stored entity.
     */
    pub async fn update_powerteam(&self, id: i64, input: PowerTeamInput) -> Result<PowerTeam, ApplicationError> {
        let input = input.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        match self.powerteam_dao.update(&mut transaction, id, &input).await {
            Ok(()) => commit(transaction).await?,
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        }
        self.cache.invalidate(EntityKind::PowerTeam);
        self.get_powerteam(id).await
    }

    /**
     * Deletes a power team by id.
     */
    pub async fn delete_powerteam(&self, id: i64) -> Result<(), ApplicationError> {
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        match self.powerteam_dao.delete(&mut transaction, id).await {
            Ok(()) => commit(transaction).await?,
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        }
        self.cache.invalidate(EntityKind::PowerTeam);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_at_least_one_category_required() {
        let service = PowerTeamService::new(PowerTeamDao::new(), None, Arc::new(ListCache::new()));
        let input = PowerTeamInput {
            name: "Construction".to_string(),
            description: None,
            category_ids: vec![],
            sub_category_ids: vec![],
            status: "active".to_string(),
        };
        let error = service.add_powerteam(input).await.unwrap_err();
        assert_eq!(error.error_type, ErrorType::Validation);
        assert!(error.field_errors.unwrap().contains_key("categoryIds"));
    }
}
