use std::sync::Arc;

use sqlx::{Pool, Postgres};

use crate::{
    dao::taxonomy::TaxonomyDao,
    model::{
        apperror::{ApplicationError, ErrorType},
        listing::{ListQuery, Page},
        taxonomy::{Category, CategoryInput, State, StateInput, SubCategory, SubCategoryInput},
    },
    service::{
        acquire, begin, cache_key, cache_lookup, cache_store,
        cache::{EntityKind, ListCache},
        commit, rollback,
    },
};

/**
 * Represents the service for managing the business taxonomy: categories,
 * sub categories and states.
 */
pub struct TaxonomyService {
    /**
     * The DAO for taxonomy operations.
     */
    taxonomy_dao: TaxonomyDao,
    /**
     * Optional connection pool for database operations. Optional for test purposes until we have a better way to mock the database.
     */
    connection_pool: Option<Pool<Postgres>>,
    /**
     * Shared list cache.
     */
    cache: Arc<ListCache>,
}

impl TaxonomyService {
    /**
     * Creates a new instance of `TaxonomyService`.
     */
    pub fn new(taxonomy_dao: TaxonomyDao, connection_pool: Option<Pool<Postgres>>, cache: Arc<ListCache>) -> Self {
        TaxonomyService { taxonomy_dao, connection_pool, cache }
    }

    /**
     * Retrieves one page of categories, served from the list cache when the
     * same query was answered since the last category mutation.
     */
    pub async fn get_category_list(&self, query: ListQuery, status: Option<String>) -> Result<Page<Category>, ApplicationError> {
        let query = query.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let key = cache_key(&query, &[("status", status.clone())]);
        let generation = self.cache.generation(EntityKind::Category);
        if let Some(page) = cache_lookup(&self.cache, EntityKind::Category, &key) {
            return Ok(page);
        }
        let mut connection = acquire(connection_pool).await?;
        let (items, total) = self.taxonomy_dao.list_categories(&mut connection, &query, status).await?;
        let page = Page::new(items, &query, total);
        cache_store(&self.cache, EntityKind::Category, key, generation, &page);
        Ok(page)
    }

    /**
     * Retrieves a single category by id.
     */
    pub async fn get_category(&self, id: i64) -> Result<Category, ApplicationError> {
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut connection = acquire(connection_pool).await?;
        self.taxonomy_dao.get_category(&mut connection, id).await
    }

    /**
     * Adds a new category and returns the stored entity.
     */
    pub async fn add_category(&self, input: CategoryInput) -> Result<Category, ApplicationError> {
        let input = input.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        let id = match self.taxonomy_dao.add_category(&mut transaction, &input).await {
            Ok(id) => {
                commit(transaction).await?;
                id
            }
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        };
        self.cache.invalidate(EntityKind::Category);
        self.get_category(id).await
    }

    /**
     * Updates an existing category and returns the stored entity.
     */
    pub async fn update_category(&self, id: i64, input: CategoryInput) -> Result<Category, ApplicationError> {
        let input = input.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        match self.taxonomy_dao.update_category(&mut transaction, id, &input).await {
            Ok(()) => commit(transaction).await?,
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        }
        self.cache.invalidate(EntityKind::Category);
        self.get_category(id).await
    }

    /**
     * Deletes a category by id.
     */
    pub async fn delete_category(&self, id: i64) -> Result<(), ApplicationError> {
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        match self.taxonomy_dao.delete_category(&mut transaction, id).await {
            Ok(()) => commit(transaction).await?,
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        }
        self.cache.invalidate(EntityKind::Category);
        Ok(())
    }

    /**
     * Retrieves one page of sub categories, optionally narrowed to one parent
     * category.
     */
    pub async fn get_subcategory_list(&self, query: ListQuery, category_id: Option<i64>, status: Option<String>) -> Result<Page<SubCategory>, ApplicationError> {
        let query = query.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let key = cache_key(&query, &[("categoryId", category_id.map(|id| id.to_string())), ("status", status.clone())]);
        let generation = self.cache.generation(EntityKind::SubCategory);
        if let Some(page) = cache_lookup(&self.cache, EntityKind::SubCategory, &key) {
            return Ok(page);
        }
        let mut connection = acquire(connection_pool).await?;
        let (items, total) = self.taxonomy_dao.list_subcategories(&mut connection, &query, category_id, status).await?;
        let page = Page::new(items, &query, total);
        cache_store(&self.cache, EntityKind::SubCategory, key, generation, &page);
        Ok(page)
    }

    /**
     * Retrieves a single sub category by id.
     */
    pub async fn get_subcategory(&self, id: i64) -> Result<SubCategory, ApplicationError> {
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut connection = acquire(connection_pool).await?;
        self.taxonomy_dao.get_subcategory(&mut connection, id).await
    }

    /**
     * Adds a new sub category and returns the stored entity.
     */
    pub async fn add_subcategory(&self, input: SubCategoryInput) -> Result<SubCategory, ApplicationError> {
        let input = input.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        let id = match self.taxonomy_dao.add_subcategory(&mut transaction, &input).await {
            Ok(id) => {
                commit(transaction).await?;
                id
            }
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        };
        self.cache.invalidate(EntityKind::SubCategory);
        self.get_subcategory(id).await
    }

    /**
     * Updates an existing sub category and returns the stored entity.
     */
    pub async fn update_subcategory(&self, id: i64, input: SubCategoryInput) -> Result<SubCategory, ApplicationError> {
        let input = input.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        match self.taxonomy_dao.update_subcategory(&mut transaction, id, &input).await {
            Ok(()) => commit(transaction).await?,
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        }
        self.cache.invalidate(EntityKind::SubCategory);
        self.get_subcategory(id).await
    }

    /**
     * Deletes a sub category by id.
     */
    pub async fn delete_subcategory(&self, id: i64) -> Result<(), ApplicationError> {
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        match self.taxonomy_dao.delete_subcategory(&mut transaction, id).await {
            Ok(()) => commit(transaction).await?,
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        }
        self.cache.invalidate(EntityKind::SubCategory);
        Ok(())
    }

    /**
     * Retrieves one page of states.
     */
    pub async fn get_state_list(&self, query: ListQuery) -> Result<Page<State>, ApplicationError> {
        let query = query.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let key = cache_key(&query, &[]);
        let generation = self.cache.generation(EntityKind::State);
        if let Some(page) = cache_lookup(&self.cache, EntityKind::State, &key) {
            return Ok(page);
        }
        let mut connection = acquire(connection_pool).await?;
        let (items, total) = self.taxonomy_dao.list_states(&mut connection, &query).await?;
        let page = Page::new(items, &query, total);
        cache_store(&self.cache, EntityKind::State, key, generation, &page);
        Ok(page)
    }

    /**
     * Retrieves a single state by id.
     */
    pub async fn get_state(&self, id: i64) -> Result<State, ApplicationError> {
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut connection = acquire(connection_pool).await?;
        self.taxonomy_dao.get_state(&mut connection, id).await
    }

    /**
     * Adds a new state and returns the stored entity.
     */
    pub async fn add_state(&self, input: StateInput) -> Result<State, ApplicationError> {
        let input = input.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        let id = match self.taxonomy_dao.add_state(&mut transaction, &input).await {
            Ok(id) => {
                commit(transaction).await?;
                id
            }
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        };
        self.cache.invalidate(EntityKind::State);
        self.get_state(id).await
    }

    /**
     * Updates an existing state and returns the stored entity.
     */
    pub async fn update_state(&self, id: i64, input: StateInput) -> Result<State, ApplicationError> {
        let input = input.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        match self.taxonomy_dao.update_state(&mut transaction, id, &input).await {
            Ok(()) => commit(transaction).await?,
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        }
        self.cache.invalidate(EntityKind::State);
        self.get_state(id).await
    }

    /**
     * Deletes a state by id.
     */
    pub async fn delete_state(&self, id: i64) -> Result<(), ApplicationError> {
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        match self.taxonomy_dao.delete_state(&mut transaction, id).await {
            Ok(()) => commit(transaction).await?,
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        }
        self.cache.invalidate(EntityKind::State);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::taxonomy::CategoryInput;

    fn service() -> TaxonomyService {
        TaxonomyService::new(TaxonomyDao::new(), None, Arc::new(ListCache::new()))
    }

    #[tokio::test]
    async fn test_validation_runs_before_data_access() {
        let input = CategoryInput { name: String::new(), description: None, status: "active".to_string() };
        let error = service().add_category(input).await.unwrap_err();
        assert_eq!(error.error_type, ErrorType::Validation);
    }

    #[tokio::test]
    async fn test_missing_pool_is_database_error() {
        let input = CategoryInput { name: "Plumbing".to_string(), description: None, status: "active".to_string() };
        let error = service().add_category(input).await.unwrap_err();
        assert_eq!(error.error_type, ErrorType::DatabaseError);
    }
}
