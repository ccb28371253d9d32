use std::sync::Arc;

use sqlx::{Pool, Postgres};

use crate::{
    dao::packages::PackageDao,
    model::{
        apperror::{ApplicationError, ErrorType},
        listing::{ListQuery, Page},
        packages::{Package, PackageInput},
    },
    service::{
        acquire, begin, cache_key, cache_lookup, cache_store,
        cache::{EntityKind, ListCache},
        commit, rollback,
    },
};

/**
 * Represents the service for managing membership packages. The GST amount and
 * total fees are derived here on every read so stored and displayed figures
 * can never drift apart.
 */
pub struct PackageService {
    /**
     * The DAO for package operations.
     */
    package_dao: PackageDao,
    /**
     * Optional connection pool for database operations. Optional for test purposes until we have a better way to mock the database.
     */
    connection_pool: Option<Pool<Postgres>>,
    /**
     * Shared list cache.
     */
    cache: Arc<ListCache>,
}

impl PackageService {
    /**
     * Creates a new instance of `PackageService`.
     */
    pub fn new(package_dao: PackageDao, connection_pool: Option<Pool<Postgres>>, cache: Arc<ListCache>) -> Self {
        PackageService { package_dao, connection_pool, cache }
    }

    /**
     * Retrieves one page of packages with derived fees filled in.
     */
    pub async fn get_package_list(&self, query: ListQuery, status: Option<String>) -> Result<Page<Package>, ApplicationError> {
        let query = query.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let key = cache_key(&query, &[("status", status.clone())]);
        let generation = self.cache.generation(EntityKind::Package);
        if let Some(page) = cache_lookup(&self.cache, EntityKind::Package, &key) {
            return Ok(page);
        }
        let mut connection = acquire(connection_pool).await?;
        let (items, total) = self.package_dao.list(&mut connection, &query, status).await?;
        let items = items.into_iter().map(Package::with_derived_fees).collect();
        let page = Page::new(items, &query, total);
        cache_store(&self.cache, EntityKind::Package, key, generation, &page);
        Ok(page)
    }

    /**
     * Retrieves a single package by id with derived fees filled in.
     */
    pub async fn get_package(&self, id: i64) -> Result<Package, ApplicationError> {
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut connection = acquire(connection_pool).await?;
        Ok(self.package_dao.get(&mut connection, id).await?.with_derived_fees())
    }

    /**
     * Adds a new package and returns the stored entity.
     */
    pub async fn add_package(&self, input: PackageInput) -> Result<Package, ApplicationError> {
        let input = input.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        let id = match self.package_dao.add(&mut transaction, &input).await {
            Ok(id) => {
                commit(transaction).await?;
                id
            }
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        };
        self.cache.invalidate(EntityKind::Package);
        self.get_package(id).await
    }

    /**
     * Updates an existing package and returns the stored entity.
     */
    pub async fn update_package(&self, id: i64, input: PackageInput) -> Result<Package, ApplicationError> {
        let input = input.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        match self.package_dao.update(&mut transaction, id, &input).await {
            Ok(()) => commit(transaction).await?,
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        }
        self.cache.invalidate(EntityKind::Package);
        self.get_package(id).await
    }

    /**
     * Deletes a package by id.
     */
    pub async fn delete_package(&self, id: i64) -> Result<(), ApplicationError> {
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        match self.package_dao.delete(&mut transaction, id).await {
            Ok(()) => commit(transaction).await?,
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        }
        self.cache.invalidate(EntityKind::Package);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use rust_decimal::Decimal;

    use super::*;

    #[tokio::test]
    async fn test_gst_rate_bounds_checked_before_data_access() {
        let service = PackageService::new(PackageDao::new(), None, Arc::new(ListCache::new()));
        let input = PackageInput {
            name: "Gold".to_string(),
            description: None,
            basic_fees: Decimal::new(1000, 0),
            gst_rate: Decimal::new(150, 0),
            duration_months: 12,
            status: "active".to_string(),
        };
        let error = service.add_package(input).await.unwrap_err();
        assert_eq!(error.error_type, ErrorType::Validation);
        assert!(error.field_errors.unwrap().contains_key("gstRate"));
    }
}
