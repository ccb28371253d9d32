use sqlx::PgConnection;
use tracing::instrument;

use crate::dao::crud::{self, Filter, ResourceTable, handle_database_error};
use crate::model::{
    apperror::ApplicationError,
    listing::ListQuery,
    packages::{Package, PackageInput},
};

/**
 * Descriptor for package rows. Only the two fee inputs are stored; derived
 * amounts are filled in by the service.
 */
pub const PACKAGE_TABLE: ResourceTable = ResourceTable {
    entity: "Package",
    base_table: "packages",
    from_clause: "packages p",
    select_columns: "p.id, p.name, p.description, p.basic_fees, p.gst_rate, p.duration_months, p.status, p.created_at, p.updated_at",
    id_column: "p.id",
    search_columns: &["p.name", "p.description"],
    sortable: &[("name", "p.name"), ("basicFees", "p.basic_fees"), ("durationMonths", "p.duration_months"), ("status", "p.status"), ("createdAt", "p.created_at")],
    default_order: "p.name ASC",
};

const ADD_PACKAGE: &str = "INSERT INTO packages (name, description, basic_fees, gst_rate, duration_months, status, created_at, updated_at) \
                           VALUES ($1, $2, $3, $4, $5, $6, now(), now()) RETURNING id";

const UPDATE_PACKAGE: &str = "UPDATE packages SET name = $1, description = $2, basic_fees = $3, gst_rate = $4, duration_months = $5, status = $6, updated_at = now() WHERE id = $7";

/**
 * DAO for package database operations.
 */
pub struct PackageDao {}

impl PackageDao {
    /**
     * Creates a new instance of `PackageDao`.
     */
    pub fn new() -> Self {
        PackageDao {}
    }

    /**
     * Retrieves one page of packages.
     */
    pub async fn list(&self, connection: &mut PgConnection, query: &ListQuery, status: Option<String>) -> Result<(Vec<Package>, i64), ApplicationError> {
        let filters: Vec<Filter> = status.map(|status| Filter::text("p.status", status)).into_iter().collect();
        crud::fetch_page(connection, &PACKAGE_TABLE, query, &filters).await
    }

    /**
     * Fetches a package by id.
     */
    pub async fn get(&self, connection: &mut PgConnection, id: i64) -> Result<Package, ApplicationError> {
        crud::fetch_by_id(connection, &PACKAGE_TABLE, id).await
    }

    /**
     * Inserts a new package.
     */
    #[instrument(skip(self, transaction, input), fields(result))]
    pub async fn add(&self, transaction: &mut PgConnection, input: &PackageInput) -> Result<i64, ApplicationError> {
        let id: (i64,) = sqlx::query_as(ADD_PACKAGE)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.basic_fees)
            .bind(input.gst_rate)
            .bind(input.duration_months)
            .bind(&input.status)
            .fetch_one(transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        Ok(id.0)
    }

    /**
     * Updates an existing package.
     */
    #[instrument(skip(self, transaction, input), fields(result))]
    pub async fn update(&self, transaction: &mut PgConnection, id: i64, input: &PackageInput) -> Result<(), ApplicationError> {
        let result = sqlx::query(UPDATE_PACKAGE)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.basic_fees)
            .bind(input.gst_rate)
            .bind(input.duration_months)
            .bind(&input.status)
            .bind(id)
            .execute(transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        if result.rows_affected() == 0 {
            return Err(ApplicationError::not_found("Package"));
        }
        Ok(())
    }

    /**
     * Deletes a package by id.
     */
    pub async fn delete(&self, transaction: &mut PgConnection, id: i64) -> Result<(), ApplicationError> {
        crud::delete_by_id(transaction, &PACKAGE_TABLE, id).await
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use super::*;
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_added_package_fetches_back_with_same_fields() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let package_dao = PackageDao::new();
        let input = PackageInput {
            name: "Gold membership".to_string(),
            description: Some("Annual plan".to_string()),
            basic_fees: Decimal::new(1550, 0),
            gst_rate: Decimal::new(18, 0),
            duration_months: 12,
            status: "active".to_string(),
        };
        let id = package_dao.add(&mut transaction, &input).await.unwrap();
        let fetched = package_dao.get(&mut transaction, id).await.unwrap();
        assert_eq!(fetched.name, input.name);
        assert_eq!(fetched.description, input.description);
        assert_eq!(fetched.basic_fees, input.basic_fees);
        assert_eq!(fetched.gst_rate, input.gst_rate);
        assert_eq!(fetched.duration_months, input.duration_months);
        assert_eq!(fetched.status, input.status);
        transaction.rollback().await.unwrap(); // Rollback the transaction to avoid leaving test data in the database
    }

    #[sqlx::test]
    async fn test_add_update_then_delete_package() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let package_dao = PackageDao::new();
        let input = PackageInput {
            name: "Silver membership".to_string(),
            description: None,
            basic_fees: Decimal::new(900, 0),
            gst_rate: Decimal::new(18, 0),
            duration_months: 6,
            status: "active".to_string(),
        };
        let id = package_dao.add(&mut transaction, &input).await.unwrap();
        let updated_input = PackageInput { basic_fees: Decimal::new(950, 0), ..input };
        package_dao.update(&mut transaction, id, &updated_input).await.unwrap();
        let fetched = package_dao.get(&mut transaction, id).await.unwrap();
        assert_eq!(fetched.basic_fees, Decimal::new(950, 0));

        let delete_result = package_dao.delete(&mut transaction, id).await;
        assert!(delete_result.is_ok());
        transaction.rollback().await.unwrap(); // Rollback the transaction to avoid leaving test data in the database
    }

    /**
     * Initialize the database connection pool.
     */
    async fn init_db() -> PgPool {
        dotenv::from_filename("./sqlx-postgresql-migration/.env-test").ok();
        let pool = PgPool::connect(dotenv::var("DATABASE_URL").unwrap().as_str()).await.unwrap();
        sqlx::migrate!("./sqlx-postgresql-migration/migrations").run(&pool).await.unwrap();
        pool
    }
}
