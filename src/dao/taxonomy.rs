use sqlx::PgConnection;
use tracing::instrument;

use crate::dao::crud::{self, Filter, ResourceTable, handle_database_error};
use crate::model::{
    apperror::ApplicationError,
    listing::ListQuery,
    taxonomy::{Category, CategoryInput, State, StateInput, SubCategory, SubCategoryInput},
};

/**
 * Descriptor for category rows.
 */
pub const CATEGORY_TABLE: ResourceTable = ResourceTable {
    entity: "Category",
    base_table: "categories",
    from_clause: "categories c",
    select_columns: "c.id, c.name, c.description, c.status, c.created_at, c.updated_at",
    id_column: "c.id",
    search_columns: &["c.name", "c.description"],
    sortable: &[("name", "c.name"), ("status", "c.status"), ("createdAt", "c.created_at")],
    default_order: "c.name ASC",
};

/**
 * Descriptor for sub-category rows; list and detail rows embed the parent
 * category name.
 */
pub const SUBCATEGORY_TABLE: ResourceTable = ResourceTable {
    entity: "Sub category",
    base_table: "subcategories",
    from_clause: "subcategories s JOIN categories c ON c.id = s.category_id",
    select_columns: "s.id, s.category_id, c.name AS category_name, s.name, s.description, s.status, s.created_at, s.updated_at",
    id_column: "s.id",
    search_columns: &["s.name", "s.description", "c.name"],
    sortable: &[("name", "s.name"), ("categoryName", "c.name"), ("status", "s.status"), ("createdAt", "s.created_at")],
    default_order: "s.name ASC",
};

/**
 * Descriptor for state rows.
 */
pub const STATE_TABLE: ResourceTable = ResourceTable {
    entity: "State",
    base_table: "states",
    from_clause: "states st",
    select_columns: "st.id, st.name, st.code, st.created_at, st.updated_at",
    id_column: "st.id",
    search_columns: &["st.name", "st.code"],
    sortable: &[("name", "st.name"), ("code", "st.code")],
    default_order: "st.name ASC",
};

const ADD_CATEGORY: &str = "INSERT INTO categories (name, description, status, created_at, updated_at) VALUES ($1, $2, $3, now(), now()) RETURNING id";

const UPDATE_CATEGORY: &str = "UPDATE categories SET name = $1, description = $2, status = $3, updated_at = now() WHERE id = $4";

const ADD_SUBCATEGORY: &str = "INSERT INTO subcategories (category_id, name, description, status, created_at, updated_at) VALUES ($1, $2, $3, $4, now(), now()) RETURNING id";

const UPDATE_SUBCATEGORY: &str = "UPDATE subcategories SET category_id = $1, name = $2, description = $3, status = $4, updated_at = now() WHERE id = $5";

const ADD_STATE: &str = "INSERT INTO states (name, code, created_at, updated_at) VALUES ($1, $2, now(), now()) RETURNING id";

const UPDATE_STATE: &str = "UPDATE states SET name = $1, code = $2, updated_at = now() WHERE id = $3";

/**
 * DAO for category, sub-category and state database operations.
 */
pub struct TaxonomyDao {}

impl TaxonomyDao {
    /**
     * Creates a new instance of `TaxonomyDao`.
     */
    pub fn new() -> Self {
        TaxonomyDao {}
    }

    /**
     * Retrieves one page of categories.
     */
    pub async fn list_categories(&self, connection: &mut PgConnection, query: &ListQuery, status: Option<String>) -> Result<(Vec<Category>, i64), ApplicationError> {
        let filters: Vec<Filter> = status.map(|status| Filter::text("c.status", status)).into_iter().collect();
        crud::fetch_page(connection, &CATEGORY_TABLE, query, &filters).await
    }

    /**
     * Fetches a category by id.
     */
    pub async fn get_category(&self, connection: &mut PgConnection, id: i64) -> Result<Category, ApplicationError> {
        crud::fetch_by_id(connection, &CATEGORY_TABLE, id).await
    }

    /**
     * Inserts a new category.
     *
     * # Returns
     * The id assigned to the new row.
     */
    #[instrument(skip(self, transaction, input), fields(result))]
    pub async fn add_category(&self, transaction: &mut PgConnection, input: &CategoryInput) -> Result<i64, ApplicationError> {
        let id: (i64,) = sqlx::query_as(ADD_CATEGORY)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.status)
            .fetch_one(transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        Ok(id.0)
    }

    /**
     * Updates an existing category.
     */
    #[instrument(skip(self, transaction, input), fields(result))]
    pub async fn update_category(&self, transaction: &mut PgConnection, id: i64, input: &CategoryInput) -> Result<(), ApplicationError> {
        let result = sqlx::query(UPDATE_CATEGORY)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.status)
            .bind(id)
            .execute(transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        if result.rows_affected() == 0 {
            return Err(ApplicationError::not_found("Category"));
        }
        Ok(())
    }

    /**
     * Deletes a category by id.
     */
    pub async fn delete_category(&self, transaction: &mut PgConnection, id: i64) -> Result<(), ApplicationError> {
        crud::delete_by_id(transaction, &CATEGORY_TABLE, id).await
    }

    /**
     * Retrieves one page of sub categories, optionally scoped to a category.
     */
    pub async fn list_subcategories(&self, connection: &mut PgConnection, query: &ListQuery, category_id: Option<i64>, status: Option<String>) -> Result<(Vec<SubCategory>, i64), ApplicationError> {
        let mut filters: Vec<Filter> = Vec::new();
        if let Some(category_id) = category_id {
            filters.push(Filter::id("s.category_id", category_id));
        }
        if let Some(status) = status {
            filters.push(Filter::text("s.status", status));
        }
        crud::fetch_page(connection, &SUBCATEGORY_TABLE, query, &filters).await
    }

    /**
     * Fetches a sub category by id.
     */
    pub async fn get_subcategory(&self, connection: &mut PgConnection, id: i64) -> Result<SubCategory, ApplicationError> {
        crud::fetch_by_id(connection, &SUBCATEGORY_TABLE, id).await
    }

    /**
     * Inserts a new sub category.
     */
    #[instrument(skip(self, transaction, input), fields(result))]
    pub async fn add_subcategory(&self, transaction: &mut PgConnection, input: &SubCategoryInput) -> Result<i64, ApplicationError> {
        let id: (i64,) = sqlx::query_as(ADD_SUBCATEGORY)
            .bind(input.category_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.status)
            .fetch_one(transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        Ok(id.0)
    }

    /**
     * Updates an existing sub category.
     */
    #[instrument(skip(self, transaction, input), fields(result))]
    pub async fn update_subcategory(&self, transaction: &mut PgConnection, id: i64, input: &SubCategoryInput) -> Result<(), ApplicationError> {
        let result = sqlx::query(UPDATE_SUBCATEGORY)
            .bind(input.category_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.status)
            .bind(id)
            .execute(transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        if result.rows_affected() == 0 {
            return Err(ApplicationError::not_found("Sub category"));
        }
        Ok(())
    }

    /**
     * Deletes a sub category by id.
     */
    pub async fn delete_subcategory(&self, transaction: &mut PgConnection, id: i64) -> Result<(), ApplicationError> {
        crud::delete_by_id(transaction, &SUBCATEGORY_TABLE, id).await
    }

    /**
     * Retrieves one page of states.
     */
    pub async fn list_states(&self, connection: &mut PgConnection, query: &ListQuery) -> Result<(Vec<State>, i64), ApplicationError> {
        crud::fetch_page(connection, &STATE_TABLE, query, &[]).await
    }

    /**
     * Fetches a state by id.
     */
    pub async fn get_state(&self, connection: &mut PgConnection, id: i64) -> Result<State, ApplicationError> {
        crud::fetch_by_id(connection, &STATE_TABLE, id).await
    }

    /**
     * Inserts a new state.
     */
    #[instrument(skip(self, transaction, input), fields(result))]
    pub async fn add_state(&self, transaction: &mut PgConnection, input: &StateInput) -> Result<i64, ApplicationError> {
        let id: (i64,) = sqlx::query_as(ADD_STATE)
            .bind(&input.name)
            .bind(&input.code)
            .fetch_one(transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        Ok(id.0)
    }

    /**
     * Updates an existing state.
     */
    #[instrument(skip(self, transaction, input), fields(result))]
    pub async fn update_state(&self, transaction: &mut PgConnection, id: i64, input: &StateInput) -> Result<(), ApplicationError> {
        let result = sqlx::query(UPDATE_STATE)
            .bind(&input.name)
            .bind(&input.code)
            .bind(id)
            .execute(transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        if result.rows_affected() == 0 {
            return Err(ApplicationError::not_found("State"));
        }
        Ok(())
    }

    /**
     * Deletes a state by id.
     */
    pub async fn delete_state(&self, transaction: &mut PgConnection, id: i64) -> Result<(), ApplicationError> {
        crud::delete_by_id(transaction, &STATE_TABLE, id).await
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use super::*;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_get_category_list() {
        let pool = init_db().await;
        let taxonomy_dao = TaxonomyDao::new();
        let mut connection = pool.acquire().await.unwrap();
        let result = taxonomy_dao.list_categories(&mut connection, &ListQuery::default(), None).await;
        assert!(result.is_ok());
    }

    #[sqlx::test]
    async fn test_add_update_then_delete_category() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let taxonomy_dao = TaxonomyDao::new();
        let category_input = CategoryInput { name: "Test Category".to_string(), description: Some("Test description".to_string()), status: "active".to_string() };
        let add_result = taxonomy_dao.add_category(&mut transaction, &category_input).await;
        assert!(add_result.is_ok());
        let id = add_result.unwrap();

        let update_result = taxonomy_dao.update_category(&mut transaction, id, &category_input).await;
        assert!(update_result.is_ok());

        let delete_result = taxonomy_dao.delete_category(&mut transaction, id).await;
        assert!(delete_result.is_ok());
        transaction.rollback().await.unwrap(); // Rollback the transaction to avoid leaving test data in the database
    }

    #[sqlx::test]
    async fn test_add_subcategory_under_category() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let taxonomy_dao = TaxonomyDao::new();
        let category_input = CategoryInput { name: "Test Parent".to_string(), description: None, status: "active".to_string() };
        let category_id = taxonomy_dao.add_category(&mut transaction, &category_input).await.unwrap();
        let subcategory_input = SubCategoryInput { category_id, name: "Test Child".to_string(), description: None, status: "active".to_string() };
        let add_result = taxonomy_dao.add_subcategory(&mut transaction, &subcategory_input).await;
        assert!(add_result.is_ok());
        let fetched = taxonomy_dao.get_subcategory(&mut transaction, add_result.unwrap()).await;
        assert!(fetched.is_ok());
        assert_eq!(fetched.unwrap().category_name, "Test Parent");
        transaction.rollback().await.unwrap(); // Rollback the transaction to avoid leaving test data in the database
    }

    #[sqlx::test]
    async fn test_add_then_delete_state() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let taxonomy_dao = TaxonomyDao::new();
        let state_input = StateInput { name: "Test State".to_string(), code: "TS".to_string() };
        let add_result = taxonomy_dao.add_state(&mut transaction, &state_input).await;
        assert!(add_result.is_ok());
        let delete_result = taxonomy_dao.delete_state(&mut transaction, add_result.unwrap()).await;
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
