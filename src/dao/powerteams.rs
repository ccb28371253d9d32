use std::collections::HashMap;

use sqlx::PgConnection;
use tracing::instrument;

use crate::dao::crud::{self, Filter, ResourceTable, handle_database_error};
use crate::model::{
    apperror::{ApplicationError, ErrorType},
    listing::ListQuery,
    powerteams::{PowerTeam, PowerTeamInput},
};

/**
 * Descriptor for power team rows. Linked category/sub-category ids live in
 * join tables and are stitched on after fetching.
 */
pub const POWERTEAM_TABLE: ResourceTable = ResourceTable {
    entity: "Power team",
    base_table: "powerteams",
    from_clause: "powerteams pt",
    select_columns: "pt.id, pt.name, pt.description, pt.status, pt.created_at, pt.updated_at",
    id_column: "pt.id",
    search_columns: &["pt.name", "pt.description"],
    sortable: &[("name", "pt.name"), ("status", "pt.status"), ("createdAt", "pt.created_at")],
    default_order: "pt.name ASC",
};

const ADD_POWERTEAM: &str = "INSERT INTO powerteams (name, description, status, created_at, updated_at) VALUES ($1, $2, $3, now(), now()) RETURNING id";

const UPDATE_POWERTEAM: &str = "UPDATE powerteams SET name = $1, description = $2, status = $3, updated_at = now() WHERE id = $4";

const ADD_CATEGORY_LINK: &str = "INSERT INTO powerteam_categories (powerteam_id, category_id) VALUES ($1, $2)";

const ADD_SUBCATEGORY_LINK: &str = "INSERT INTO powerteam_subcategories (powerteam_id, subcategory_id) VALUES ($1, $2)";

const DELETE_CATEGORY_LINKS: &str = "DELETE FROM powerteam_categories WHERE powerteam_id = $1";

const DELETE_SUBCATEGORY_LINKS: &str = "DELETE FROM powerteam_subcategories WHERE powerteam_id = $1";

const QUERY_CATEGORY_LINKS: &str = "SELECT powerteam_id, category_id FROM powerteam_categories WHERE powerteam_id = ANY($1) ORDER BY category_id";

const QUERY_SUBCATEGORY_LINKS: &str = "SELECT powerteam_id, subcategory_id FROM powerteam_subcategories WHERE powerteam_id = ANY($1) ORDER BY subcategory_id";

/**
 * DAO for power team database operations.
 */
pub struct PowerTeamDao {}

impl PowerTeamDao {
    /**
     * Creates a new instance of `PowerTeamDao`.
     */
    pub fn new() -> Self {
        PowerTeamDao {}
    }

    /**
     * Retrieves one page of power teams with their linked ids stitched on.
     */
    pub async fn list(&self, connection: &mut PgConnection, query: &ListQuery, status: Option<String>) -> Result<(Vec<PowerTeam>, i64), ApplicationError> {
        let filters: Vec<Filter> = status.map(|status| Filter::text("pt.status", status)).into_iter().collect();
        let (rows, total) = crud::fetch_page::<PowerTeam>(&mut *connection, &POWERTEAM_TABLE, query, &filters).await?;
        let rows = self.attach_links(connection, rows).await?;
        Ok((rows, total))
    }

    /**
     * Fetches a power team by id with its linked ids.
     */
    pub async fn get(&self, connection: &mut PgConnection, id: i64) -> Result<PowerTeam, ApplicationError> {
        let row = crud::fetch_by_id::<PowerTeam>(&mut *connection, &POWERTEAM_TABLE, id).await?;
        let mut rows = self.attach_links(connection, vec![row]).await?;
        rows.pop().ok_or_else(|| ApplicationError::not_found("Power team"))
    }

    /**
     * Inserts a new power team and its links.
     *
     * # Returns
     * The id assigned to the new row.
     */
    #[instrument(skip(self, transaction, input), fields(result))]
    pub async fn add(&self, transaction: &mut PgConnection, input: &PowerTeamInput) -> Result<i64, ApplicationError> {
        let id: (i64,) = sqlx::query_as(ADD_POWERTEAM)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.status)
            .fetch_one(&mut *transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        self.insert_links(transaction, id.0, input).await?;
        Ok(id.0)
    }

    /**
     * Updates an existing power team, replacing its links wholesale.
     */
    #[instrument(skip(self, transaction, input), fields(result))]
    pub async fn update(&self, transaction: &mut PgConnection, id: i64, input: &PowerTeamInput) -> Result<(), ApplicationError> {
        let result = sqlx::query(UPDATE_POWERTEAM)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.status)
            .bind(id)
            .execute(&mut *transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        if result.rows_affected() == 0 {
            return Err(ApplicationError::not_found("Power team"));
        }
        self.delete_links(transaction, id).await?;
        self.insert_links(transaction, id, input).await?;
        Ok(())
    }

    /**
     * Deletes a power team and its links.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn delete(&self, transaction: &mut PgConnection, id: i64) -> Result<(), ApplicationError> {
        self.delete_links(transaction, id).await?;
        crud::delete_by_id(transaction, &POWERTEAM_TABLE, id).await
    }

    /**
     * Loads the join rows for the given power teams and stitches the linked
     * ids onto each row.
     */
    async fn attach_links(&self, connection: &mut PgConnection, mut rows: Vec<PowerTeam>) -> Result<Vec<PowerTeam>, ApplicationError> {
        if rows.is_empty() {
            return Ok(rows);
        }
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let category_links: Vec<(i64, i64)> = sqlx::query_as(QUERY_CATEGORY_LINKS)
            .bind(&ids)
            .fetch_all(&mut *connection)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to fetch power team category links: {err}")))?;
        let subcategory_links: Vec<(i64, i64)> = sqlx::query_as(QUERY_SUBCATEGORY_LINKS)
            .bind(&ids)
            .fetch_all(connection)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to fetch power team sub category links: {err}")))?;
        let mut categories: HashMap<i64, Vec<i64>> = HashMap::new();
        for (powerteam_id, category_id) in category_links {
            categories.entry(powerteam_id).or_default().push(category_id);
        }
        let mut subcategories: HashMap<i64, Vec<i64>> = HashMap::new();
        for (powerteam_id, subcategory_id) in subcategory_links {
            subcategories.entry(powerteam_id).or_default().push(subcategory_id);
        }
        for row in &mut rows {
            row.category_ids = categories.remove(&row.id).unwrap_or_default();
            row.sub_category_ids = subcategories.remove(&row.id).unwrap_or_default();
        }
        Ok(rows)
    }

    async fn insert_links(&self, transaction: &mut PgConnection, id: i64, input: &PowerTeamInput) -> Result<(), ApplicationError> {
        for category_id in &input.category_ids {
            sqlx::query(ADD_CATEGORY_LINK)
                .bind(id)
                .bind(category_id)
                .execute(&mut *transaction)
                .await
                .map_err(|err| handle_database_error(err.as_database_error()))?;
        }
        for subcategory_id in &input.sub_category_ids {
            sqlx::query(ADD_SUBCATEGORY_LINK)
                .bind(id)
                .bind(subcategory_id)
                .execute(&mut *transaction)
                .await
                .map_err(|err| handle_database_error(err.as_database_error()))?;
        }
        Ok(())
    }

    async fn delete_links(&self, transaction: &mut PgConnection, id: i64) -> Result<(), ApplicationError> {
        sqlx::query(DELETE_CATEGORY_LINKS)
            .bind(id)
            .execute(&mut *transaction)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to delete power team category links: {err}")))?;
        sqlx::query(DELETE_SUBCATEGORY_LINKS)
            .bind(id)
            .execute(transaction)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to delete power team sub category links: {err}")))?;
        Ok(())
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use super::*;
    use crate::dao::taxonomy::TaxonomyDao;
    use crate::model::taxonomy::{CategoryInput, SubCategoryInput};
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_added_power_team_fetches_back_with_links() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let powerteam_dao = PowerTeamDao::new();
        let taxonomy_dao = TaxonomyDao::new();
        let category_input = CategoryInput { name: "Test Trades".to_string(), description: None, status: "active".to_string() };
        let category_id = taxonomy_dao.add_category(&mut transaction, &category_input).await.unwrap();
        let subcategory_input = SubCategoryInput { category_id, name: "Test Plumbing".to_string(), description: None, status: "active".to_string() };
        let subcategory_id = taxonomy_dao.add_subcategory(&mut transaction, &subcategory_input).await.unwrap();

        let input = PowerTeamInput {
            name: "Home services".to_string(),
            description: Some("Construction trades".to_string()),
            category_ids: vec![category_id],
            sub_category_ids: vec![subcategory_id],
            status: "active".to_string(),
        };
        let id = powerteam_dao.add(&mut transaction, &input).await.unwrap();
        let fetched = powerteam_dao.get(&mut transaction, id).await.unwrap();
        assert_eq!(fetched.name, input.name);
        assert_eq!(fetched.description, input.description);
        assert_eq!(fetched.status, input.status);
        assert_eq!(fetched.category_ids, vec![category_id]);
        assert_eq!(fetched.sub_category_ids, vec![subcategory_id]);
        transaction.rollback().await.unwrap(); // Rollback the transaction to avoid leaving test data in the database
    }

    #[sqlx::test]
    async fn test_update_replaces_links_wholesale() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let powerteam_dao = PowerTeamDao::new();
        let taxonomy_dao = TaxonomyDao::new();
        let first_id = taxonomy_dao
            .add_category(&mut transaction, &CategoryInput { name: "Test First".to_string(), description: None, status: "active".to_string() })
            .await
            .unwrap();
        let second_id = taxonomy_dao
            .add_category(&mut transaction, &CategoryInput { name: "Test Second".to_string(), description: None, status: "active".to_string() })
            .await
            .unwrap();

        let input = PowerTeamInput {
            name: "Professional services".to_string(),
            description: None,
            category_ids: vec![first_id],
            sub_category_ids: vec![],
            status: "active".to_string(),
        };
        let id = powerteam_dao.add(&mut transaction, &input).await.unwrap();
        let updated_input = PowerTeamInput { category_ids: vec![second_id], ..input };
        powerteam_dao.update(&mut transaction, id, &updated_input).await.unwrap();
        let fetched = powerteam_dao.get(&mut transaction, id).await.unwrap();
        assert_eq!(fetched.category_ids, vec![second_id]);
        assert!(fetched.sub_category_ids.is_empty());

        let delete_result = powerteam_dao.delete(&mut transaction, id).await;
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
