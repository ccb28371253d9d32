use sqlx::PgConnection;
use tracing::instrument;

use crate::dao::crud::{self, Filter, ResourceTable, handle_database_error};
use crate::model::{
    apperror::ApplicationError,
    listing::ListQuery,
    members::{Member, MemberInput},
};

/**
 * Descriptor for member rows.
 */
pub const MEMBER_TABLE: ResourceTable = ResourceTable {
    entity: "Member",
    base_table: "members",
    from_clause: "members m",
    select_columns: "m.id, m.chapter_id, m.first_name, m.last_name, m.email, m.mobile, m.business_name, m.category_id, m.gst_number, m.address, m.city, m.state_id, m.pincode, m.profile_picture, m.account_type, m.status, m.created_at, m.updated_at",
    id_column: "m.id",
    search_columns: &["m.first_name", "m.last_name", "m.email", "m.business_name"],
    sortable: &[
        ("firstName", "m.first_name"),
        ("lastName", "m.last_name"),
        ("email", "m.email"),
        ("businessName", "m.business_name"),
        ("status", "m.status"),
        ("createdAt", "m.created_at"),
    ],
    default_order: "m.first_name ASC, m.last_name ASC",
};

const ADD_MEMBER: &str = "INSERT INTO members (chapter_id, first_name, last_name, email, mobile, business_name, category_id, gst_number, address, city, state_id, pincode, profile_picture, account_type, status, created_at, updated_at) \
                          VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, now(), now()) RETURNING id";

const UPDATE_MEMBER: &str = "UPDATE members SET chapter_id = $1, first_name = $2, last_name = $3, email = $4, mobile = $5, business_name = $6, category_id = $7, gst_number = $8, address = $9, city = $10, state_id = $11, pincode = $12, profile_picture = $13, account_type = $14, status = $15, updated_at = now() WHERE id = $16";

const UPDATE_MEMBER_STATUS: &str = "UPDATE members SET status = $1, updated_at = now() WHERE id = $2";

/**
 * DAO for member database operations.
 */
pub struct MemberDao {}

impl MemberDao {
    /**
     * Creates a new instance of `MemberDao`.
     */
    pub fn new() -> Self {
        MemberDao {}
    }

    /**
     * Retrieves one page of members with the optional status, account type
     * and chapter filters.
     */
    pub async fn list(
        &self,
        connection: &mut PgConnection,
        query: &ListQuery,
        status: Option<String>,
        account_type: Option<String>,
        chapter_id: Option<i64>,
    ) -> Result<(Vec<Member>, i64), ApplicationError> {
        let mut filters: Vec<Filter> = Vec::new();
        if let Some(status) = status {
            filters.push(Filter::text("m.status", status));
        }
        if let Some(account_type) = account_type {
            filters.push(Filter::text("m.account_type", account_type));
        }
        if let Some(chapter_id) = chapter_id {
            filters.push(Filter::id("m.chapter_id", chapter_id));
        }
        crud::fetch_page(connection, &MEMBER_TABLE, query, &filters).await
    }

    /**
     * Fetches a member by id.
     */
    pub async fn get(&self, connection: &mut PgConnection, id: i64) -> Result<Member, ApplicationError> {
        crud::fetch_by_id(connection, &MEMBER_TABLE, id).await
    }

    /**
     * Inserts a new member.
     *
     * # Returns
     * The id assigned to the new row.
     */
    #[instrument(skip(self, transaction, input), fields(result))]
    pub async fn add(&self, transaction: &mut PgConnection, input: &MemberInput) -> Result<i64, ApplicationError> {
        let id: (i64,) = sqlx::query_as(ADD_MEMBER)
            .bind(input.chapter_id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(&input.mobile)
            .bind(&input.business_name)
            .bind(input.category_id)
            .bind(&input.gst_number)
            .bind(&input.address)
            .bind(&input.city)
            .bind(input.state_id)
            .bind(&input.pincode)
            .bind(&input.profile_picture)
            .bind(&input.account_type)
            .bind(&input.status)
            .fetch_one(transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        Ok(id.0)
    }

    /**
     * Updates an existing member.
     */
    #[instrument(skip(self, transaction, input), fields(result))]
    pub async fn update(&self, transaction: &mut PgConnection, id: i64, input: &MemberInput) -> Result<(), ApplicationError> {
        let result = sqlx::query(UPDATE_MEMBER)
            .bind(input.chapter_id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(&input.mobile)
            .bind(&input.business_name)
            .bind(input.category_id)
            .bind(&input.gst_number)
            .bind(&input.address)
            .bind(&input.city)
            .bind(input.state_id)
            .bind(&input.pincode)
            .bind(&input.profile_picture)
            .bind(&input.account_type)
            .bind(&input.status)
            .bind(id)
            .execute(transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        if result.rows_affected() == 0 {
            return Err(ApplicationError::not_found("Member"));
        }
        Ok(())
    }

    /**
     * Updates only a member's active/inactive status.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn update_status(&self, transaction: &mut PgConnection, id: i64, status: &str) -> Result<(), ApplicationError> {
        let result = sqlx::query(UPDATE_MEMBER_STATUS)
            .bind(status)
            .bind(id)
            .execute(transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        if result.rows_affected() == 0 {
            return Err(ApplicationError::not_found("Member"));
        }
        Ok(())
    }

    /**
     * Deletes a member by id.
     */
    pub async fn delete(&self, transaction: &mut PgConnection, id: i64) -> Result<(), ApplicationError> {
        crud::delete_by_id(transaction, &MEMBER_TABLE, id).await
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use super::*;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_added_member_fetches_back_with_same_fields() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let member_dao = MemberDao::new();
        let input = MemberInput {
            chapter_id: None,
            first_name: "Asha".to_string(),
            last_name: "Patel".to_string(),
            email: "asha.patel@example.com".to_string(),
            mobile: "9876543210".to_string(),
            business_name: Some("Patel Interiors".to_string()),
            category_id: None,
            gst_number: None,
            address: Some("12 MG Road".to_string()),
            city: Some("Pune".to_string()),
            state_id: None,
            pincode: Some("411001".to_string()),
            profile_picture: None,
            account_type: "member".to_string(),
            status: "active".to_string(),
        };
        let id = member_dao.add(&mut transaction, &input).await.unwrap();
        let fetched = member_dao.get(&mut transaction, id).await.unwrap();
        assert_eq!(fetched.first_name, input.first_name);
        assert_eq!(fetched.last_name, input.last_name);
        assert_eq!(fetched.email, input.email);
        assert_eq!(fetched.mobile, input.mobile);
        assert_eq!(fetched.business_name, input.business_name);
        assert_eq!(fetched.address, input.address);
        assert_eq!(fetched.city, input.city);
        assert_eq!(fetched.pincode, input.pincode);
        assert_eq!(fetched.account_type, input.account_type);
        assert_eq!(fetched.status, input.status);
        transaction.rollback().await.unwrap(); // Rollback the transaction to avoid leaving test data in the database
    }

    #[sqlx::test]
    async fn test_status_update_leaves_other_fields_untouched() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let member_dao = MemberDao::new();
        let input = MemberInput {
            chapter_id: None,
            first_name: "Ravi".to_string(),
            last_name: "Shah".to_string(),
            email: "ravi.shah@example.com".to_string(),
            mobile: "9876500000".to_string(),
            business_name: None,
            category_id: None,
            gst_number: None,
            address: None,
            city: None,
            state_id: None,
            pincode: None,
            profile_picture: None,
            account_type: "member".to_string(),
            status: "active".to_string(),
        };
        let id = member_dao.add(&mut transaction, &input).await.unwrap();
        member_dao.update_status(&mut transaction, id, "inactive").await.unwrap();
        let fetched = member_dao.get(&mut transaction, id).await.unwrap();
        assert_eq!(fetched.status, "inactive");
        assert_eq!(fetched.email, input.email);
        assert_eq!(fetched.mobile, input.mobile);
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
