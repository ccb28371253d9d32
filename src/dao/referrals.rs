use chrono::NaiveDate;
use sqlx::PgConnection;
use tracing::instrument;

use crate::dao::crud::{self, Filter, ResourceTable, handle_database_error};
use crate::model::{
    apperror::{ApplicationError, ErrorType},
    listing::ListQuery,
    referrals::{Reference, ReferenceInput, ReferenceStatusEntry, Requirement, RequirementInput, ThankYouSlip, ThankYouSlipInput},
};

/**
 * Descriptor for reference rows. Giver and receiver display names come from
 * joining the members table twice.
 */
pub const REFERENCE_TABLE: ResourceTable = ResourceTable {
    entity: "Reference",
    base_table: "referrals",
    from_clause: "referrals r JOIN members g ON g.id = r.giver_id JOIN members rc ON rc.id = r.receiver_id",
    select_columns: "r.id, r.giver_id, g.first_name || ' ' || g.last_name AS giver_name, r.receiver_id, rc.first_name || ' ' || rc.last_name AS receiver_name, \
                     r.referral_name, r.mobile, r.email, r.address, r.urgency, r.status, r.comments, r.self_referral, r.created_at, r.updated_at",
    id_column: "r.id",
    search_columns: &["r.referral_name", "g.first_name", "g.last_name", "rc.first_name", "rc.last_name"],
    sortable: &[("referralName", "r.referral_name"), ("urgency", "r.urgency"), ("status", "r.status"), ("createdAt", "r.created_at")],
    default_order: "r.created_at DESC",
};

/**
 * Descriptor for thank-you slip rows.
 */
pub const THANKYOU_SLIP_TABLE: ResourceTable = ResourceTable {
    entity: "Thank-you slip",
    base_table: "thankyou_slips",
    from_clause: "thankyou_slips ts JOIN members g ON g.id = ts.giver_id JOIN members rc ON rc.id = ts.receiver_id",
    select_columns: "ts.id, ts.reference_id, ts.giver_id, g.first_name || ' ' || g.last_name AS giver_name, ts.receiver_id, rc.first_name || ' ' || rc.last_name AS receiver_name, \
                     ts.amount, ts.comment, ts.slip_date, ts.created_at, ts.updated_at",
    id_column: "ts.id",
    search_columns: &["g.first_name", "g.last_name", "rc.first_name", "rc.last_name", "ts.comment"],
    sortable: &[("amount", "ts.amount"), ("slipDate", "ts.slip_date"), ("createdAt", "ts.created_at")],
    default_order: "ts.slip_date DESC",
};

/**
 * Descriptor for requirement rows.
 */
pub const REQUIREMENT_TABLE: ResourceTable = ResourceTable {
    entity: "Requirement",
    base_table: "requirements",
    from_clause: "requirements rq JOIN members m ON m.id = rq.member_id",
    select_columns: "rq.id, rq.member_id, m.first_name || ' ' || m.last_name AS member_name, rq.text, rq.urgency, rq.status, rq.created_at, rq.updated_at",
    id_column: "rq.id",
    search_columns: &["rq.text", "m.first_name", "m.last_name"],
    sortable: &[("urgency", "rq.urgency"), ("status", "rq.status"), ("createdAt", "rq.created_at")],
    default_order: "rq.created_at DESC",
};

const ADD_REFERENCE: &str = "INSERT INTO referrals (giver_id, receiver_id, referral_name, mobile, email, address, urgency, status, comments, self_referral, created_at, updated_at) \
                             VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8, $9, now(), now()) RETURNING id";

const UPDATE_REFERENCE: &str = "UPDATE referrals SET receiver_id = $1, referral_name = $2, mobile = $3, email = $4, address = $5, urgency = $6, comments = $7, self_referral = $8, updated_at = now() WHERE id = $9";

const UPDATE_REFERENCE_STATUS: &str = "UPDATE referrals SET status = $1, updated_at = now() WHERE id = $2";

const ADD_STATUS_ENTRY: &str = "INSERT INTO referral_status_history (reference_id, status, entry_date, comment, created_at) VALUES ($1, $2, $3, $4, now())";

const QUERY_STATUS_HISTORY: &str = "SELECT id, reference_id, status, entry_date, comment, created_at FROM referral_status_history WHERE reference_id = $1 ORDER BY created_at, id";

const ADD_THANKYOU_SLIP: &str = "INSERT INTO thankyou_slips (reference_id, giver_id, receiver_id, amount, comment, slip_date, created_at, updated_at) \
                                 VALUES ($1, $2, $3, $4, $5, $6, now(), now()) RETURNING id";

const UPDATE_THANKYOU_SLIP: &str = "UPDATE thankyou_slips SET amount = $1, comment = $2, slip_date = $3, updated_at = now() WHERE id = $4";

const ADD_REQUIREMENT: &str = "INSERT INTO requirements (member_id, text, urgency, status, created_at, updated_at) VALUES ($1, $2, $3, $4, now(), now()) RETURNING id";

const UPDATE_REQUIREMENT: &str = "UPDATE requirements SET text = $1, urgency = $2, status = $3, updated_at = now() WHERE id = $4";

/**
 * DAO for reference, thank-you slip and requirement database operations.
 */
pub struct ReferralDao {}

impl ReferralDao {
    /**
     * Creates a new instance of `ReferralDao`.
     */
    pub fn new() -> Self {
        ReferralDao {}
    }

    /**
     * Retrieves one page of references. Giver/receiver scoping backs the
     * given/received views; status narrows by lifecycle state.
     */
    pub async fn list_references(
        &self,
        connection: &mut PgConnection,
        query: &ListQuery,
        giver_id: Option<i64>,
        receiver_id: Option<i64>,
        status: Option<String>,
    ) -> Result<(Vec<Reference>, i64), ApplicationError> {
        let mut filters: Vec<Filter> = Vec::new();
        if let Some(giver_id) = giver_id {
            filters.push(Filter::id("r.giver_id", giver_id));
        }
        if let Some(receiver_id) = receiver_id {
            filters.push(Filter::id("r.receiver_id", receiver_id));
        }
        if let Some(status) = status {
            filters.push(Filter::text("r.status", status));
        }
        crud::fetch_page(connection, &REFERENCE_TABLE, query, &filters).await
    }

    /**
     * Fetches a reference by id together with its status history.
     */
    pub async fn get_reference(&self, connection: &mut PgConnection, id: i64) -> Result<Reference, ApplicationError> {
        let mut reference = crud::fetch_by_id::<Reference>(&mut *connection, &REFERENCE_TABLE, id).await?;
        reference.status_history = self.get_status_history(connection, id).await?;
        Ok(reference)
    }

    /**
     * Loads the append-only status history for a reference.
     */
    pub async fn get_status_history(&self, connection: &mut PgConnection, reference_id: i64) -> Result<Vec<ReferenceStatusEntry>, ApplicationError> {
        sqlx::query_as(QUERY_STATUS_HISTORY)
            .bind(reference_id)
            .fetch_all(connection)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to fetch status history: {err}")))
    }

    /**
     * Inserts a new reference in pending status.
     *
     * # Returns
     * The id assigned to the new row.
     */
    #[instrument(skip(self, transaction, input), fields(result))]
    pub async fn add_reference(&self, transaction: &mut PgConnection, giver_id: i64, input: &ReferenceInput) -> Result<i64, ApplicationError> {
        let id: (i64,) = sqlx::query_as(ADD_REFERENCE)
            .bind(giver_id)
            .bind(input.receiver_id)
            .bind(&input.referral_name)
            .bind(&input.mobile)
            .bind(&input.email)
            .bind(&input.address)
            .bind(&input.urgency)
            .bind(&input.comments)
            .bind(input.self_referral)
            .fetch_one(transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        Ok(id.0)
    }

    /**
     * Updates an existing reference's editable fields. Status is never
     * touched here; transitions go through `transition_status`.
     */
    #[instrument(skip(self, transaction, input), fields(result))]
    pub async fn update_reference(&self, transaction: &mut PgConnection, id: i64, input: &ReferenceInput) -> Result<(), ApplicationError> {
        let result = sqlx::query(UPDATE_REFERENCE)
            .bind(input.receiver_id)
            .bind(&input.referral_name)
            .bind(&input.mobile)
            .bind(&input.email)
            .bind(&input.address)
            .bind(&input.urgency)
            .bind(&input.comments)
            .bind(input.self_referral)
            .bind(id)
            .execute(transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        if result.rows_affected() == 0 {
            return Err(ApplicationError::not_found("Reference"));
        }
        Ok(())
    }

    /**
     * Applies a status transition: updates the reference row and appends one
     * history entry. Runs inside the caller's transaction so the row and its
     * history never diverge.
     */
    #[instrument(skip(self, transaction, comment), fields(result))]
    pub async fn transition_status(&self, transaction: &mut PgConnection, id: i64, status: &str, entry_date: NaiveDate, comment: Option<&str>) -> Result<(), ApplicationError> {
        let result = sqlx::query(UPDATE_REFERENCE_STATUS)
            .bind(status)
            .bind(id)
            .execute(&mut *transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        if result.rows_affected() == 0 {
            return Err(ApplicationError::not_found("Reference"));
        }
        sqlx::query(ADD_STATUS_ENTRY)
            .bind(id)
            .bind(status)
            .bind(entry_date)
            .bind(comment)
            .execute(transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        Ok(())
    }

    /**
     * Deletes a reference and its history.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn delete_reference(&self, transaction: &mut PgConnection, id: i64) -> Result<(), ApplicationError> {
        sqlx::query("DELETE FROM referral_status_history WHERE reference_id = $1")
            .bind(id)
            .execute(&mut *transaction)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to delete status history: {err}")))?;
        crud::delete_by_id(transaction, &REFERENCE_TABLE, id).await
    }

    /**
     * Retrieves one page of thank-you slips.
     */
    pub async fn list_slips(&self, connection: &mut PgConnection, query: &ListQuery, giver_id: Option<i64>, receiver_id: Option<i64>) -> Result<(Vec<ThankYouSlip>, i64), ApplicationError> {
        let mut filters: Vec<Filter> = Vec::new();
        if let Some(giver_id) = giver_id {
            filters.push(Filter::id("ts.giver_id", giver_id));
        }
        if let Some(receiver_id) = receiver_id {
            filters.push(Filter::id("ts.receiver_id", receiver_id));
        }
        crud::fetch_page(connection, &THANKYOU_SLIP_TABLE, query, &filters).await
    }

    /**
     * Fetches a thank-you slip by id.
     */
    pub async fn get_slip(&self, connection: &mut PgConnection, id: i64) -> Result<ThankYouSlip, ApplicationError> {
        crud::fetch_by_id(connection, &THANKYOU_SLIP_TABLE, id).await
    }

    /**
     * Inserts a new thank-you slip.
     */
    #[instrument(skip(self, transaction, input), fields(result))]
    pub async fn add_slip(&self, transaction: &mut PgConnection, giver_id: i64, receiver_id: i64, input: &ThankYouSlipInput) -> Result<i64, ApplicationError> {
        let id: (i64,) = sqlx::query_as(ADD_THANKYOU_SLIP)
            .bind(input.reference_id)
            .bind(giver_id)
            .bind(receiver_id)
            .bind(input.amount)
            .bind(&input.comment)
            .bind(input.slip_date)
            .fetch_one(transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        Ok(id.0)
    }

    /**
     * Updates a thank-you slip's editable fields. The parties and the linked
     * reference are fixed at creation.
     */
    #[instrument(skip(self, transaction, input), fields(result))]
    pub async fn update_slip(&self, transaction: &mut PgConnection, id: i64, input: &ThankYouSlipInput) -> Result<(), ApplicationError> {
        let result = sqlx::query(UPDATE_THANKYOU_SLIP)
            .bind(input.amount)
            .bind(&input.comment)
            .bind(input.slip_date)
            .bind(id)
            .execute(transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        if result.rows_affected() == 0 {
            return Err(ApplicationError::not_found("Thank-you slip"));
        }
        Ok(())
    }

    /**
     * Deletes a thank-you slip by id.
     */
    pub async fn delete_slip(&self, transaction: &mut PgConnection, id: i64) -> Result<(), ApplicationError> {
        crud::delete_by_id(transaction, &THANKYOU_SLIP_TABLE, id).await
    }

    /**
     * Retrieves one page of requirements.
     */
    pub async fn list_requirements(
        &self,
        connection: &mut PgConnection,
        query: &ListQuery,
        member_id: Option<i64>,
        status: Option<String>,
        urgency: Option<String>,
    ) -> Result<(Vec<Requirement>, i64), ApplicationError> {
        let mut filters: Vec<Filter> = Vec::new();
        if let Some(member_id) = member_id {
            filters.push(Filter::id("rq.member_id", member_id));
        }
        if let Some(status) = status {
            filters.push(Filter::text("rq.status", status));
        }
        if let Some(urgency) = urgency {
            filters.push(Filter::text("rq.urgency", urgency));
        }
        crud::fetch_page(connection, &REQUIREMENT_TABLE, query, &filters).await
    }

    /**
     * Fetches a requirement by id.
     */
    pub async fn get_requirement(&self, connection: &mut PgConnection, id: i64) -> Result<Requirement, ApplicationError> {
        crud::fetch_by_id(connection, &REQUIREMENT_TABLE, id).await
    }

    /**
     * Inserts a new requirement for a member.
     */
    #[instrument(skip(self, transaction, input), fields(result))]
    pub async fn add_requirement(&self, transaction: &mut PgConnection, member_id: i64, input: &RequirementInput) -> Result<i64, ApplicationError> {
        let id: (i64,) = sqlx::query_as(ADD_REQUIREMENT)
            .bind(member_id)
            .bind(&input.text)
            .bind(&input.urgency)
            .bind(&input.status)
            .fetch_one(transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        Ok(id.0)
    }

    /**
     * Updates an existing requirement.
     */
    #[instrument(skip(self, transaction, input), fields(result))]
    pub async fn update_requirement(&self, transaction: &mut PgConnection, id: i64, input: &RequirementInput) -> Result<(), ApplicationError> {
        let result = sqlx::query(UPDATE_REQUIREMENT)
            .bind(&input.text)
            .bind(&input.urgency)
            .bind(&input.status)
            .bind(id)
            .execute(transaction)
            .await
            .map_err(|err| handle_database_error(err.as_database_error()))?;
        if result.rows_affected() == 0 {
            return Err(ApplicationError::not_found("Requirement"));
        }
        Ok(())
    }

    /**
     * Deletes a requirement by id.
     */
    pub async fn delete_requirement(&self, transaction: &mut PgConnection, id: i64) -> Result<(), ApplicationError> {
        crud::delete_by_id(transaction, &REQUIREMENT_TABLE, id).await
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use super::*;
    use crate::dao::members::MemberDao;
    use crate::model::members::MemberInput;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_add_reference_then_transition_status() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let referral_dao = ReferralDao::new();
        let member_dao = MemberDao::new();
        let giver_id = member_dao.add(&mut transaction, &member_input("giver@example.com")).await.unwrap();
        let receiver_id = member_dao.add(&mut transaction, &member_input("receiver@example.com")).await.unwrap();
        let reference_input = ReferenceInput {
            receiver_id,
            referral_name: "Test Referral".to_string(),
            mobile: "9876543210".to_string(),
            email: None,
            address: None,
            urgency: "within_week".to_string(),
            comments: None,
            self_referral: false,
        };
        let add_result = referral_dao.add_reference(&mut transaction, giver_id, &reference_input).await;
        assert!(add_result.is_ok());
        let id = add_result.unwrap();

        let transition_result = referral_dao.transition_status(&mut transaction, id, "contacted", chrono::Utc::now().date_naive(), Some("Called them")).await;
        assert!(transition_result.is_ok());

        let reference = referral_dao.get_reference(&mut transaction, id).await.unwrap();
        assert_eq!(reference.status, "contacted");
        assert_eq!(reference.status_history.len(), 1);
        transaction.rollback().await.unwrap(); // Rollback the transaction to avoid leaving test data in the database
    }

    #[sqlx::test]
    async fn test_add_then_delete_requirement() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let referral_dao = ReferralDao::new();
        let member_dao = MemberDao::new();
        let member_id = member_dao.add(&mut transaction, &member_input("member@example.com")).await.unwrap();
        let requirement_input = RequirementInput { text: "Looking for a supplier".to_string(), urgency: "within_week".to_string(), status: "open".to_string() };
        let add_result = referral_dao.add_requirement(&mut transaction, member_id, &requirement_input).await;
        assert!(add_result.is_ok());
        let delete_result = referral_dao.delete_requirement(&mut transaction, add_result.unwrap()).await;
        assert!(delete_result.is_ok());
        transaction.rollback().await.unwrap(); // Rollback the transaction to avoid leaving test data in the database
    }

    fn member_input(email: &str) -> MemberInput {
        MemberInput {
            chapter_id: None,
            first_name: "Test".to_string(),
            last_name: "Member".to_string(),
            email: email.to_string(),
            mobile: "9876543210".to_string(),
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
        }
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
