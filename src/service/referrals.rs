use std::sync::Arc;

use sqlx::{Pool, Postgres};

use crate::{
    dao::{members::MemberDao, referrals::ReferralDao},
    model::{
        apperror::{ApplicationError, BusinessRule, ErrorType},
        listing::{ListQuery, Page},
        referrals::{Reference, ReferenceInput, ReferenceStatusInput, Requirement, RequirementInput, ThankYouSlip, ThankYouSlipInput},
        session::SessionContext,
        status::ReferenceStatus,
    },
    service::{
        acquire, begin, cache_key, cache_lookup, cache_store,
        cache::{EntityKind, ListCache},
        commit, rollback,
    },
};

/**
 * Represents the service for the referral workflow: references passed
 * between members, the thank-you slips closing them and member requirements.
 *
 * The status of a reference belongs to its receiver; the giver owns the rest
 * of the record. Every ownership rule is enforced here against the session,
 * never in the HTTP layer.
 */
pub struct ReferralService {
    /**
     * The DAO for referral operations.
     */
    referral_dao: ReferralDao,
    /**
     * The DAO for member lookups, used to fill self-referral contact fields.
     */
    member_dao: MemberDao,
    /**
     * Optional connection pool for database operations. Optional for test purposes until we have a better way to mock the database.
     */
    connection_pool: Option<Pool<Postgres>>,
    /**
     * Shared list cache.
     */
    cache: Arc<ListCache>,
}

impl ReferralService {
    /**
     * Creates a new instance of `ReferralService`.
     */
    pub fn new(referral_dao: ReferralDao, member_dao: MemberDao, connection_pool: Option<Pool<Postgres>>, cache: Arc<ListCache>) -> Self {
        ReferralService { referral_dao, member_dao, connection_pool, cache }
    }

    /**
     * Retrieves one page of references. Giver/receiver scoping drives the
     * given and received views.
     */
    pub async fn get_reference_list(
        &self,
        query: ListQuery,
        giver_id: Option<i64>,
        receiver_id: Option<i64>,
        status: Option<String>,
    ) -> Result<Page<Reference>, ApplicationError> {
        let query = query.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let key = cache_key(
            &query,
            &[
                ("giverId", giver_id.map(|id| id.to_string())),
                ("receiverId", receiver_id.map(|id| id.to_string())),
                ("status", status.clone()),
            ],
        );
        let generation = self.cache.generation(EntityKind::Reference);
        if let Some(page) = cache_lookup(&self.cache, EntityKind::Reference, &key) {
            return Ok(page);
        }
        let mut connection = acquire(connection_pool).await?;
        let (items, total) = self.referral_dao.list_references(&mut connection, &query, giver_id, receiver_id, status).await?;
        let page = Page::new(items, &query, total);
        cache_store(&self.cache, EntityKind::Reference, key, generation, &page);
        Ok(page)
    }

    /**
     * Retrieves a single reference by id with its status history.
     */
    pub async fn get_reference(&self, id: i64) -> Result<Reference, ApplicationError> {
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut connection = acquire(connection_pool).await?;
        self.referral_dao.get_reference(&mut connection, id).await
    }

    /**
     * Adds a new reference given by the caller. For a self-referral the
     * referral contact fields are filled from the caller's own member record.
     */
    pub async fn add_reference(&self, session: &SessionContext, input: ReferenceInput) -> Result<Reference, ApplicationError> {
        let mut input = input.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        if input.self_referral {
            let mut connection = acquire(connection_pool).await?;
            let giver = self.member_dao.get(&mut connection, session.member_id).await?;
            input.referral_name = format!("{} {}", giver.first_name, giver.last_name);
            input.mobile = giver.mobile;
            if input.email.is_none() {
                input.email = Some(giver.email);
            }
        }
        let mut transaction = begin(connection_pool).await?;
        let id = match self.referral_dao.add_reference(&mut transaction, session.member_id, &input).await {
            Ok(id) => {
                commit(transaction).await?;
                id
            }
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        };
        self.cache.invalidate(EntityKind::Reference);
        self.get_reference(id).await
    }

    /**
     * Updates a reference's editable fields. Only the giver (or an
     * administrator) may edit; the status field is out of reach here.
     */
    pub async fn update_reference(&self, session: &SessionContext, id: i64, input: ReferenceInput) -> Result<Reference, ApplicationError> {
        let input = input.validate()?;
        let existing = self.get_reference(id).await?;
        session.require_member(existing.giver_id)?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        match self.referral_dao.update_reference(&mut transaction, id, &input).await {
            Ok(()) => commit(transaction).await?,
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        }
        self.cache.invalidate(EntityKind::Reference);
        self.get_reference(id).await
    }

    /**
     * Applies a status transition requested by the receiver. The backend is
     * the sole authority on allowed transitions: terminal states are locked
     * and the history gains exactly one entry per accepted transition.
     */
    pub async fn transition_reference_status(&self, session: &SessionContext, id: i64, input: ReferenceStatusInput) -> Result<Reference, ApplicationError> {
        let input = input.validate()?;
        let existing = self.get_reference(id).await?;
        if session.member_id != existing.receiver_id {
            return Err(ApplicationError::new(ErrorType::Authorization, "Only the receiver can update the reference status".to_string()));
        }
        let current = ReferenceStatus::parse(&existing.status)?;
        current.check_transition(input.status)?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        match self.referral_dao.transition_status(&mut transaction, id, input.status.as_str(), input.date, input.comment.as_deref()).await {
            Ok(()) => commit(transaction).await?,
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        }
        self.cache.invalidate(EntityKind::Reference);
        self.get_reference(id).await
    }

    /**
     * Deletes a reference. Only the giver (or an administrator) may delete.
     */
    pub async fn delete_reference(&self, session: &SessionContext, id: i64) -> Result<(), ApplicationError> {
        let existing = self.get_reference(id).await?;
        session.require_member(existing.giver_id)?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        match self.referral_dao.delete_reference(&mut transaction, id).await {
            Ok(()) => commit(transaction).await?,
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        }
        self.cache.invalidate(EntityKind::Reference);
        Ok(())
    }

    /**
     * Retrieves one page of thank-you slips.
     */
    pub async fn get_slip_list(&self, query: ListQuery, giver_id: Option<i64>, receiver_id: Option<i64>) -> Result<Page<ThankYouSlip>, ApplicationError> {
        let query = query.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let key = cache_key(&query, &[("giverId", giver_id.map(|id| id.to_string())), ("receiverId", receiver_id.map(|id| id.to_string()))]);
        let generation = self.cache.generation(EntityKind::ThankYouSlip);
        if let Some(page) = cache_lookup(&self.cache, EntityKind::ThankYouSlip, &key) {
            return Ok(page);
        }
        let mut connection = acquire(connection_pool).await?;
        let (items, total) = self.referral_dao.list_slips(&mut connection, &query, giver_id, receiver_id).await?;
        let page = Page::new(items, &query, total);
        cache_store(&self.cache, EntityKind::ThankYouSlip, key, generation, &page);
        Ok(page)
    }

    /**
     * Retrieves a single thank-you slip by id.
     */
    pub async fn get_slip(&self, id: i64) -> Result<ThankYouSlip, ApplicationError> {
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut connection = acquire(connection_pool).await?;
        self.referral_dao.get_slip(&mut connection, id).await
    }

    /**
     * Adds a thank-you slip given by the caller. When the slip names a
     * reference, that reference must have reached business done, the caller
     * must be its receiver, and the thanked member is its giver.
     */
    pub async fn add_slip(&self, session: &SessionContext, input: ThankYouSlipInput) -> Result<ThankYouSlip, ApplicationError> {
        let input = input.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let receiver_id = match input.reference_id {
            Some(reference_id) => {
                let reference = self.get_reference(reference_id).await?;
                if ReferenceStatus::parse(&reference.status)? != ReferenceStatus::BusinessDone {
                    return Err(ApplicationError::new(
                        ErrorType::BusinessRule(BusinessRule::ReferenceNotConverted),
                        "Reference has not reached business done".to_string(),
                    ));
                }
                if session.member_id != reference.receiver_id {
                    return Err(ApplicationError::new(ErrorType::Authorization, "Only the reference receiver can thank for it".to_string()));
                }
                reference.giver_id
            }
            None => input
                .receiver_id
                .ok_or_else(|| ApplicationError::new(ErrorType::Validation, "receiverId is required when no reference is given".to_string()))?,
        };
        let mut transaction = begin(connection_pool).await?;
        let id = match self.referral_dao.add_slip(&mut transaction, session.member_id, receiver_id, &input).await {
            Ok(id) => {
                commit(transaction).await?;
                id
            }
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        };
        self.cache.invalidate(EntityKind::ThankYouSlip);
        self.get_slip(id).await
    }

    /**
     * Updates a thank-you slip's editable fields. Only the slip's giver (or
     * an administrator) may edit.
     */
    pub async fn update_slip(&self, session: &SessionContext, id: i64, input: ThankYouSlipInput) -> Result<ThankYouSlip, ApplicationError> {
        let input = input.validate()?;
        let existing = self.get_slip(id).await?;
        session.require_member(existing.giver_id)?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        match self.referral_dao.update_slip(&mut transaction, id, &input).await {
            Ok(()) => commit(transaction).await?,
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        }
        self.cache.invalidate(EntityKind::ThankYouSlip);
        self.get_slip(id).await
    }

    /**
     * Deletes a thank-you slip. Only the slip's giver (or an administrator)
     * may delete.
     */
    pub async fn delete_slip(&self, session: &SessionContext, id: i64) -> Result<(), ApplicationError> {
        let existing = self.get_slip(id).await?;
        session.require_member(existing.giver_id)?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        match self.referral_dao.delete_slip(&mut transaction, id).await {
            Ok(()) => commit(transaction).await?,
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        }
        self.cache.invalidate(EntityKind::ThankYouSlip);
        Ok(())
    }

    /**
     * Retrieves one page of requirements.
     */
    pub async fn get_requirement_list(
        &self,
        query: ListQuery,
        member_id: Option<i64>,
        status: Option<String>,
        urgency: Option<String>,
    ) -> Result<Page<Requirement>, ApplicationError> {
        let query = query.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let key = cache_key(&query, &[("memberId", member_id.map(|id| id.to_string())), ("status", status.clone()), ("urgency", urgency.clone())]);
        let generation = self.cache.generation(EntityKind::Requirement);
        if let Some(page) = cache_lookup(&self.cache, EntityKind::Requirement, &key) {
            return Ok(page);
        }
        let mut connection = acquire(connection_pool).await?;
        let (items, total) = self.referral_dao.list_requirements(&mut connection, &query, member_id, status, urgency).await?;
        let page = Page::new(items, &query, total);
        cache_store(&self.cache, EntityKind::Requirement, key, generation, &page);
        Ok(page)
    }

    /**
     * Retrieves a single requirement by id.
     */
    pub async fn get_requirement(&self, id: i64) -> Result<Requirement, ApplicationError> {
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut connection = acquire(connection_pool).await?;
        self.referral_dao.get_requirement(&mut connection, id).await
    }

    /**
     * Adds a requirement owned by the caller.
     */
    pub async fn add_requirement(&self, session: &SessionContext, input: RequirementInput) -> Result<Requirement, ApplicationError> {
        let input = input.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        let id = match self.referral_dao.add_requirement(&mut transaction, session.member_id, &input).await {
            Ok(id) => {
                commit(transaction).await?;
                id
            }
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        };
        self.cache.invalidate(EntityKind::Requirement);
        self.get_requirement(id).await
    }

    /**
     * Updates a requirement. Only its owner (or an administrator) may edit.
     */
    pub async fn update_requirement(&self, session: &SessionContext, id: i64, input: RequirementInput) -> Result<Requirement, ApplicationError> {
        let input = input.validate()?;
        let existing = self.get_requirement(id).await?;
        session.require_member(existing.member_id)?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        match self.referral_dao.update_requirement(&mut transaction, id, &input).await {
            Ok(()) => commit(transaction).await?,
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        }
        self.cache.invalidate(EntityKind::Requirement);
        self.get_requirement(id).await
    }

    /**
     * Deletes a requirement. Only its owner (or an administrator) may delete.
     */
    pub async fn delete_requirement(&self, session: &SessionContext, id: i64) -> Result<(), ApplicationError> {
        let existing = self.get_requirement(id).await?;
        session.require_member(existing.member_id)?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        match self.referral_dao.delete_requirement(&mut transaction, id).await {
            Ok(()) => commit(transaction).await?,
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        }
        self.cache.invalidate(EntityKind::Requirement);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;

    fn service() -> ReferralService {
        ReferralService::new(ReferralDao::new(), MemberDao::new(), None, Arc::new(ListCache::new()))
    }

    fn session() -> SessionContext {
        SessionContext { member_id: 3, name: "Asha Patel".to_string(), admin: false }
    }

    #[tokio::test]
    async fn test_reference_validation_runs_before_data_access() {
        let input = ReferenceInput {
            receiver_id: 0,
            referral_name: String::new(),
            mobile: String::new(),
            email: None,
            address: None,
            urgency: "someday".to_string(),
            comments: None,
            self_referral: false,
        };
        let error = service().add_reference(&session(), input).await.unwrap_err();
        assert_eq!(error.error_type, ErrorType::Validation);
    }

    #[tokio::test]
    async fn test_status_input_rejects_pending_before_data_access() {
        let input = ReferenceStatusInput { status: ReferenceStatus::Pending, date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(), comment: None };
        let error = service().transition_reference_status(&session(), 1, input).await.unwrap_err();
        assert_eq!(error.error_type, ErrorType::Validation);
    }

    #[tokio::test]
    async fn test_slip_validation_runs_before_data_access() {
        let input = ThankYouSlipInput {
            reference_id: None,
            receiver_id: None,
            amount: Decimal::ZERO,
            comment: None,
            slip_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
        };
        let error = service().add_slip(&session(), input).await.unwrap_err();
        assert_eq!(error.error_type, ErrorType::Validation);
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    use super::*;
    use crate::model::members::MemberInput;

    #[sqlx::test]
    async fn test_status_transition_restricted_to_receiver() {
        let pool = init_db().await;
        let (giver_id, receiver_id) = add_members(&pool).await;
        let service = service(&pool);
        let giver = session(giver_id);
        let receiver = session(receiver_id);
        let reference = service.add_reference(&giver, reference_input(receiver_id)).await.unwrap();

        let error = service.transition_reference_status(&giver, reference.id, transition_input(ReferenceStatus::Contacted)).await.unwrap_err();
        assert_eq!(error.error_type, ErrorType::Authorization);
        let unchanged = service.get_reference(reference.id).await.unwrap();
        assert_eq!(unchanged.status, "pending");
        assert!(unchanged.status_history.is_empty());

        let updated = service.transition_reference_status(&receiver, reference.id, transition_input(ReferenceStatus::Contacted)).await.unwrap();
        assert_eq!(updated.status, "contacted");
        assert_eq!(updated.status_history.len(), 1);

        service.delete_reference(&giver, reference.id).await.unwrap();
        remove_members(&pool, &[giver_id, receiver_id]).await;
    }

    #[sqlx::test]
    async fn test_slip_rejected_until_reference_reaches_business_done() {
        let pool = init_db().await;
        let (giver_id, receiver_id) = add_members(&pool).await;
        let service = service(&pool);
        let giver = session(giver_id);
        let receiver = session(receiver_id);
        let reference = service.add_reference(&giver, reference_input(receiver_id)).await.unwrap();

        let error = service.add_slip(&receiver, slip_input(reference.id)).await.unwrap_err();
        assert_eq!(error.error_type, ErrorType::BusinessRule(BusinessRule::ReferenceNotConverted));

        service.transition_reference_status(&receiver, reference.id, transition_input(ReferenceStatus::Contacted)).await.unwrap();
        service.transition_reference_status(&receiver, reference.id, transition_input(ReferenceStatus::BusinessDone)).await.unwrap();
        let slip = service.add_slip(&receiver, slip_input(reference.id)).await.unwrap();
        assert_eq!(slip.giver_id, receiver_id);
        assert_eq!(slip.receiver_id, giver_id);

        service.delete_slip(&receiver, slip.id).await.unwrap();
        service.delete_reference(&giver, reference.id).await.unwrap();
        remove_members(&pool, &[giver_id, receiver_id]).await;
    }

    fn service(pool: &PgPool) -> ReferralService {
        ReferralService::new(ReferralDao::new(), MemberDao::new(), Some(pool.clone()), Arc::new(ListCache::new()))
    }

    fn session(member_id: i64) -> SessionContext {
        SessionContext { member_id, name: "Test Member".to_string(), admin: false }
    }

    fn reference_input(receiver_id: i64) -> ReferenceInput {
        ReferenceInput {
            receiver_id,
            referral_name: "Test Referral".to_string(),
            mobile: "9876543210".to_string(),
            email: None,
            address: None,
            urgency: "within_week".to_string(),
            comments: None,
            self_referral: false,
        }
    }

    fn transition_input(status: ReferenceStatus) -> ReferenceStatusInput {
        ReferenceStatusInput { status, date: NaiveDate::from_ymd_opt(2026, 8, 20).unwrap(), comment: Some("Spoke on the phone".to_string()) }
    }

    fn slip_input(reference_id: i64) -> ThankYouSlipInput {
        ThankYouSlipInput {
            reference_id: Some(reference_id),
            receiver_id: None,
            amount: Decimal::new(5000, 0),
            comment: None,
            slip_date: NaiveDate::from_ymd_opt(2026, 8, 21).unwrap(),
        }
    }

    async fn add_members(pool: &PgPool) -> (i64, i64) {
        let mut transaction = pool.begin().await.unwrap();
        let member_dao = MemberDao::new();
        let giver_id = member_dao.add(&mut transaction, &member_input()).await.unwrap();
        let receiver_id = member_dao.add(&mut transaction, &member_input()).await.unwrap();
        transaction.commit().await.unwrap();
        (giver_id, receiver_id)
    }

    fn member_input() -> MemberInput {
        // The service commits its own transactions, so the test data is real
        // rows. A unique email keeps repeated runs off the unique constraint.
        MemberInput {
            chapter_id: None,
            first_name: "Test".to_string(),
            last_name: "Member".to_string(),
            email: format!("member-{}@example.com", uuid::Uuid::new_v4()),
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

    async fn remove_members(pool: &PgPool, ids: &[i64]) {
        let mut transaction = pool.begin().await.unwrap();
        let member_dao = MemberDao::new();
        for id in ids {
            member_dao.delete(&mut transaction, *id).await.unwrap();
        }
        transaction.commit().await.unwrap();
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
