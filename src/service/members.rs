use std::sync::Arc;

use sqlx::{Pool, Postgres};

use crate::{
    dao::members::MemberDao,
    model::{
        apperror::{ApplicationError, ErrorType},
        listing::{ListQuery, Page},
        members::{Member, MemberInput, MemberStatusInput},
        session::SessionContext,
    },
    service::{
        acquire, begin, cache_key, cache_lookup, cache_store,
        cache::{EntityKind, ListCache},
        commit, rollback,
    },
};

/**
 * Represents the service for managing chapter members.
 */
pub struct MemberService {
    /**
     * The DAO for member operations.
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

impl MemberService {
    /**
     * Creates a new instance of `MemberService`.
     */
    pub fn new(member_dao: MemberDao, connection_pool: Option<Pool<Postgres>>, cache: Arc<ListCache>) -> Self {
        MemberService { member_dao, connection_pool, cache }
    }

    /**
     * Retrieves one page of members.
     */
    pub async fn get_member_list(
        &self,
        query: ListQuery,
        status: Option<String>,
        account_type: Option<String>,
        chapter_id: Option<i64>,
    ) -> Result<Page<Member>, ApplicationError> {
        let query = query.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let key = cache_key(
            &query,
            &[
                ("status", status.clone()),
                ("accountType", account_type.clone()),
                ("chapterId", chapter_id.map(|id| id.to_string())),
            ],
        );
        let generation = self.cache.generation(EntityKind::Member);
        if let Some(page) = cache_lookup(&self.cache, EntityKind::Member, &key) {
            return Ok(page);
        }
        let mut connection = acquire(connection_pool).await?;
        let (items, total) = self.member_dao.list(&mut connection, &query, status, account_type, chapter_id).await?;
        let page = Page::new(items, &query, total);
        cache_store(&self.cache, EntityKind::Member, key, generation, &page);
        Ok(page)
    }

    /**
     * Retrieves a single member by id.
     */
    pub async fn get_member(&self, id: i64) -> Result<Member, ApplicationError> {
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut connection = acquire(connection_pool).await?;
        self.member_dao.get(&mut connection, id).await
    }

    /**
     * Adds a new member and returns the stored entity.
     */
    pub async fn add_member(&self, input: MemberInput) -> Result<Member, ApplicationError> {
        let input = input.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        let id = match self.member_dao.add(&mut transaction, &input).await {
            Ok(id) => {
                commit(transaction).await?;
                id
            }
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        };
        self.cache.invalidate(EntityKind::Member);
        self.get_member(id).await
    }

    /**
     * Updates an existing member and returns the stored entity.
     */
    pub async fn update_member(&self, id: i64, input: MemberInput) -> Result<Member, ApplicationError> {
        let input = input.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        match self.member_dao.update(&mut transaction, id, &input).await {
            Ok(()) => commit(transaction).await?,
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        }
        self.cache.invalidate(EntityKind::Member);
        self.get_member(id).await
    }

    /**
     * Flips a member's active/inactive status. Restricted to administrators.
     */
    pub async fn update_member_status(&self, session: &SessionContext, id: i64, input: MemberStatusInput) -> Result<Member, ApplicationError> {
        session.require_admin()?;
        let input = input.validate()?;
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        match self.member_dao.update_status(&mut transaction, id, &input.status).await {
            Ok(()) => commit(transaction).await?,
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        }
        self.cache.invalidate(EntityKind::Member);
        self.get_member(id).await
    }

    /**
     * Deletes a member by id.
     */
    pub async fn delete_member(&self, id: i64) -> Result<(), ApplicationError> {
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut transaction = begin(connection_pool).await?;
        match self.member_dao.delete(&mut transaction, id).await {
            Ok(()) => commit(transaction).await?,
            Err(err) => {
                rollback(transaction).await?;
                return Err(err);
            }
        }
        self.cache.invalidate(EntityKind::Member);
        Ok(())
    }
}
