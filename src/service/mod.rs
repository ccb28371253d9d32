use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::pool::PoolConnection;
use sqlx::{Pool, Postgres, Transaction};

use crate::model::apperror::{ApplicationError, ErrorType};
use crate::model::listing::{ListQuery, Page};
use crate::service::cache::{EntityKind, ListCache};

pub mod cache;
pub mod meetings;
pub mod members;
pub mod packages;
pub mod powerteams;
pub mod referrals;
pub mod taxonomy;

/**
 * Acquires a connection for read operations.
 */
pub(crate) async fn acquire(connection_pool: &Pool<Postgres>) -> Result<PoolConnection<Postgres>, ApplicationError> {
    connection_pool
        .acquire()
        .await
        .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to acquire connection: {err}")))
}

/**
 * Begins a transaction for write operations.
 */
pub(crate) async fn begin(connection_pool: &Pool<Postgres>) -> Result<Transaction<'static, Postgres>, ApplicationError> {
    connection_pool
        .begin()
        .await
        .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to begin transaction: {err}")))
}

/**
 * Commits a transaction.
 */
pub(crate) async fn commit(transaction: Transaction<'static, Postgres>) -> Result<(), ApplicationError> {
    transaction
        .commit()
        .await
        .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to commit transaction: {err}")))
}

/**
 * Rolls a transaction back after a failed write.
 */
pub(crate) async fn rollback(transaction: Transaction<'static, Postgres>) -> Result<(), ApplicationError> {
    transaction
        .rollback()
        .await
        .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to rollback transaction: {err}")))
}

/**
 * Builds the cache key for a list query plus the endpoint's extra filters.
 * Every parameter that changes the result set must appear in the key.
 */
pub(crate) fn cache_key(query: &ListQuery, filters: &[(&str, Option<String>)]) -> String {
    let mut key = format!(
        "page={}&limit={}&sortBy={}&sortOrder={:?}&search={}",
        query.page,
        query.limit,
        query.sort_by.as_deref().unwrap_or(""),
        query.sort_order,
        query.search.as_deref().unwrap_or("")
    );
    for (name, value) in filters {
        if let Some(value) = value {
            key.push_str(&format!("&{name}={value}"));
        }
    }
    key
}

/**
 * Returns the cached page for the key when one is present under the current
 * generation.
 */
pub(crate) fn cache_lookup<T: DeserializeOwned>(cache: &ListCache, kind: EntityKind, key: &str) -> Option<Page<T>> {
    cache.get(kind, key).and_then(|value| serde_json::from_value(value).ok())
}

/**
 * Stores a freshly fetched page under the generation read before the fetch.
 */
pub(crate) fn cache_store<T: Serialize>(cache: &ListCache, kind: EntityKind, key: String, generation: u64, page: &Page<T>) {
    if let Ok(value) = serde_json::to_value(page) {
        cache.put(kind, key, generation, value);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cache_key_includes_filters() {
        let query = ListQuery::default();
        let with_status = cache_key(&query, &[("status", Some("active".to_string()))]);
        let without_status = cache_key(&query, &[("status", None)]);
        assert_ne!(with_status, without_status);
        assert!(with_status.ends_with("&status=active"));
    }

    #[test]
    fn test_cache_key_reflects_query() {
        let first = cache_key(&ListQuery::default(), &[]);
        let mut query = ListQuery::default();
        query.set_page(2);
        let second = cache_key(&query, &[]);
        assert_ne!(first, second);
    }
}
