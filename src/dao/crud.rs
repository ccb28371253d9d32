use std::borrow::Cow;

use sqlx::{FromRow, PgConnection, Postgres, QueryBuilder, postgres::PgRow};
use tracing::instrument;

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    listing::ListQuery,
};

/**
 * Value of an entity-specific list filter.
 */
#[derive(Debug, Clone)]
pub enum FilterValue {
    I64(i64),
    Text(String),
}

/**
 * One equality filter applied to a list query, e.g. status or a foreign key.
 * Columns are compile-time constants supplied by the entity descriptors,
 * never user input.
 */
#[derive(Debug, Clone)]
pub struct Filter {
    pub column: &'static str,
    pub value: FilterValue,
}

impl Filter {
    /**
     * Creates an integer equality filter.
     */
    pub fn id(column: &'static str, value: i64) -> Self {
        Filter { column, value: FilterValue::I64(value) }
    }

    /**
     * Creates a text equality filter.
     */
    pub fn text(column: &'static str, value: impl Into<String>) -> Self {
        Filter { column, value: FilterValue::Text(value.into()) }
    }
}

/**
 * Describes how one entity maps onto SQL: where its rows live, which columns
 * a list selects, which columns free-text search scans and which sort keys
 * the API exposes. Every entity module provides one static descriptor and the
 * generic operations below do the rest.
 */
#[derive(Debug)]
pub struct ResourceTable {
    /**
     * Human readable entity name for error messages.
     */
    pub entity: &'static str,
    /**
     * Table deletes run against.
     */
    pub base_table: &'static str,
    /**
     * FROM clause for selects, including any display joins.
     */
    pub from_clause: &'static str,
    /**
     * Columns selected for list and detail rows.
     */
    pub select_columns: &'static str,
    /**
     * Qualified id column for detail lookups.
     */
    pub id_column: &'static str,
    /**
     * Columns scanned by free-text search.
     */
    pub search_columns: &'static [&'static str],
    /**
     * Whitelisted sort keys: wire name to qualified column.
     */
    pub sortable: &'static [(&'static str, &'static str)],
    /**
     * ORDER BY applied when no sort is requested.
     */
    pub default_order: &'static str,
}

impl ResourceTable {
    /**
     * Resolves the requested sort into an ORDER BY fragment, rejecting any
     * column outside the whitelist so user input never reaches the SQL text.
     *
     * # Arguments
     * `query`: The list query holding the requested sort.
     *
     * # Returns
     * The ORDER BY fragment or a validation error for unknown columns.
     */
    pub fn sort_clause(&self, query: &ListQuery) -> Result<String, ApplicationError> {
        match &query.sort_by {
            None => Ok(self.default_order.to_string()),
            Some(requested) => self
                .sortable
                .iter()
                .find(|(name, _)| name == requested)
                .map(|(_, column)| format!("{column} {}", query.sort_order.as_sql()))
                .ok_or_else(|| ApplicationError::new(ErrorType::Validation, format!("Cannot sort {} by {requested}", self.entity))),
        }
    }
}

/**
 * Builds the ILIKE pattern for a search term. Backslash, percent and
 * underscore are pattern metacharacters and must be escaped so a term like
 * `100%` only matches rows containing that literal text.
 */
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for character in term.chars() {
        if matches!(character, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    format!("%{escaped}%")
}

/**
 * Appends the WHERE clause for search and filters. All column names come
 * from static descriptors; all values are bound.
 */
fn push_where(builder: &mut QueryBuilder<'_, Postgres>, table: &ResourceTable, search: Option<&str>, filters: &[Filter]) {
    let mut first = true;
    if let Some(term) = search {
        let pattern = like_pattern(term);
        builder.push(" WHERE (");
        for (index, column) in table.search_columns.iter().enumerate() {
            if index > 0 {
                builder.push(" OR ");
            }
            builder.push(*column);
            builder.push(" ILIKE ");
            builder.push_bind(pattern.clone());
        }
        builder.push(")");
        first = false;
    }
    for filter in filters {
        builder.push(if first { " WHERE " } else { " AND " });
        first = false;
        builder.push(filter.column);
        builder.push(" = ");
        match &filter.value {
            FilterValue::I64(value) => builder.push_bind(*value),
            FilterValue::Text(value) => builder.push_bind(value.clone()),
        };
    }
}

/**
 * Fetches one page of rows plus the total row count for the query.
 *
 * # Arguments
 * `connection`: The database connection.
 * `table`: The entity descriptor.
 * `query`: Validated list parameters.
 * `filters`: Entity-specific equality filters.
 *
 * # Returns
 * The page rows and the total number of matching rows.
 */
#[instrument(skip(connection), fields(result))]
pub async fn fetch_page<T>(connection: &mut PgConnection, table: &ResourceTable, query: &ListQuery, filters: &[Filter]) -> Result<(Vec<T>, i64), ApplicationError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let order = table.sort_clause(query)?;

    let mut count_builder = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {}", table.from_clause));
    push_where(&mut count_builder, table, query.search.as_deref(), filters);
    let total: (i64,) = count_builder
        .build_query_as()
        .fetch_one(&mut *connection)
        .await
        .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to count {}: {err}", table.entity)))?;

    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM {}", table.select_columns, table.from_clause));
    push_where(&mut builder, table, query.search.as_deref(), filters);
    builder.push(format!(" ORDER BY {order} LIMIT "));
    builder.push_bind(query.limit);
    builder.push(" OFFSET ");
    builder.push_bind(query.offset());
    let rows = builder
        .build_query_as::<T>()
        .fetch_all(connection)
        .await
        .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to list {}: {err}", table.entity)))?;

    Ok((rows, total.0))
}

/**
 * Fetches a single row by id.
 *
 * # Arguments
 * `connection`: The database connection.
 * `table`: The entity descriptor.
 * `id`: The entity id.
 *
 * # Returns
 * The row, or a not-found error.
 */
#[instrument(skip(connection), fields(result))]
pub async fn fetch_by_id<T>(connection: &mut PgConnection, table: &ResourceTable, id: i64) -> Result<T, ApplicationError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM {} WHERE {} = ", table.select_columns, table.from_clause, table.id_column));
    builder.push_bind(id);
    builder
        .build_query_as::<T>()
        .fetch_optional(connection)
        .await
        .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to fetch {}: {err}", table.entity)))?
        .ok_or_else(|| ApplicationError::not_found(table.entity))
}

/**
 * Deletes a single row by id.
 *
 * # Arguments
 * `transaction`: The database transaction to execute the query within.
 * `table`: The entity descriptor.
 * `id`: The entity id.
 *
 * # Returns
 * A result indicating success or failure of the operation.
 */
#[instrument(skip(transaction), fields(result))]
pub async fn delete_by_id(transaction: &mut PgConnection, table: &ResourceTable, id: i64) -> Result<(), ApplicationError> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("DELETE FROM {} WHERE id = ", table.base_table));
    builder.push_bind(id);
    let result = builder
        .build()
        .execute(transaction)
        .await
        .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to delete {}: {err}", table.entity)))?;
    if result.rows_affected() == 0 {
        tracing::debug!("{} with ID {} not found for deletion", table.entity, id);
        return Err(ApplicationError::not_found(table.entity));
    }
    Ok(())
}

/**
 * Handles database errors and maps them to application errors.
 *
 * # Arguments
 * `error`: The database error to handle.
 *
 * # Returns
 * An `ApplicationError` corresponding to the database error.
 */
pub fn handle_database_error(error: Option<&dyn sqlx::error::DatabaseError>) -> ApplicationError {
    if let Some(db_error) = error {
        tracing::debug!("Database error: {}", db_error);
        if db_error.code() == Some(Cow::Borrowed("23505")) {
            // Unique violation
            return ApplicationError::new(ErrorType::ConstraintViolation, "Already exists".to_string());
        } else if db_error.code() == Some(Cow::Borrowed("23503")) {
            // Foreign key violation
            return ApplicationError::new(ErrorType::ConstraintViolation, "Missing parent value".to_string());
        } else if db_error.code() == Some(Cow::Borrowed("22001")) {
            // Value too long
            return ApplicationError::new(ErrorType::Validation, "Value too long".to_string());
        }
        tracing::error!("Unhandled database error: {}", db_error);
        return ApplicationError::new(ErrorType::DatabaseError, "Unhandled database error".to_string());
    }
    ApplicationError::new(ErrorType::DatabaseError, "Failed to execute database operation".to_string())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::listing::SortOrder;

    const TABLE: ResourceTable = ResourceTable {
        entity: "Category",
        base_table: "categories",
        from_clause: "categories c",
        select_columns: "c.id, c.name",
        id_column: "c.id",
        search_columns: &["c.name"],
        sortable: &[("name", "c.name"), ("createdAt", "c.created_at")],
        default_order: "c.id ASC",
    };

    #[test]
    fn test_sort_clause_default() {
        let query = ListQuery::default();
        assert_eq!(TABLE.sort_clause(&query).unwrap(), "c.id ASC");
    }

    #[test]
    fn test_sort_clause_whitelisted() {
        let query = ListQuery { sort_by: Some("createdAt".to_string()), sort_order: SortOrder::Desc, ..ListQuery::default() };
        assert_eq!(TABLE.sort_clause(&query).unwrap(), "c.created_at DESC");
    }

    #[test]
    fn test_sort_clause_rejects_unknown_column() {
        let query = ListQuery { sort_by: Some("id; DROP TABLE categories".to_string()), ..ListQuery::default() };
        let error = TABLE.sort_clause(&query).unwrap_err();
        assert_eq!(error.error_type, ErrorType::Validation);
    }

    #[test]
    fn test_where_clause_binds_search_and_filters() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT c.id, c.name FROM categories c");
        push_where(&mut builder, &TABLE, Some("plumb"), &[Filter::text("c.status", "active")]);
        assert_eq!(builder.sql(), "SELECT c.id, c.name FROM categories c WHERE (c.name ILIKE $1) AND c.status = $2");
    }

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("plumb"), "%plumb%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("gst_number"), "%gst\\_number%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_where_clause_filters_only() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM categories c");
        push_where(&mut builder, &TABLE, None, &[Filter::id("c.id", 4)]);
        assert_eq!(builder.sql(), "SELECT COUNT(*) FROM categories c WHERE c.id = $1");
    }
}
