use serde::{Deserialize, Serialize};

use crate::model::apperror::{ApplicationError, ErrorType};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/**
 * Sort direction for list queries.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /**
     * Returns the SQL keyword for this direction.
     */
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/**
 * Common list parameters shared by every entity list: 1-based page, page
 * size, sort column, sort direction and free-text search.
 *
 * The mutating helpers encode the list-view contract: changing anything but
 * the page itself snaps the view back to the first page, and re-sorting by
 * the current column flips the direction instead of resetting it.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListQuery {
    pub page: i64,
    pub limit: i64,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
    pub search: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        ListQuery { page: 1, limit: DEFAULT_PAGE_SIZE, sort_by: None, sort_order: SortOrder::Asc, search: None }
    }
}

impl ListQuery {
    /**
     * Validates the pagination bounds.
     *
     * # Returns
     * The query itself, or a validation error when page or limit are out of
     * range.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        if self.page < 1 {
            return Err(ApplicationError::new(ErrorType::Validation, "page must be 1 or greater".to_string()));
        }
        if self.limit < 1 || self.limit > MAX_PAGE_SIZE {
            return Err(ApplicationError::new(ErrorType::Validation, format!("limit must be between 1 and {MAX_PAGE_SIZE}")));
        }
        Ok(self)
    }

    /**
     * Returns the row offset for the current page.
     */
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    /**
     * Applies a sort selection. Selecting the column already sorted on flips
     * the direction; selecting a new column sorts ascending. Either way the
     * view returns to the first page.
     */
    pub fn toggle_sort(&mut self, column: &str) {
        if self.sort_by.as_deref() == Some(column) {
            self.sort_order = self.sort_order.flipped();
        } else {
            self.sort_by = Some(column.to_string());
            self.sort_order = SortOrder::Asc;
        }
        self.page = 1;
    }

    /**
     * Replaces the search term and resets to the first page.
     */
    pub fn set_search(&mut self, search: Option<String>) {
        self.search = search.filter(|term| !term.trim().is_empty());
        self.page = 1;
    }

    /**
     * Navigates to a page without touching any other parameter.
     */
    pub fn set_page(&mut self, page: i64) {
        self.page = page;
    }
}

/**
 * One page of list results with the envelope every list endpoint returns.
 */
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub total_pages: i64,
    pub total_items: i64,
}

impl<T> Page<T> {
    /**
     * Builds a page envelope from the fetched rows and the total row count.
     *
     * # Arguments
     * `items`: Rows for the requested page.
     * `query`: The list query the rows were fetched for.
     * `total_items`: Total rows matching the query without pagination.
     */
    pub fn new(items: Vec<T>, query: &ListQuery, total_items: i64) -> Self {
        let total_pages = if total_items == 0 { 0 } else { (total_items + query.limit - 1) / query.limit };
        Page { items, page: query.page, total_pages, total_items }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sort_toggle_from_fresh_query() {
        let mut query = ListQuery::default();
        assert_eq!(query.sort_by, None);
        query.toggle_sort("name");
        assert_eq!(query.sort_by.as_deref(), Some("name"));
        assert_eq!(query.sort_order, SortOrder::Asc);
        query.toggle_sort("name");
        assert_eq!(query.sort_by.as_deref(), Some("name"));
        assert_eq!(query.sort_order, SortOrder::Desc);
    }

    #[test]
    fn test_sort_toggle_new_column_resets_to_asc() {
        let mut query = ListQuery::default();
        query.toggle_sort("name");
        query.toggle_sort("name");
        assert_eq!(query.sort_order, SortOrder::Desc);
        query.toggle_sort("createdAt");
        assert_eq!(query.sort_by.as_deref(), Some("createdAt"));
        assert_eq!(query.sort_order, SortOrder::Asc);
    }

    #[test]
    fn test_search_change_resets_page() {
        let mut query = ListQuery { page: 4, ..ListQuery::default() };
        query.set_search(Some("plumber".to_string()));
        assert_eq!(query.page, 1);
        assert_eq!(query.search.as_deref(), Some("plumber"));
    }

    #[test]
    fn test_sort_change_resets_page() {
        let mut query = ListQuery { page: 3, ..ListQuery::default() };
        query.toggle_sort("name");
        assert_eq!(query.page, 1);
    }

    #[test]
    fn test_page_navigation_keeps_other_parameters() {
        let mut query = ListQuery::default();
        query.set_search(Some("gift".to_string()));
        query.toggle_sort("name");
        query.set_page(5);
        assert_eq!(query.page, 5);
        assert_eq!(query.search.as_deref(), Some("gift"));
        assert_eq!(query.sort_by.as_deref(), Some("name"));
    }

    #[test]
    fn test_blank_search_is_cleared() {
        let mut query = ListQuery::default();
        query.set_search(Some("   ".to_string()));
        assert_eq!(query.search, None);
    }

    #[test]
    fn test_validate_bounds() {
        assert!(ListQuery { page: 0, ..ListQuery::default() }.validate().is_err());
        assert!(ListQuery { limit: 101, ..ListQuery::default() }.validate().is_err());
        assert!(ListQuery::default().validate().is_ok());
    }

    #[test]
    fn test_offset() {
        let query = ListQuery { page: 3, limit: 20, ..ListQuery::default() };
        assert_eq!(query.offset(), 40);
    }

    #[test]
    fn test_page_envelope_totals() {
        let query = ListQuery { limit: 10, ..ListQuery::default() };
        let page = Page::new(vec![1, 2, 3], &query, 23);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 23);
        let empty: Page<i32> = Page::new(vec![], &query, 0);
        assert_eq!(empty.total_pages, 0);
    }
}
