//! Page-number pagination shared by list pages

use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{AppError, AppResult};

/// Rows per page on every paginated list
pub const PAGE_SIZE: i64 = 10;

/// `?page=N` query parameter, 1-based
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<i64>,
}

/// A validated page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Pagination {
    pub fn new(query: PageQuery, per_page: i64) -> AppResult<Self> {
        let page = query.page.unwrap_or(1);
        if page < 1 {
            return Err(AppError::NotFound(format!("Invalid page ({})", page)));
        }
        Ok(Self { page, per_page })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    /// Number of pages for `total` rows; an empty list still has one page
    pub fn num_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            1
        } else {
            (total + self.per_page - 1) / self.per_page
        }
    }

    /// Reject a page past the end of a list of `total` rows
    pub fn ensure_in_range(&self, total: i64) -> AppResult<()> {
        if self.page > self.num_pages(total) {
            Err(AppError::NotFound(format!(
                "Invalid page ({}): that page contains no results",
                self.page
            )))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: i64) -> Pagination {
        Pagination::new(PageQuery { page: Some(n) }, PAGE_SIZE).unwrap()
    }

    #[test]
    fn test_defaults_to_first_page() {
        let p = Pagination::new(PageQuery::default(), PAGE_SIZE).unwrap();
        assert_eq!(p.page, 1);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 10);
    }

    #[test]
    fn test_rejects_non_positive_pages() {
        assert!(Pagination::new(PageQuery { page: Some(0) }, PAGE_SIZE).is_err());
        assert!(Pagination::new(PageQuery { page: Some(-2) }, PAGE_SIZE).is_err());
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page(1).num_pages(0), 1);
        assert_eq!(page(1).num_pages(10), 1);
        assert_eq!(page(1).num_pages(11), 2);
        assert_eq!(page(3).offset(), 20);
    }

    #[test]
    fn test_out_of_range() {
        assert!(page(1).ensure_in_range(0).is_ok());
        assert!(page(2).ensure_in_range(10).is_err());
        assert!(page(2).ensure_in_range(11).is_ok());
    }
}
