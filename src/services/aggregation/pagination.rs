use crate::api::error::AppError;
use sea_orm::Order;
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

pub const DEFAULT_SORT_FIELD: &str = "createdAt";

/// Raw pagination parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number (default 1)
    pub page: Option<u64>,
    /// Items per page (default 10)
    pub limit: Option<u64>,
    /// Resource-specific sort field (default `createdAt`)
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default `desc`)
    pub sort_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl From<SortDirection> for Order {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        }
    }
}

/// Validated pagination and sort request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
    pub sort_by: String,
    pub direction: SortDirection,
}

impl PageRequest {
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page,
            limit,
            sort_by: DEFAULT_SORT_FIELD.to_string(),
            direction: SortDirection::Desc,
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl PageQuery {
    pub fn resolve(&self, default_limit: u64, max_limit: u64) -> Result<PageRequest, AppError> {
        let page = self.page.unwrap_or(1);
        if page < 1 {
            return Err(AppError::InvalidArgument(
                "page must be at least 1".to_string(),
            ));
        }

        let limit = self.limit.unwrap_or(default_limit);
        if limit < 1 {
            return Err(AppError::InvalidArgument(
                "limit must be at least 1".to_string(),
            ));
        }

        let direction = match self.sort_type.as_deref().map(str::to_lowercase).as_deref() {
            None | Some("desc") => SortDirection::Desc,
            Some("asc") => SortDirection::Asc,
            Some(other) => {
                return Err(AppError::InvalidArgument(format!(
                    "Unsupported sortType: {}",
                    other
                )));
            }
        };

        Ok(PageRequest {
            page,
            limit: limit.min(max_limit),
            sort_by: self
                .sort_by
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SORT_FIELD.to_string()),
            direction,
        })
    }
}

/// Uniform envelope for every list endpoint.
///
/// A page past the end yields no items while still echoing the requested
/// page, with `hasNextPage = false`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl<T> PageResult<T> {
    pub fn new(items: Vec<T>, total_items: u64, request: &PageRequest) -> Self {
        let total_pages = total_items.div_ceil(request.limit);
        Self {
            items,
            total_items,
            total_pages,
            current_page: request.page,
            has_next_page: request.page < total_pages,
            has_prev_page: request.page > 1,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            items: self.items.into_iter().map(f).collect(),
            total_items: self.total_items,
            total_pages: self.total_pages,
            current_page: self.current_page,
            has_next_page: self.has_next_page,
            has_prev_page: self.has_prev_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req = PageQuery::default().resolve(10, 100).unwrap();
        assert_eq!(req, PageRequest::new(1, 10));
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_limit_is_capped() {
        let query = PageQuery {
            limit: Some(5000),
            ..Default::default()
        };
        assert_eq!(query.resolve(10, 100).unwrap().limit, 100);
    }

    #[test]
    fn test_rejects_zero_page_and_limit() {
        let zero_page = PageQuery {
            page: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            zero_page.resolve(10, 100),
            Err(AppError::InvalidArgument(_))
        ));

        let zero_limit = PageQuery {
            limit: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            zero_limit.resolve(10, 100),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_sort_type_parsing() {
        let asc = PageQuery {
            sort_type: Some("ASC".into()),
            sort_by: Some("views".into()),
            ..Default::default()
        }
        .resolve(10, 100)
        .unwrap();
        assert_eq!(asc.direction, SortDirection::Asc);
        assert_eq!(asc.sort_by, "views");

        let bad = PageQuery {
            sort_type: Some("sideways".into()),
            ..Default::default()
        };
        assert!(bad.resolve(10, 100).is_err());
    }

    #[test]
    fn test_page_math() {
        for (total, limit) in [(0u64, 10u64), (1, 10), (10, 10), (11, 10), (25, 7)] {
            let expected_pages = total.div_ceil(limit);
            let mut seen = 0;
            for page in 1..=expected_pages {
                let req = PageRequest::new(page, limit);
                let on_page = total.saturating_sub(req.offset()).min(limit);
                let result = PageResult::new(vec![(); on_page as usize], total, &req);
                assert_eq!(result.total_pages, expected_pages);
                assert_eq!(result.has_next_page, page < expected_pages);
                assert_eq!(result.has_prev_page, page > 1);
                seen += result.items.len() as u64;
            }
            assert_eq!(seen, total);
        }
    }

    #[test]
    fn test_empty_and_out_of_range_pages() {
        let empty: PageResult<()> = PageResult::new(vec![], 0, &PageRequest::new(1, 10));
        assert_eq!(empty.total_pages, 0);
        assert_eq!(empty.current_page, 1);
        assert!(!empty.has_next_page);
        assert!(!empty.has_prev_page);

        let past_end: PageResult<()> = PageResult::new(vec![], 3, &PageRequest::new(5, 2));
        assert_eq!(past_end.total_pages, 2);
        assert_eq!(past_end.current_page, 5);
        assert!(!past_end.has_next_page);
        assert!(past_end.has_prev_page);
    }
}
