//! Pagination structures shared by list endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
pub struct PaginationParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl PaginationParams {
    pub fn new(page: Option<u64>, page_size: Option<u64>) -> Self {
        Self { page, page_size }
    }

    /// Same request, but with `page_size` pinned when the endpoint uses a fixed size.
    pub fn with_page_size(page: Option<u64>, page_size: u64) -> Self {
        Self {
            page,
            page_size: Some(page_size),
        }
    }

    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> u64 {
        self.page_size.unwrap_or(20).clamp(1, 100)
    }

    pub fn get_offset(&self) -> u64 {
        (self.page() - 1) * self.page_size()
    }

    pub fn get_limit(&self) -> u64 {
        self.page_size()
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, params: &PaginationParams, total: u64) -> Self {
        let page_size = params.page_size();
        Self {
            data,
            page: params.page(),
            page_size,
            total,
            total_pages: total.div_ceil(page_size),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResponse<U> {
        PaginatedResponse {
            data: self.data.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_starts_at_zero_for_first_page() {
        let params = PaginationParams::new(None, None);
        assert_eq!(params.get_offset(), 0);
        assert_eq!(params.get_limit(), 20);

        let params = PaginationParams::with_page_size(Some(3), 24);
        assert_eq!(params.get_offset(), 48);
    }

    #[test]
    fn page_zero_is_treated_as_first_page() {
        let params = PaginationParams::new(Some(0), Some(10));
        assert_eq!(params.page(), 1);
        assert_eq!(params.get_offset(), 0);
    }

    #[test]
    fn total_pages_rounds_up() {
        let params = PaginationParams::with_page_size(Some(1), 20);
        let resp = PaginatedResponse::new(vec![1, 2, 3], &params, 41);
        assert_eq!(resp.total_pages, 3);
        let empty: PaginatedResponse<i32> = PaginatedResponse::new(vec![], &params, 0);
        assert_eq!(empty.total_pages, 0);
    }
}
