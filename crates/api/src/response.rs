//! Success envelopes shared by the route handlers.

use domain::models::Page;
use serde::Serialize;
use shared::pagination::PaginationMeta;

/// `{"success": true, "data": ...}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// `{"success": true, "data": [...], "pagination": {...}}`
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> From<Page<T>> for Paginated<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            success: true,
            data: page.data,
            pagination: page.pagination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::pagination::PageRequest;

    #[test]
    fn test_paginated_serializes_camel_case_meta() {
        let page = Page::new(vec![1, 2, 3], PageRequest::new(Some(2), Some(3)), 9);
        let json = serde_json::to_value(Paginated::from(page)).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["data"].as_array().unwrap().len(), 3);
        assert_eq!(json["pagination"]["page"], 2);
        assert_eq!(json["pagination"]["totalPages"], 3);
    }
}
