//! Offset pagination arithmetic.
//!
//! Out-of-range page sizes are clamped rather than rejected: `page` is raised
//! to 1 and `limit` is clamped into `[1, MAX_LIMIT]`.

use serde::{Deserialize, Serialize};

/// Default page size when none is supplied.
pub const DEFAULT_LIMIT: u32 = 20;

/// Largest page size a caller may request.
pub const MAX_LIMIT: u32 = 100;

/// A normalized page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Normalizes optional raw parameters.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }

    /// Page size as a SQL `LIMIT`.
    pub fn limit_i64(&self) -> i64 {
        self.limit as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pagination metadata returned alongside list results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(request: PageRequest, total: u64) -> Self {
        Self {
            page: request.page,
            limit: request.limit,
            total,
            total_pages: total_pages(total, request.limit),
        }
    }
}

/// `ceil(total / limit)`; zero items means zero pages.
pub fn total_pages(total: u64, limit: u32) -> u64 {
    let limit = limit.max(1) as u64;
    total.div_ceil(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req = PageRequest::default();
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, DEFAULT_LIMIT);
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(PageRequest::new(Some(0), Some(0)), PageRequest { page: 1, limit: 1 });
        assert_eq!(PageRequest::new(Some(3), Some(500)).limit, MAX_LIMIT);
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::new(Some(3), Some(25)).offset(), 50);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(100, 7), 15);
    }

    #[test]
    fn test_pages_cover_every_item_exactly_once() {
        for n in [0u64, 1, 19, 20, 21, 99, 100, 101, 257] {
            for p in [1u32, 7, 20, 100] {
                let pages = total_pages(n, p);
                let covered: u64 = (1..=pages)
                    .map(|page| {
                        let req = PageRequest::new(Some(page as u32), Some(p));
                        (n as i64 - req.offset()).clamp(0, req.limit_i64()) as u64
                    })
                    .sum();
                assert_eq!(covered, n, "n={} p={}", n, p);
            }
        }
    }

    #[test]
    fn test_meta_serializes_camel_case() {
        let meta = PaginationMeta::new(PageRequest::new(Some(2), Some(10)), 35);
        let json = serde_json::to_value(meta).unwrap();
        assert_eq!(json["totalPages"], 4);
        assert_eq!(json["page"], 2);
        assert_eq!(json["limit"], 10);
        assert_eq!(json["total"], 35);
    }
}
