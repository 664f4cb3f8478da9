//! Common types used across the platform

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome of a user-initiated action whose precondition may fail.
///
/// Precondition failures ("offer already in vault", "request already
/// pending") are reported to the caller as `success: false` with a
/// displayable message instead of an error status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionResult<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ActionResult<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// Largest page size a caller may ask for
pub const MAX_PER_PAGE: u32 = 100;

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl Pagination {
    /// Requested page, at least 1
    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    /// Page size clamped to `1..=MAX_PER_PAGE`
    pub fn per_page(&self) -> u32 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }

    /// Row offset for the current page (pages are 1-based)
    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1).saturating_mul(u64::from(self.per_page()))
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    /// Cut one page out of an already filtered and ordered list
    pub fn page_of(items: Vec<T>, pagination: &Pagination) -> Self {
        let meta = PaginationMeta::new(pagination, items.len() as u64);
        let data = items
            .into_iter()
            .skip(usize::try_from(pagination.offset()).unwrap_or(usize::MAX))
            .take(meta.per_page as usize)
            .collect();
        Self {
            data,
            pagination: meta,
        }
    }
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl PaginationMeta {
    pub fn new(pagination: &Pagination, total_items: u64) -> Self {
        let per_page = pagination.per_page();
        let total_pages =
            u32::try_from(total_items.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX);
        Self {
            page: pagination.page(),
            per_page,
            total_items,
            total_pages,
        }
    }
}

/// Error returned when a stored enum value has no matching variant
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_offset() {
        let p = Pagination { page: 3, per_page: 20 };
        assert_eq!(p.offset(), 40);
        let first = Pagination::default();
        assert_eq!(first.offset(), 0);
    }

    #[test]
    fn test_pagination_meta_pages() {
        let meta = PaginationMeta::new(&Pagination::default(), 41);
        assert_eq!(meta.total_pages, 3);
        let empty = PaginationMeta::new(&Pagination::default(), 0);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_page_of_slices_items() {
        let items: Vec<u32> = (1..=45).collect();
        let page = PaginatedResponse::page_of(items, &Pagination { page: 3, per_page: 20 });
        assert_eq!(page.data, vec![41, 42, 43, 44, 45]);
        assert_eq!(page.pagination.total_items, 45);
        assert_eq!(page.pagination.total_pages, 3);
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let far = Pagination {
            page: 100_000,
            per_page: 100_000,
        };
        assert_eq!(far.per_page(), MAX_PER_PAGE);
        assert_eq!(far.offset(), 99_999 * u64::from(MAX_PER_PAGE));
        let past_end = PaginatedResponse::page_of(vec![1u32, 2, 3], &far);
        assert!(past_end.data.is_empty());
        assert_eq!(past_end.pagination.per_page, MAX_PER_PAGE);

        let last = Pagination {
            page: u32::MAX,
            per_page: u32::MAX,
        };
        assert!(PaginatedResponse::page_of(vec![1u32], &last).data.is_empty());
    }

    #[test]
    fn test_zero_page_size_and_page_are_clamped() {
        let items: Vec<u32> = (1..=5).collect();
        let third = PaginatedResponse::page_of(items.clone(), &Pagination { page: 3, per_page: 0 });
        assert_eq!(third.data, vec![3]);
        assert_eq!(third.pagination.per_page, 1);
        assert_eq!(third.pagination.total_pages, 5);

        let zeroth = PaginatedResponse::page_of(items, &Pagination { page: 0, per_page: 2 });
        assert_eq!(zeroth.data, vec![1, 2]);
        assert_eq!(zeroth.pagination.page, 1);
    }

    #[test]
    fn test_action_result_failure_has_no_data() {
        let r: ActionResult<u32> = ActionResult::failure("Offer is already in your vault");
        assert!(!r.success);
        assert!(r.data.is_none());
    }
}
