//! Pagination contract shared by the log and data read paths.
//!
//! A request's `(page, limit)` is normalized into [`PaginationParams`] at the
//! HTTP boundary, turned into a [`PageCursor`] for the store, and the store's
//! total is folded back into a [`Paginated`] envelope:
//!
//! ```
//! use pagination::{Paginated, PaginationParams};
//!
//! let params = PaginationParams::new(Some(2), Some(25));
//! let cursor = params.cursor();
//! assert_eq!((cursor.skip, cursor.limit), (25, 25));
//!
//! let page = Paginated::new(vec!["a"; 5], 30, &params);
//! assert_eq!(page.meta.total_pages, 2);
//! ```

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 25;
pub const MAX_LIMIT: u64 = 100;

/// Raw `?page=&limit=` query values before normalization.
///
/// Values that are not integers are treated as absent rather than rejected,
/// so they fall back to the defaults. Safe to `#[serde(flatten)]` into a
/// larger query struct.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default, deserialize_with = "lenient_int")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub limit: Option<i64>,
}

/// Accepts integers, integer strings, and anything else as `None`.
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct LenientInt;

    impl<'de> serde::de::Visitor<'de> for LenientInt {
        type Value = Option<i64>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("an integer or a string")
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(i64::try_from(v).unwrap_or(i64::MAX)))
        }

        fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(v.is_finite().then_some(v as i64))
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.trim().parse().ok())
        }

        fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: serde::Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(LenientInt)
        }
    }

    deserializer.deserialize_any(LenientInt)
}

impl From<PageQuery> for PaginationParams {
    fn from(query: PageQuery) -> Self {
        Self::new(query.page, query.limit)
    }
}

/// Normalized page request: `page >= 1`, `1 <= limit <= 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationParams {
    page: u64,
    limit: u64,
}

impl PaginationParams {
    /// Missing values take the defaults (1, 25); out-of-range values are clamped.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.map_or(DEFAULT_PAGE, |p| p.max(1) as u64);
        let limit = limit.map_or(DEFAULT_LIMIT, |l| l.clamp(1, MAX_LIMIT as i64) as u64);
        Self { page, limit }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Storage window for this page.
    pub fn cursor(&self) -> PageCursor {
        PageCursor {
            skip: (self.page - 1).saturating_mul(self.limit),
            limit: self.limit,
        }
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Offset/limit pair handed to a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub skip: u64,
    pub limit: u64,
}

/// `meta` block of a paginated response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(total: u64, params: &PaginationParams) -> Self {
        Self {
            total,
            page: params.page,
            limit: params.limit,
            total_pages: total.div_ceil(params.limit),
        }
    }
}

/// `{data, meta}` response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: u64, params: &PaginationParams) -> Self {
        Self {
            data,
            meta: PaginationMeta::new(total, params),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_when_missing() {
        let params = PaginationParams::new(None, None);
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 25);
        assert_eq!(params, PaginationParams::default());
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        assert_eq!(PaginationParams::new(Some(0), None).page(), 1);
        assert_eq!(PaginationParams::new(Some(-4), None).page(), 1);
        assert_eq!(PaginationParams::new(None, Some(0)).limit(), 1);
        assert_eq!(PaginationParams::new(None, Some(-10)).limit(), 1);
        assert_eq!(PaginationParams::new(None, Some(500)).limit(), 100);
    }

    #[test]
    fn test_cursor_skips_previous_pages() {
        assert_eq!(
            PaginationParams::new(Some(1), Some(25)).cursor(),
            PageCursor { skip: 0, limit: 25 }
        );
        assert_eq!(
            PaginationParams::new(Some(3), Some(10)).cursor(),
            PageCursor { skip: 20, limit: 10 }
        );
    }

    #[test]
    fn test_cursor_does_not_overflow_on_huge_page() {
        let cursor = PaginationParams::new(Some(i64::MAX), Some(100)).cursor();
        assert_eq!(cursor.skip, u64::MAX);
    }

    #[test]
    fn test_total_pages_is_ceiling_of_total_over_limit() {
        for limit in 1..=100i64 {
            let params = PaginationParams::new(Some(1), Some(limit));
            for total in [0u64, 1, 24, 25, 26, 30, 99, 100, 101, 1000] {
                let meta = PaginationMeta::new(total, &params);
                let expected = (total as f64 / limit as f64).ceil() as u64;
                assert_eq!(meta.total_pages, expected, "total={total} limit={limit}");
            }
        }
    }

    #[test]
    fn test_total_pages_zero_when_empty() {
        let meta = PaginationMeta::new(0, &PaginationParams::default());
        assert_eq!(meta.total_pages, 0);
    }

    #[test]
    fn test_meta_serializes_camel_case() {
        let params = PaginationParams::new(Some(2), Some(25));
        let json = serde_json::to_string(&PaginationMeta::new(30, &params)).unwrap();
        assert_eq!(json, r#"{"total":30,"page":2,"limit":25,"totalPages":2}"#);
    }

    #[test]
    fn test_page_query_normalizes() {
        let query = PageQuery {
            page: Some(-1),
            limit: Some(1000),
        };
        let params = PaginationParams::from(query);
        assert_eq!((params.page(), params.limit()), (1, 100));
    }

    #[test]
    fn test_page_query_ignores_garbage() {
        let query: PageQuery = serde_json::from_str(r#"{"page":"abc","limit":"10"}"#).unwrap();
        assert_eq!(query.page, None);
        assert_eq!(query.limit, Some(10));

        let query: PageQuery = serde_json::from_str(r#"{"page":3}"#).unwrap();
        assert_eq!(query.page, Some(3));
        assert_eq!(query.limit, None);
    }

    #[test]
    fn test_paginated_map_keeps_meta() {
        let params = PaginationParams::default();
        let page = Paginated::new(vec![1, 2, 3], 3, &params).map(|n| n * 10);
        assert_eq!(page.data, vec![10, 20, 30]);
        assert_eq!(page.meta.total, 3);
        assert_eq!(page.meta.total_pages, 1);
    }
}
