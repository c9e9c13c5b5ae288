//! Page arithmetic for list queries

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Page size used when none (or a non-positive one) is requested
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// A requested page, as the client sent it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number; not range-checked
    pub current: i64,
    /// Requested page size, echoed back verbatim in [`PageMeta`]
    pub page_size: Option<i64>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            current: 1,
            page_size: None,
        }
    }
}

impl PageRequest {
    pub fn new(current: Option<i64>, page_size: Option<i64>) -> Self {
        Self {
            current: current.unwrap_or(1),
            page_size,
        }
    }

    /// Parses raw query-string values; blank values count as absent
    pub fn parse(current: Option<&str>, page_size: Option<&str>) -> Result<Self, DomainError> {
        Ok(Self::new(
            parse_number("current", current)?,
            parse_number("pageSize", page_size)?,
        ))
    }

    pub fn effective_page_size(&self) -> i64 {
        match self.page_size {
            Some(size) if size > 0 => size,
            _ => DEFAULT_PAGE_SIZE,
        }
    }

    /// Number of records to skip; negative when `current` is below 1
    pub fn offset(&self) -> i64 {
        self.current
            .saturating_sub(1)
            .saturating_mul(self.effective_page_size())
    }

    pub fn meta(&self, total: u64) -> PageMeta {
        let size = self.effective_page_size() as u64;

        PageMeta {
            current: self.current,
            page_size: self.page_size,
            pages: total.div_ceil(size),
            total,
        }
    }
}

fn parse_number(name: &str, raw: Option<&str>) -> Result<Option<i64>, DomainError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse::<i64>().map(Some).map_err(|_| {
            DomainError::invalid_argument(format!("'{}' must be an integer, got '{}'", name, value))
        }),
    }
}

/// Pagination metadata returned with every page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub current: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
    pub pages: u64,
    pub total: u64,
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub meta: PageMeta,
    pub result: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn map<U, F>(self, f: F) -> Paginated<U>
    where
        F: FnMut(T) -> U,
    {
        Paginated {
            meta: self.meta,
            result: self.result.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let page = PageRequest::parse(None, None).unwrap();

        assert_eq!(page.current, 1);
        assert_eq!(page.effective_page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_offset() {
        let page = PageRequest::new(Some(3), Some(10));
        assert_eq!(page.offset(), 20);
    }

    #[test]
    fn test_non_positive_page_size_falls_back() {
        assert_eq!(PageRequest::new(Some(2), Some(0)).effective_page_size(), 10);
        assert_eq!(PageRequest::new(Some(2), Some(-5)).offset(), 10);
    }

    #[test]
    fn test_page_zero_gives_negative_offset() {
        assert_eq!(PageRequest::new(Some(0), Some(10)).offset(), -10);
    }

    #[test]
    fn test_meta() {
        let meta = PageRequest::new(Some(1), Some(10)).meta(25);

        assert_eq!(meta.pages, 3);
        assert_eq!(meta.total, 25);
        assert_eq!(meta.page_size, Some(10));

        assert_eq!(PageRequest::default().meta(0).pages, 0);
    }

    #[test]
    fn test_meta_echoes_requested_page_size() {
        let meta = PageRequest::new(Some(1), Some(0)).meta(25);

        assert_eq!(meta.page_size, Some(0));
        assert_eq!(meta.pages, 3);

        let json = serde_json::to_value(PageRequest::default().meta(5)).unwrap();
        assert!(json.get("pageSize").is_none());
        assert_eq!(json["pages"], 1);
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        let err = PageRequest::parse(Some("abc"), None).unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument { .. }));

        assert!(PageRequest::parse(Some(" "), Some("")).is_ok());
    }
}
