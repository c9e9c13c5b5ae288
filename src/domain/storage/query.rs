//! Find options, update results and index declarations

use serde::{Deserialize, Serialize};

use super::filter::Filter;

/// Partial document update: top-level fields to overwrite
pub type Patch = serde_json::Map<String, serde_json::Value>;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// A single sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    pub direction: SortDirection,
}

impl SortField {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Options for a multi-document find
///
/// `skip` is signed on purpose: callers may compute a negative offset and
/// backends reject it instead of clamping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub filter: Filter,
    pub sort: Vec<SortField>,
    pub skip: i64,
    pub limit: Option<i64>,
}

impl FindOptions {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn with_sort(mut self, sort: Vec<SortField>) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_skip(mut self, skip: i64) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Result of a conditional single-document update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    /// Documents that matched the filter (0 or 1)
    pub matched_count: u64,
    /// Documents whose content actually changed
    pub modified_count: u64,
}

impl UpdateOutcome {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Uniqueness constraint over one top-level field
///
/// Documents whose `unless_true` field is `true` are ignored by the
/// constraint, which lets soft-deleted records release their value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueIndex {
    pub field: String,
    pub unless_true: Option<String>,
}

impl UniqueIndex {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            unless_true: None,
        }
    }

    pub fn unless_true(mut self, flag_field: impl Into<String>) -> Self {
        self.unless_true = Some(flag_field.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_options_builder() {
        let options = FindOptions::new(Filter::new().eq("role", "USER"))
            .with_sort(vec![SortField::descending("age")])
            .with_skip(10)
            .with_limit(5);

        assert_eq!(options.skip, 10);
        assert_eq!(options.limit, Some(5));
        assert_eq!(options.sort[0].direction, SortDirection::Descending);
        assert!(!options.filter.is_empty());
    }

    #[test]
    fn test_update_outcome_serialization() {
        let outcome = UpdateOutcome {
            matched_count: 1,
            modified_count: 0,
        };

        let json = serde_json::to_value(outcome).unwrap();
        assert_eq!(json["matchedCount"], 1);
        assert_eq!(json["modifiedCount"], 0);
    }

    #[test]
    fn test_unique_index_builder() {
        let index = UniqueIndex::new("email").unless_true("isDeleted");

        assert_eq!(index.field, "email");
        assert_eq!(index.unless_true.as_deref(), Some("isDeleted"));
    }
}
