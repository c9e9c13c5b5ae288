//! Allow-list of queryable fields

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::storage::FilterValue;
use crate::domain::DomainError;

/// How a query-string value is cast before it reaches storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    /// RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC)
    Timestamp,
}

impl FieldKind {
    /// Casts a raw value, naming the field on failure
    pub fn cast(&self, field: &str, raw: &str) -> Result<FilterValue, DomainError> {
        match self {
            Self::Text => Ok(FilterValue::String(raw.to_string())),
            Self::Integer => raw.trim().parse::<i64>().map(FilterValue::Integer).map_err(|_| {
                DomainError::invalid_argument(format!(
                    "Invalid value '{}' for field '{}': expected an integer",
                    raw, field
                ))
            }),
            Self::Timestamp => parse_timestamp(raw)
                .map(FilterValue::Timestamp)
                .ok_or_else(|| {
                    DomainError::invalid_argument(format!(
                        "Invalid value '{}' for field '{}': expected a date or timestamp",
                        raw, field
                    ))
                }),
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
        return Some(value.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Fields a collection exposes to query strings
#[derive(Debug, Clone, Copy)]
pub struct QuerySchema {
    fields: &'static [(&'static str, FieldKind)],
    populatable: &'static [&'static str],
}

impl QuerySchema {
    pub const fn new(
        fields: &'static [(&'static str, FieldKind)],
        populatable: &'static [&'static str],
    ) -> Self {
        Self {
            fields,
            populatable,
        }
    }

    /// Kind of a filterable field, `None` when the field is not exposed
    pub fn kind(&self, field: &str) -> Option<FieldKind> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, kind)| *kind)
    }

    pub fn can_populate(&self, path: &str) -> bool {
        self.populatable.contains(&path)
    }

    /// Kind of a field, or `InvalidArgument` naming the offending key
    pub fn require(&self, field: &str) -> Result<FieldKind, DomainError> {
        self.kind(field).ok_or_else(|| {
            DomainError::invalid_argument(format!("Unknown filter field '{}'", field))
        })
    }
}
