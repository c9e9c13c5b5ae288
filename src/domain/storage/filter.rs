//! Document filters
//!
//! A [`Filter`] is a conjunction of [`FilterCondition`]s over top-level
//! document fields. Backends evaluate it against the JSON form of an entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp::format_timestamp;

/// Comparison operators for document filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// Equal to
    Eq,
    /// Not equal to (also matches documents missing the field)
    Ne,
    /// Greater than
    Gt,
    /// Greater than or equal to
    Gte,
    /// Less than
    Lt,
    /// Less than or equal to
    Lte,
    /// In list of values
    In,
    /// Not in list of values (also matches documents missing the field)
    NotIn,
    /// Exists (field is present)
    Exists,
    /// Not exists (field is not present)
    NotExists,
    /// String field matches a regular expression
    Regex,
    /// String field matches a regular expression, ignoring case
    RegexInsensitive,
}

impl std::fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Ne => write!(f, "!="),
            Self::Gt => write!(f, ">"),
            Self::Gte => write!(f, ">="),
            Self::Lt => write!(f, "<"),
            Self::Lte => write!(f, "<="),
            Self::In => write!(f, "in"),
            Self::NotIn => write!(f, "not_in"),
            Self::Exists => write!(f, "exists"),
            Self::NotExists => write!(f, "not_exists"),
            Self::Regex => write!(f, "~"),
            Self::RegexInsensitive => write!(f, "~*"),
        }
    }
}

/// Filter value that can be various types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// String value
    String(String),
    /// Integer value
    Integer(i64),
    /// Float value
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// Timestamp value, compared in its stored string form
    Timestamp(DateTime<Utc>),
    /// List of values (for In/NotIn operators)
    List(Vec<FilterValue>),
    /// Null value
    Null,
}

impl FilterValue {
    /// JSON representation as it appears inside a stored document
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Value::from(*f),
            Self::Boolean(b) => serde_json::Value::Bool(*b),
            Self::Timestamp(t) => serde_json::Value::String(format_timestamp(t)),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(FilterValue::to_json).collect())
            }
            Self::Null => serde_json::Value::Null,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        Self::Integer(n as i64)
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Timestamp(t)
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(list: Vec<T>) -> Self {
        Self::List(list.into_iter().map(|v| v.into()).collect())
    }
}

/// A single filter condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    /// Document field name
    pub field: String,
    /// Comparison operator
    pub operator: FilterOperator,
    /// Value to compare against (absent for Exists/NotExists)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<FilterValue>,
}

impl FilterCondition {
    /// Create a new filter condition
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            operator,
            value: Some(value),
        }
    }

    /// Create an existence check condition
    pub fn exists(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::Exists,
            value: None,
        }
    }

    /// Create a not-exists check condition
    pub fn not_exists(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::NotExists,
            value: None,
        }
    }

    /// Create a regular expression condition
    pub fn regex(field: impl Into<String>, pattern: impl Into<String>, case_insensitive: bool) -> Self {
        let operator = if case_insensitive {
            FilterOperator::RegexInsensitive
        } else {
            FilterOperator::Regex
        };

        Self::new(field, operator, FilterValue::String(pattern.into()))
    }
}

/// Conjunction of conditions; an empty filter matches every document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    conditions: Vec<FilterCondition>,
}

impl Filter {
    /// Create an empty filter
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Add a raw condition
    pub fn condition(mut self, condition: FilterCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Combine with another filter (logical AND)
    pub fn and(mut self, other: Filter) -> Self {
        self.conditions.extend(other.conditions);
        self
    }

    /// Add an equality condition
    pub fn eq(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.condition(FilterCondition::new(field, FilterOperator::Eq, value.into()))
    }

    /// Add a not-equal condition
    pub fn ne(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.condition(FilterCondition::new(field, FilterOperator::Ne, value.into()))
    }

    /// Add a greater-than condition
    pub fn gt(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.condition(FilterCondition::new(field, FilterOperator::Gt, value.into()))
    }

    /// Add a greater-than-or-equal condition
    pub fn gte(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.condition(FilterCondition::new(field, FilterOperator::Gte, value.into()))
    }

    /// Add a less-than condition
    pub fn lt(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.condition(FilterCondition::new(field, FilterOperator::Lt, value.into()))
    }

    /// Add a less-than-or-equal condition
    pub fn lte(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.condition(FilterCondition::new(field, FilterOperator::Lte, value.into()))
    }

    /// Add an in-list condition
    pub fn in_list(self, field: impl Into<String>, values: Vec<FilterValue>) -> Self {
        self.condition(FilterCondition::new(field, FilterOperator::In, FilterValue::List(values)))
    }

    /// Add a not-in-list condition
    pub fn not_in_list(self, field: impl Into<String>, values: Vec<FilterValue>) -> Self {
        self.condition(FilterCondition::new(
            field,
            FilterOperator::NotIn,
            FilterValue::List(values),
        ))
    }

    /// Add an exists condition
    pub fn exists(self, field: impl Into<String>) -> Self {
        self.condition(FilterCondition::exists(field))
    }

    /// Add a not-exists condition
    pub fn not_exists(self, field: impl Into<String>) -> Self {
        self.condition(FilterCondition::not_exists(field))
    }

    /// Add a regular expression condition
    pub fn regex(
        self,
        field: impl Into<String>,
        pattern: impl Into<String>,
        case_insensitive: bool,
    ) -> Self {
        self.condition(FilterCondition::regex(field, pattern, case_insensitive))
    }
}
