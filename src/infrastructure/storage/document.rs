//! JSON document evaluation shared by the in-memory backend
//!
//! Filters are compiled once per call (regexes included) and then matched
//! against the serialized form of each stored entity.

use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::storage::{Filter, FilterCondition, FilterOperator, SortDirection, SortField};
use crate::domain::DomainError;

/// A serialized entity
pub type Document = Map<String, Value>;

/// Serializes an entity into a document; entities must serialize to JSON objects
pub fn to_document<E: Serialize>(entity: &E) -> Result<Document, DomainError> {
    match serde_json::to_value(entity) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(DomainError::storage(format!(
            "Entity must serialize to a JSON object, got {}",
            type_name(&other)
        ))),
        Err(e) => Err(DomainError::storage(format!("Failed to serialize entity: {}", e))),
    }
}

/// A filter ready for repeated evaluation
#[derive(Debug)]
pub struct CompiledFilter {
    conditions: Vec<CompiledCondition>,
}

#[derive(Debug)]
struct CompiledCondition {
    condition: FilterCondition,
    expected: Option<Value>,
    pattern: Option<Regex>,
}

impl CompiledFilter {
    pub fn compile(filter: &Filter) -> Result<Self, DomainError> {
        let conditions = filter
            .conditions()
            .iter()
            .map(compile_condition)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { conditions })
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|c| c.matches(doc))
    }
}

fn compile_condition(condition: &FilterCondition) -> Result<CompiledCondition, DomainError> {
    let pattern = match condition.operator {
        FilterOperator::Regex | FilterOperator::RegexInsensitive => {
            let source = condition
                .value
                .as_ref()
                .and_then(|v| match v.to_json() {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .ok_or_else(|| {
                    DomainError::invalid_argument(format!(
                        "Regex filter on '{}' requires a string pattern",
                        condition.field
                    ))
                })?;

            let regex = RegexBuilder::new(&source)
                .case_insensitive(condition.operator == FilterOperator::RegexInsensitive)
                .build()
                .map_err(|e| {
                    DomainError::invalid_argument(format!(
                        "Invalid regex for '{}': {}",
                        condition.field, e
                    ))
                })?;
            Some(regex)
        }
        _ => None,
    };

    Ok(CompiledCondition {
        condition: condition.clone(),
        expected: condition.value.as_ref().map(|v| v.to_json()),
        pattern,
    })
}

impl CompiledCondition {
    fn matches(&self, doc: &Document) -> bool {
        let actual = doc.get(&self.condition.field);
        let expected = self.expected.as_ref();

        match self.condition.operator {
            FilterOperator::Exists => actual.is_some(),
            FilterOperator::NotExists => actual.is_none(),
            FilterOperator::Eq => expected.is_some_and(|v| compare_eq(actual, v)),
            FilterOperator::Ne => expected.is_none_or(|v| !compare_eq(actual, v)),
            FilterOperator::Gt => compare_ord(actual, expected, |o| o == Ordering::Greater),
            FilterOperator::Gte => compare_ord(actual, expected, |o| o != Ordering::Less),
            FilterOperator::Lt => compare_ord(actual, expected, |o| o == Ordering::Less),
            FilterOperator::Lte => compare_ord(actual, expected, |o| o != Ordering::Greater),
            FilterOperator::In => list_items(expected).iter().any(|v| compare_eq(actual, v)),
            FilterOperator::NotIn => !list_items(expected).iter().any(|v| compare_eq(actual, v)),
            FilterOperator::Regex | FilterOperator::RegexInsensitive => {
                match (actual.and_then(Value::as_str), &self.pattern) {
                    (Some(s), Some(re)) => re.is_match(s),
                    _ => false,
                }
            }
        }
    }
}

fn list_items(expected: Option<&Value>) -> Vec<Value> {
    match expected {
        Some(Value::Array(items)) => items.clone(),
        Some(other) => vec![other.clone()],
        None => Vec::new(),
    }
}

/// Compare a document value with a filter value for equality
fn compare_eq(actual: Option<&Value>, expected: &Value) -> bool {
    match (actual, expected) {
        (Some(Value::Number(a)), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
            _ => false,
        },
        (Some(a), b) => a == b,
        (None, Value::Null) => true,
        (None, _) => false,
    }
}

/// Ordered comparison; only values of the same JSON type are comparable
fn compare_ord<F>(actual: Option<&Value>, expected: Option<&Value>, accept: F) -> bool
where
    F: Fn(Ordering) -> bool,
{
    match (actual, expected) {
        (Some(a @ Value::Number(_)), Some(b @ Value::Number(_)))
        | (Some(a @ Value::String(_)), Some(b @ Value::String(_))) => {
            accept(compare_values(Some(a), Some(b)))
        }
        _ => false,
    }
}

/// Total order over document values used for sorting
///
/// Missing and null sort first, then numbers, strings, objects, arrays and booleans.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .zip(y.as_f64())
            .and_then(|(x, y)| x.partial_cmp(&y))
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (a, b) => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

/// Compares two documents by a list of sort keys
pub fn compare_documents(a: &Document, b: &Document, sort: &[SortField]) -> Ordering {
    for key in sort {
        let ordering = compare_values(a.get(&key.field), b.get(&key.field));
        let ordering = match key.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
