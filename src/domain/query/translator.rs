//! Query-string grammar
//!
//! Translates decoded `key=value` pairs into a [`ParsedQuery`]. Operators
//! live in the key, as a URL decoder sees them:
//!
//! | query            | decoded pair          | condition        |
//! |------------------|-----------------------|------------------|
//! | `age=30`         | `("age", "30")`       | equal            |
//! | `age!=30`        | `("age!", "30")`      | not equal        |
//! | `age>=30`        | `("age>", "30")`      | greater or equal |
//! | `age<=30`        | `("age<", "30")`      | less or equal    |
//! | `age>30`         | `("age>30", "")`      | greater          |
//! | `age<30`         | `("age<30", "")`      | less             |
//! | `role=A,B`       | `("role", "A,B")`     | in list          |
//! | `role!=A,B`      | `("role!", "A,B")`    | not in list      |
//! | `name=/^an/i`    | `("name", "/^an/i")`  | regex            |
//! | `phone`          | `("phone", "")`       | exists           |
//! | `!phone`         | `("!phone", "")`      | does not exist   |

use regex::RegexBuilder;

use crate::domain::storage::{Filter, FilterCondition, FilterOperator, FilterValue, SortField};
use crate::domain::DomainError;

use super::schema::{FieldKind, QuerySchema};

/// Keys that never become filter conditions
pub const RESERVED_KEYS: &[&str] = &["current", "pageSize", "skip", "limit", "fields"];

const SORT_KEY: &str = "sort";
const POPULATE_KEY: &str = "populate";

/// Structured form of a list query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedQuery {
    pub filter: Filter,
    pub sort: Vec<SortField>,
    pub population: Vec<String>,
}

/// Translates query-string pairs against a field allow-list
#[derive(Debug, Clone, Copy)]
pub struct QueryTranslator {
    schema: QuerySchema,
}

impl QueryTranslator {
    pub const fn new(schema: QuerySchema) -> Self {
        Self { schema }
    }

    pub fn translate(&self, pairs: &[(String, String)]) -> Result<ParsedQuery, DomainError> {
        let mut parsed = ParsedQuery::default();

        for (key, value) in pairs {
            let key = key.trim();

            if RESERVED_KEYS.contains(&key) {
                continue;
            }

            match key {
                SORT_KEY => parsed.sort.extend(self.parse_sort(value)?),
                POPULATE_KEY => parsed.population.extend(self.parse_populate(value)?),
                _ => {
                    let condition = self.parse_condition(key, value)?;
                    parsed.filter = parsed.filter.condition(condition);
                }
            }
        }

        Ok(parsed)
    }

    fn parse_sort(&self, value: &str) -> Result<Vec<SortField>, DomainError> {
        split_list(value)
            .map(|item| {
                let (field, descending) = match item.strip_prefix('-') {
                    Some(field) => (field, true),
                    None => (item.strip_prefix('+').unwrap_or(item), false),
                };

                self.schema.kind(field).ok_or_else(|| {
                    DomainError::invalid_argument(format!("Unknown sort field '{}'", field))
                })?;

                Ok(if descending {
                    SortField::descending(field)
                } else {
                    SortField::ascending(field)
                })
            })
            .collect()
    }

    fn parse_populate(&self, value: &str) -> Result<Vec<String>, DomainError> {
        split_list(value)
            .map(|path| {
                if self.schema.can_populate(path) {
                    Ok(path.to_string())
                } else {
                    Err(DomainError::invalid_argument(format!(
                        "Cannot populate '{}'",
                        path
                    )))
                }
            })
            .collect()
    }

    fn parse_condition(&self, key: &str, value: &str) -> Result<FilterCondition, DomainError> {
        if value.is_empty() {
            return self.parse_valueless(key);
        }

        if let Some(field) = key.strip_suffix('!') {
            let kind = self.schema.require(field)?;
            return if value.contains(',') {
                Ok(FilterCondition::new(
                    field,
                    FilterOperator::NotIn,
                    cast_list(kind, field, value)?,
                ))
            } else {
                Ok(FilterCondition::new(field, FilterOperator::Ne, kind.cast(field, value)?))
            };
        }

        if let Some(field) = key.strip_suffix('>') {
            let kind = self.schema.require(field)?;
            return Ok(FilterCondition::new(field, FilterOperator::Gte, kind.cast(field, value)?));
        }

        if let Some(field) = key.strip_suffix('<') {
            let kind = self.schema.require(field)?;
            return Ok(FilterCondition::new(field, FilterOperator::Lte, kind.cast(field, value)?));
        }

        let kind = self.schema.require(key)?;

        if let Some((pattern, case_insensitive)) = parse_regex_literal(value)? {
            if kind != FieldKind::Text {
                return Err(DomainError::invalid_argument(format!(
                    "Regular expressions are only supported on text fields, not '{}'",
                    key
                )));
            }

            RegexBuilder::new(pattern)
                .case_insensitive(case_insensitive)
                .build()
                .map_err(|e| {
                    DomainError::invalid_argument(format!(
                        "Invalid regular expression for '{}': {}",
                        key, e
                    ))
                })?;

            return Ok(FilterCondition::regex(key, pattern, case_insensitive));
        }

        if value.contains(',') {
            return Ok(FilterCondition::new(
                key,
                FilterOperator::In,
                cast_list(kind, key, value)?,
            ));
        }

        Ok(FilterCondition::new(key, FilterOperator::Eq, kind.cast(key, value)?))
    }

    /// Conditions whose operand is embedded in the key: `!f`, `f>v`, `f<v`, `f`
    fn parse_valueless(&self, key: &str) -> Result<FilterCondition, DomainError> {
        if let Some(field) = key.strip_prefix('!') {
            self.schema.require(field)?;
            return Ok(FilterCondition::not_exists(field));
        }

        if let Some((field, operand)) = key.split_once('>') {
            let kind = self.schema.require(field)?;
            return Ok(FilterCondition::new(field, FilterOperator::Gt, kind.cast(field, operand)?));
        }

        if let Some((field, operand)) = key.split_once('<') {
            let kind = self.schema.require(field)?;
            return Ok(FilterCondition::new(field, FilterOperator::Lt, kind.cast(field, operand)?));
        }

        if let Some(field) = key.strip_suffix('!') {
            let kind = self.schema.require(field)?;
            return Ok(FilterCondition::new(field, FilterOperator::Ne, kind.cast(field, "")?));
        }

        self.schema.require(key)?;
        Ok(FilterCondition::exists(key))
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|item| !item.is_empty())
}

fn cast_list(kind: FieldKind, field: &str, value: &str) -> Result<FilterValue, DomainError> {
    split_list(value)
        .map(|item| kind.cast(field, item))
        .collect::<Result<Vec<_>, _>>()
        .map(FilterValue::List)
}

/// Splits `/pattern/flags`; only the `i` flag is understood
fn parse_regex_literal(value: &str) -> Result<Option<(&str, bool)>, DomainError> {
    let Some(body) = value.strip_prefix('/') else {
        return Ok(None);
    };

    let Some(end) = body.rfind('/') else {
        return Ok(None);
    };

    let (pattern, flags) = (&body[..end], &body[end + 1..]);

    match flags {
        "" => Ok(Some((pattern, false))),
        "i" => Ok(Some((pattern, true))),
        other => Err(DomainError::invalid_argument(format!(
            "Unsupported regular expression flags '{}'",
            other
        ))),
    }
}
