//! Filter, sort and window compilation for the PostgreSQL backend
//!
//! Documents live in a JSONB `data` column. Field names and values are
//! always bound as parameters; only validated identifiers are spliced into
//! the statement text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};

use crate::domain::storage::{
    Filter, FilterCondition, FilterOperator, SortDirection, SortField, UniqueIndex,
};
use crate::domain::DomainError;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").unwrap());

/// Checks that a name is safe to splice into SQL as an identifier
pub fn validate_identifier(name: &str) -> Result<&str, DomainError> {
    if IDENTIFIER.is_match(name) {
        Ok(name)
    } else {
        Err(DomainError::configuration(format!(
            "Invalid SQL identifier: '{}'",
            name
        )))
    }
}

/// DDL for a partial unique index over one top-level document field
pub fn unique_index_ddl(table: &str, index: &UniqueIndex) -> Result<String, DomainError> {
    let table = validate_identifier(table)?;
    let field = validate_identifier(&index.field)?;

    let mut ddl = format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS {table}_{field}_unique ON {table} ((data ->> '{field}'))",
        table = table,
        field = field
    );

    if let Some(flag) = &index.unless_true {
        let flag = validate_identifier(flag)?;
        ddl.push_str(&format!(
            " WHERE COALESCE((data ->> '{}')::boolean, false) = false",
            flag
        ));
    }

    Ok(ddl)
}

/// Appends ` WHERE ...` when the filter has conditions
pub fn push_where(builder: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    if filter.is_empty() {
        return;
    }

    builder.push(" WHERE ");
    for (i, condition) in filter.conditions().iter().enumerate() {
        if i > 0 {
            builder.push(" AND ");
        }
        push_condition(builder, condition);
    }
}

fn push_field(builder: &mut QueryBuilder<'_, Postgres>, condition: &FilterCondition) {
    builder.push("data -> ");
    builder.push_bind(condition.field.clone());
    builder.push("::text");
}

fn expected(condition: &FilterCondition) -> Value {
    condition
        .value
        .as_ref()
        .map(|v| v.to_json())
        .unwrap_or(Value::Null)
}

fn push_condition(builder: &mut QueryBuilder<'_, Postgres>, condition: &FilterCondition) {
    let value = expected(condition);

    match condition.operator {
        FilterOperator::Exists => {
            builder.push("data ? ");
            builder.push_bind(condition.field.clone());
            builder.push("::text");
        }
        FilterOperator::NotExists => {
            builder.push("NOT (data ? ");
            builder.push_bind(condition.field.clone());
            builder.push("::text)");
        }
        FilterOperator::Eq if value.is_null() => {
            builder.push("COALESCE(");
            push_field(builder, condition);
            builder.push(", 'null'::jsonb) = 'null'::jsonb");
        }
        FilterOperator::Eq => {
            push_field(builder, condition);
            builder.push(" = ");
            builder.push_bind(Json(value));
        }
        FilterOperator::Ne if value.is_null() => {
            builder.push("COALESCE(");
            push_field(builder, condition);
            builder.push(", 'null'::jsonb) <> 'null'::jsonb");
        }
        FilterOperator::Ne => {
            push_field(builder, condition);
            builder.push(" IS DISTINCT FROM ");
            builder.push_bind(Json(value));
        }
        FilterOperator::Gt | FilterOperator::Gte | FilterOperator::Lt | FilterOperator::Lte => {
            // jsonb orders across types, so restrict to same-typed values
            builder.push("(jsonb_typeof(");
            push_field(builder, condition);
            builder.push(") = jsonb_typeof(");
            builder.push_bind(Json(value.clone()));
            builder.push(") AND ");
            push_field(builder, condition);
            builder.push(format!(" {} ", condition.operator));
            builder.push_bind(Json(value));
            builder.push(")");
        }
        FilterOperator::In | FilterOperator::NotIn => {
            let items = match value {
                Value::Array(items) => items,
                other => vec![other],
            };
            let negate = condition.operator == FilterOperator::NotIn;

            if items.is_empty() {
                builder.push(if negate { "TRUE" } else { "FALSE" });
                return;
            }

            builder.push("(");
            if negate {
                push_field(builder, condition);
                builder.push(" IS NULL OR ");
                push_field(builder, condition);
                builder.push(" NOT IN (");
            } else {
                push_field(builder, condition);
                builder.push(" IN (");
            }

            let mut list = builder.separated(", ");
            for item in items {
                list.push_bind(Json(item));
            }
            list.push_unseparated("))");
        }
        FilterOperator::Regex | FilterOperator::RegexInsensitive => {
            builder.push("(jsonb_typeof(");
            push_field(builder, condition);
            builder.push(") = 'string' AND data ->> ");
            builder.push_bind(condition.field.clone());
            builder.push(format!("::text {} ", condition.operator));
            builder.push_bind(value.as_str().unwrap_or_default().to_string());
            builder.push(")");
        }
    }
}

/// Appends ` ORDER BY ...`, always ending with the natural insertion order
pub fn push_order_by(builder: &mut QueryBuilder<'_, Postgres>, sort: &[SortField]) {
    builder.push(" ORDER BY ");

    for key in sort {
        builder.push("data -> ");
        builder.push_bind(key.field.clone());
        builder.push(match key.direction {
            SortDirection::Ascending => "::text ASC NULLS FIRST, ",
            SortDirection::Descending => "::text DESC NULLS LAST, ",
        });
    }

    builder.push("seq ASC");
}

/// Appends ` OFFSET ... LIMIT ...`; a zero or absent limit means unbounded
pub fn push_window(builder: &mut QueryBuilder<'_, Postgres>, skip: i64, limit: Option<i64>) {
    if skip > 0 {
        builder.push(" OFFSET ");
        builder.push_bind(skip);
    }

    if let Some(limit) = limit.filter(|l| *l > 0) {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
    }
}
