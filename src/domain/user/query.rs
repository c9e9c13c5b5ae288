//! Queryable user fields

use crate::domain::query::{FieldKind, QuerySchema, QueryTranslator};

/// Fields a list query may filter and sort on
///
/// `role` is free text, so populating it is accepted and leaves it as is.
pub const USER_QUERY_SCHEMA: QuerySchema = QuerySchema::new(
    &[
        ("name", FieldKind::Text),
        ("email", FieldKind::Text),
        ("phone", FieldKind::Text),
        ("age", FieldKind::Integer),
        ("gender", FieldKind::Text),
        ("address", FieldKind::Text),
        ("role", FieldKind::Text),
        ("createdAt", FieldKind::Timestamp),
        ("updatedAt", FieldKind::Timestamp),
    ],
    &["role"],
);

pub const USER_QUERY_TRANSLATOR: QueryTranslator = QueryTranslator::new(USER_QUERY_SCHEMA);
