//! Query-string translation into storage filters

mod schema;
mod translator;

pub use schema::{FieldKind, QuerySchema};
pub use translator::{ParsedQuery, QueryTranslator, RESERVED_KEYS};
