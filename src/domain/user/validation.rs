//! User validation utilities

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::domain::DomainError;

/// Vietnamese mobile numbers, local or +84 prefixed
pub static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(0|\+84)(3[2-9]|5[6|8|9]|7[0|6-9]|8[1-5]|9[0-9])[0-9]{7}$").unwrap()
});

/// Errors that can occur during user validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserValidationError {
    #[error("Invalid id")]
    InvalidId(String),
}

impl From<UserValidationError> for DomainError {
    fn from(error: UserValidationError) -> Self {
        DomainError::invalid_argument(error.to_string())
    }
}

/// Validate a user ID, returning its canonical hyphenated form
pub fn validate_user_id(id: &str) -> Result<String, UserValidationError> {
    Uuid::parse_str(id)
        .map(|uuid| uuid.hyphenated().to_string())
        .map_err(|_| UserValidationError::InvalidId(id.to_string()))
}

/// Flattens derive-validator failures into one message
///
/// Fields are reported in name order so the message is stable.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        DomainError::validation(validation_message(&errors))
    }
}
