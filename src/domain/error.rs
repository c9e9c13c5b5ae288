use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Malformed identifier, unknown filter key, uncastable value or bad pagination
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Attempt to change a field that may never change after creation
    #[error("Immutable field: {message}")]
    Immutable { field: String, message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn immutable(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Immutable {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Client-facing message without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound { message }
            | Self::Validation { message }
            | Self::InvalidArgument { message }
            | Self::Immutable { message, .. }
            | Self::Conflict { message }
            | Self::Unauthorized { message }
            | Self::Configuration { message }
            | Self::Internal { message }
            | Self::Storage { message } => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("User not found");
        assert_eq!(error.to_string(), "Not found: User not found");
    }

    #[test]
    fn test_validation_error() {
        let error = DomainError::validation("Name is not empty");
        assert_eq!(error.to_string(), "Validation error: Name is not empty");
    }

    #[test]
    fn test_conflict_error() {
        let error = DomainError::conflict("Email already exists");
        assert_eq!(error.to_string(), "Conflict: Email already exists");
    }

    #[test]
    fn test_immutable_error_keeps_field() {
        let error = DomainError::immutable("email", "Email cannot be updated");

        assert_eq!(error.message(), "Email cannot be updated");
        assert!(matches!(error, DomainError::Immutable { ref field, .. } if field == "email"));
    }

    #[test]
    fn test_message_strips_prefix() {
        let error = DomainError::invalid_argument("Invalid id 'abc'");
        assert_eq!(error.message(), "Invalid id 'abc'");
        assert_eq!(error.to_string(), "Invalid argument: Invalid id 'abc'");
    }
}
