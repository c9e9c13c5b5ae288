//! Create and update payloads

use serde::Deserialize;
use validator::Validate;

use super::entity::{NewUser, UserChanges};
use super::validation::PHONE_PATTERN;
use crate::domain::DomainError;

/// Payload for creating a user
///
/// Missing string fields deserialize as empty so they fail validation with
/// their own message rather than as a malformed body.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "Name is not empty"))]
    pub name: String,

    #[validate(
        length(min = 1, message = "Email is not empty"),
        email(message = "Email is not valid")
    )]
    pub email: String,

    #[validate(length(min = 1, message = "Password is not empty"))]
    pub password: String,

    #[validate(
        length(equal = 10, message = "Phone must be exactly 10 characters"),
        regex(path = *PHONE_PATTERN, message = "Phone is not valid")
    )]
    pub phone: String,

    #[validate(required(message = "Age is not empty"))]
    pub age: Option<u32>,

    #[validate(length(min = 1, message = "Gender is not empty"))]
    pub gender: String,

    #[validate(length(min = 1, message = "Address is not empty"))]
    pub address: String,

    #[validate(length(min = 1, message = "Role is not empty"))]
    pub role: String,
}

impl CreateUserRequest {
    /// Validates the payload and splits it into profile fields and password
    pub fn into_new_user(self) -> Result<(NewUser, String), DomainError> {
        self.validate()?;

        let age = self
            .age
            .ok_or_else(|| DomainError::validation("Age is not empty"))?;

        Ok((
            NewUser {
                name: self.name,
                email: self.email,
                phone: self.phone,
                age,
                gender: self.gender,
                address: self.address,
                role: self.role,
            },
            self.password,
        ))
    }
}

/// Payload for updating a user; every field is optional
///
/// `email` is accepted only so that an attempt to change it can be reported
/// as such. Unknown fields, `password` among them, are rejected.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, message = "Name is not empty"))]
    pub name: Option<String>,

    pub email: Option<String>,

    #[validate(
        length(equal = 10, message = "Phone must be exactly 10 characters"),
        regex(path = *PHONE_PATTERN, message = "Phone is not valid")
    )]
    pub phone: Option<String>,

    pub age: Option<u32>,

    #[validate(length(min = 1, message = "Gender is not empty"))]
    pub gender: Option<String>,

    #[validate(length(min = 1, message = "Address is not empty"))]
    pub address: Option<String>,

    #[validate(length(min = 1, message = "Role is not empty"))]
    pub role: Option<String>,
}

impl UpdateUserRequest {
    /// Validates the payload and turns it into stored-field changes
    pub fn into_changes(self) -> Result<UserChanges, DomainError> {
        if self.email.is_some() {
            return Err(DomainError::immutable("email", "Email cannot be updated"));
        }

        self.validate()?;

        Ok(UserChanges {
            name: self.name,
            phone: self.phone,
            age: self.age,
            gender: self.gender,
            address: self.address,
            role: self.role,
            ..Default::default()
        })
    }
}
