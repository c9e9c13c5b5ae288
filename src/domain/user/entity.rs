//! User entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{validate_user_id, UserValidationError};
use crate::domain::storage::timestamp::{self, rfc3339, rfc3339_option};
use crate::domain::storage::{StorageEntity, StorageKey, UniqueIndex};

/// User identifier - a UUID in canonical hyphenated form
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parse an identifier supplied by a client
    pub fn parse(id: &str) -> Result<Self, UserValidationError> {
        validate_user_id(id).map(Self)
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StorageKey for UserId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// Snapshot of the user who performed a change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditActor {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub email: String,
}

impl AuditActor {
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
        }
    }
}

/// Profile fields supplied when a user is created
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: u32,
    pub gender: String,
    pub address: String,
    pub role: String,
}

/// Stored user document
///
/// Serializes every field, the password hash included, because the
/// serialized form is what storage persists. Use [`UserProfile`] for
/// anything that leaves the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    id: UserId,
    name: String,
    email: String,
    /// Argon2 password hash
    password: String,
    phone: String,
    age: u32,
    gender: String,
    address: String,
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_by: Option<AuditActor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_by: Option<AuditActor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deleted_by: Option<AuditActor>,
    #[serde(with = "rfc3339")]
    created_at: DateTime<Utc>,
    #[serde(with = "rfc3339")]
    updated_at: DateTime<Utc>,
    #[serde(default)]
    is_deleted: bool,
    #[serde(default, with = "rfc3339_option", skip_serializing_if = "Option::is_none")]
    deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Create a new, live user with a generated id
    pub fn new(
        fields: NewUser,
        password_hash: impl Into<String>,
        created_by: Option<AuditActor>,
    ) -> Self {
        let now = timestamp::now();

        Self {
            id: UserId::generate(),
            name: fields.name,
            email: fields.email,
            password: password_hash.into(),
            phone: fields.phone,
            age: fields.age,
            gender: fields.gender,
            address: fields.address,
            role: fields.role,
            refresh_token: None,
            created_by,
            updated_by: None,
            deleted_by: None,
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn gender(&self) -> &str {
        &self.gender
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn created_by(&self) -> Option<&AuditActor> {
        self.created_by.as_ref()
    }

    pub fn updated_by(&self) -> Option<&AuditActor> {
        self.updated_by.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// The audit snapshot identifying this user
    pub fn actor(&self) -> AuditActor {
        AuditActor::new(self.id.clone(), self.email.clone())
    }
}

impl StorageEntity for User {
    type Key = UserId;

    fn key(&self) -> &Self::Key {
        &self.id
    }

    fn unique_indexes() -> Vec<UniqueIndex> {
        vec![UniqueIndex::new("email").unless_true("isDeleted")]
    }
}

/// User as returned to clients: no password hash, no refresh token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: u32,
    pub gender: String,
    pub address: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<AuditActor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<AuditActor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<AuditActor>,
    #[serde(with = "rfc3339")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "rfc3339")]
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    #[serde(default, with = "rfc3339_option", skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            age: user.age,
            gender: user.gender,
            address: user.address,
            role: user.role,
            created_by: user.created_by,
            updated_by: user.updated_by,
            deleted_by: user.deleted_by,
            created_at: user.created_at,
            updated_at: user.updated_at,
            is_deleted: user.is_deleted,
            deleted_at: user.deleted_at,
        }
    }
}

/// Partial update applied to a stored user
///
/// Only `Some` fields are written; everything else keeps its stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<AuditActor>,
    #[serde(skip_serializing_if = "Option::is_none", with = "rfc3339_option")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", with = "rfc3339_option")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<AuditActor>,
}

impl UserChanges {
    /// Stamps the change with its author and time
    pub fn touched_by(mut self, actor: Option<AuditActor>) -> Self {
        self.updated_at = Some(timestamp::now());
        self.updated_by = actor;
        self
    }

    /// The change that soft-deletes a user
    pub fn soft_delete(actor: Option<AuditActor>) -> Self {
        Self {
            is_deleted: Some(true),
            deleted_at: Some(timestamp::now()),
            deleted_by: actor,
            ..Default::default()
        }
    }

    /// The stored fields this change writes
    pub fn to_patch(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user() -> NewUser {
        NewUser {
            name: "Nguyen Van A".to_string(),
            email: "nguyenvana@example.com".to_string(),
            phone: "0912345678".to_string(),
            age: 25,
            gender: "male".to_string(),
            address: "123 Main St".to_string(),
            role: "USER".to_string(),
        }
    }

    #[test]
    fn test_user_id_generate_is_valid_uuid() {
        let id = UserId::generate();
        assert!(UserId::parse(id.as_str()).is_ok());
        assert_ne!(id, UserId::generate());
    }

    #[test]
    fn test_user_id_rejects_malformed() {
        assert!(UserId::parse("abc").is_err());
        assert!(serde_json::from_str::<UserId>("\"abc\"").is_err());
    }

    #[test]
    fn test_user_creation() {
        let user = User::new(new_user(), "hashed", None);

        assert_eq!(user.name(), "Nguyen Van A");
        assert_eq!(user.password_hash(), "hashed");
        assert!(!user.is_deleted());
        assert!(user.deleted_at().is_none());
        assert!(user.created_by().is_none());
        assert_eq!(user.created_at(), user.updated_at());
    }

    #[test]
    fn test_document_shape() {
        let actor = AuditActor::new(UserId::generate(), "admin@example.com");
        let user = User::new(new_user(), "hashed", Some(actor.clone()));

        let doc = serde_json::to_value(&user).unwrap();

        assert_eq!(doc["_id"], user.id().as_str());
        assert_eq!(doc["password"], "hashed");
        assert_eq!(doc["isDeleted"], false);
        assert_eq!(doc["createdBy"]["email"], "admin@example.com");
        assert_eq!(doc["createdBy"]["_id"], actor.id.as_str());
        assert!(doc["createdAt"].as_str().unwrap().ends_with('Z'));
        assert!(doc.get("deletedAt").is_none());
        assert!(doc.get("refreshToken").is_none());

        let back: User = serde_json::from_value(doc).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn test_profile_hides_secrets() {
        let user = User::new(new_user(), "hashed-secret", None);

        let json = serde_json::to_string(&UserProfile::from(user)).unwrap();

        assert!(!json.contains("hashed-secret"));
        assert!(!json.contains("password"));
        assert!(!json.contains("refreshToken"));
    }

    #[test]
    fn test_unique_email_index() {
        let indexes = User::unique_indexes();

        assert_eq!(indexes.len(), 1);
        assert_eq!(indexes[0].field, "email");
        assert_eq!(indexes[0].unless_true.as_deref(), Some("isDeleted"));
    }

    #[test]
    fn test_changes_patch_contains_only_set_fields() {
        let changes = UserChanges {
            name: Some("B".to_string()),
            ..Default::default()
        }
        .touched_by(None);

        let patch = changes.to_patch();

        assert_eq!(patch.len(), 2);
        assert_eq!(patch["name"], "B");
        assert!(patch.contains_key("updatedAt"));
    }

    #[test]
    fn test_soft_delete_patch() {
        let actor = AuditActor::new(UserId::generate(), "admin@example.com");
        let patch = UserChanges::soft_delete(Some(actor)).to_patch();

        assert_eq!(patch["isDeleted"], true);
        assert!(patch["deletedAt"].is_string());
        assert_eq!(patch["deletedBy"]["email"], "admin@example.com");
        assert!(!patch.contains_key("updatedAt"));
    }
}
