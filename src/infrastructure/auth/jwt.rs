//! JWT access token generation and validation

use std::fmt::Debug;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::user::User;
use crate::domain::DomainError;

const GENERATED_SECRET_LENGTH: usize = 64;

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Login email
    pub email: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
}

impl JwtClaims {
    /// Create new claims for a user
    ///
    /// Fails with a configuration error when the lifetime overflows a timestamp.
    pub fn new(user: &User, expiration_hours: u64) -> Result<Self, DomainError> {
        let now = Utc::now();
        let exp = i64::try_from(expiration_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                DomainError::configuration(format!(
                    "JWT expiration of {} hours is out of range",
                    expiration_hours
                ))
            })?;

        Ok(Self {
            sub: user.id().as_str().to_string(),
            email: user.email().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        })
    }

    /// Expiry as a UTC time
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Get user ID from claims
    pub fn user_id(&self) -> &str {
        &self.sub
    }
}

/// Configuration for JWT service
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token expiration time in hours
    pub expiration_hours: u64,
}

impl Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[hidden]")
            .field("expiration_hours", &self.expiration_hours)
            .finish()
    }
}

impl JwtConfig {
    /// Create new JWT configuration
    pub fn new(secret: impl Into<String>, expiration_hours: u64) -> Self {
        Self {
            secret: secret.into(),
            expiration_hours,
        }
    }

    /// Uses the configured secret, or a random one when none is set
    ///
    /// Tokens signed with a generated secret do not survive a restart.
    pub fn from_optional_secret(secret: Option<&str>, expiration_hours: u64) -> Self {
        match secret.map(str::trim).filter(|s| !s.is_empty()) {
            Some(secret) => Self::new(secret, expiration_hours),
            None => {
                warn!("No JWT secret configured, generating a random one");
                Self::new(generate_secret(), expiration_hours)
            }
        }
    }
}

fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_SECRET_LENGTH)
        .map(char::from)
        .collect()
}

/// Trait for JWT operations
pub trait JwtGenerator: Send + Sync + Debug {
    /// Sign a token for a user, returning it with the claims it carries
    fn issue(&self, user: &User) -> Result<(String, JwtClaims), DomainError>;

    /// Generate a JWT token for a user
    fn generate(&self, user: &User) -> Result<String, DomainError> {
        self.issue(user).map(|(token, _)| token)
    }

    /// Validate a JWT token and return the claims
    fn validate(&self, token: &str) -> Result<JwtClaims, DomainError>;
}

/// HS256 JWT service
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    /// Create a new JWT service with the given configuration
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }
}

impl JwtGenerator for JwtService {
    fn issue(&self, user: &User) -> Result<(String, JwtClaims), DomainError> {
        let claims = JwtClaims::new(user, self.config.expiration_hours)?;

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| DomainError::internal(format!("Failed to generate JWT: {}", e)))?;

        Ok((token, claims))
    }

    fn validate(&self, token: &str) -> Result<JwtClaims, DomainError> {
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| DomainError::unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::NewUser;

    fn create_test_user() -> User {
        User::new(
            NewUser {
                name: "Test".to_string(),
                email: "test@example.com".to_string(),
                phone: "0912345678".to_string(),
                age: 30,
                gender: "other".to_string(),
                address: "N/A".to_string(),
                role: "USER".to_string(),
            },
            "hash",
            None,
        )
    }

    fn create_service() -> JwtService {
        JwtService::new(JwtConfig::new("test-secret-key-12345", 24))
    }

    #[test]
    fn test_generate_and_validate() {
        let service = create_service();
        let user = create_test_user();

        let token = service.generate(&user).unwrap();
        let claims = service.validate(&token).unwrap();

        assert_eq!(claims.sub, user.id().as_str());
        assert_eq!(claims.email, "test@example.com");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_issue_returns_signed_claims() {
        let service = create_service();

        let (token, claims) = service.issue(&create_test_user()).unwrap();

        assert_eq!(service.validate(&token).unwrap(), claims);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
        assert_eq!(claims.expires_at().unwrap().timestamp(), claims.exp);
    }

    #[test]
    fn test_out_of_range_expiration() {
        let service = JwtService::new(JwtConfig::new("test-secret", u64::MAX));
        let err = service.generate(&create_test_user()).unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));

        let service = JwtService::new(JwtConfig::new("test-secret", i64::MAX as u64));
        let err = service.generate(&create_test_user()).unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));
    }

    #[test]
    fn test_invalid_token() {
        let err = create_service().validate("invalid-token").unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized { .. }));
    }

    #[test]
    fn test_wrong_secret() {
        let service1 = JwtService::new(JwtConfig::new("secret-1", 24));
        let service2 = JwtService::new(JwtConfig::new("secret-2", 24));

        let token = service1.generate(&create_test_user()).unwrap();

        assert!(service2.validate(&token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let service = JwtService::new(JwtConfig::new("test-secret", 24));
        let user = create_test_user();

        let past_time = Utc::now() - Duration::hours(1);
        let claims = JwtClaims {
            sub: user.id().as_str().to_string(),
            email: user.email().to_string(),
            iat: (past_time - Duration::hours(2)).timestamp(),
            exp: past_time.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(service.validate(&token).is_err());
    }

    #[test]
    fn test_generated_secret() {
        let first = JwtConfig::from_optional_secret(None, 24);
        let second = JwtConfig::from_optional_secret(Some("  "), 24);

        assert_eq!(first.secret.len(), GENERATED_SECRET_LENGTH);
        assert_ne!(first.secret, second.secret);

        let configured = JwtConfig::from_optional_secret(Some("configured"), 12);
        assert_eq!(configured.secret, "configured");
        assert_eq!(configured.expiration_hours, 12);
    }

    #[test]
    fn test_config_debug_hides_secret() {
        let config = JwtConfig::new("super-secret", 24);
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}
