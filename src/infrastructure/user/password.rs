//! Password hashing with Argon2id

use std::fmt::Debug;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::domain::DomainError;

/// Salted one-way password hashing
pub trait PasswordHasher: Send + Sync + Debug {
    /// Hash a plaintext password with a fresh random salt
    fn hash(&self, password: &str) -> Result<String, DomainError>;

    /// Check a plaintext password against a stored hash; malformed hashes never verify
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Argon2id hasher producing PHC strings
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Uses custom cost parameters (memory in KiB, iterations, lanes)
    pub fn with_params(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, DomainError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| DomainError::configuration(format!("Invalid Argon2 parameters: {}", e)))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DomainError::internal(format!("Failed to hash password: {}", e)))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };

        // parameters are read from the PHC string, not from self
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}
