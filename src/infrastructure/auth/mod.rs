//! Authentication infrastructure module
//!
//! JWT access tokens for user authentication.

mod jwt;

pub use jwt::{JwtClaims, JwtConfig, JwtGenerator, JwtService};
