//! # auth-adapters
//!
//! Credential implementations: Argon2id password hashing, and (behind the
//! `auth-jwt` feature) the stateless JWT session manager used by the API
//! middleware.

pub mod password;

#[cfg(feature = "auth-jwt")]
pub mod jwt;

pub use password::{hash_password, verify_password};

#[cfg(feature = "auth-jwt")]
pub use jwt::{Claims, JwtSessionManager, TokenPair};
