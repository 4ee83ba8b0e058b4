//! # DomainError
//!
//! Centralized error taxonomy for the agora core.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// Credential-level failures raised while resolving a session token.
///
/// These surface as 401 at the API edge, but only after the refresh
/// fallback has been attempted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No token was presented at all.
    #[error("no credential presented")]
    MissingCredential,

    /// The token failed signature verification or is malformed.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The token's signature is fine but its expiry instant has passed.
    #[error("token expired")]
    Expired,
}

/// The primary error type for all core operations.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Malformed or contradictory input (e.g., both thread and comment set)
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found (e.g., Thread, Comment, Interaction)
    #[error("{0} not found")]
    NotFound(String),

    /// A slot is already occupied or a unique value is already taken
    #[error("conflict: {0}")]
    Conflict(String),

    /// Ownership or role violation
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Session credential failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Infrastructure failure (e.g., DB down, transaction aborted)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Wraps any storage-layer failure. The source message is preserved for
    /// logging; the API edge never echoes it to the client.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}

/// A specialized Result type for agora core logic.
pub type Result<T> = std::result::Result<T, DomainError>;
