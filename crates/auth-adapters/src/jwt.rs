//! Stateless JWT session tokens.
//!
//! A session is two HS256 tokens over one shared secret: a short-lived
//! access token and a long-lived refresh token, both binding a user id to
//! an expiry instant. Nothing is stored server-side: validity is purely
//! signature + expiry, which is what makes the middleware's transparent
//! renewal cheap and lock-free.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use configs::AuthConfig;
use domains::{AuthError, DomainError, Result};

/// Signed claims carried by both token kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The authenticated user id.
    pub sub: Uuid,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry instant, seconds since epoch.
    pub exp: i64,
}

/// A freshly minted access/refresh pair, as produced at login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Mints and verifies session tokens. Built once from [`AuthConfig`] and
/// shared behind the app state; verification takes no locks.
pub struct JwtSessionManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtSessionManager {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl: Duration::seconds(config.access_ttl_secs as i64),
            refresh_ttl: Duration::seconds(config.refresh_ttl_secs as i64),
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn issue_access(&self, user_id: Uuid) -> Result<String> {
        self.issue(user_id, self.access_ttl)
    }

    pub fn issue_refresh(&self, user_id: Uuid) -> Result<String> {
        self.issue(user_id, self.refresh_ttl)
    }

    /// Both tokens for a fresh login.
    pub fn issue_pair(&self, user_id: Uuid) -> Result<TokenPair> {
        Ok(TokenPair {
            access: self.issue_access(user_id)?,
            refresh: self.issue_refresh(user_id)?,
        })
    }

    fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(DomainError::internal)
    }

    /// Verifies signature and expiry, returning the bound claims.
    ///
    /// Expiry is reported distinctly from signature failure so the
    /// middleware can decide whether the refresh fallback is worth trying.
    pub fn verify(&self, token: &str) -> std::result::Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidSignature,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn test_manager() -> JwtSessionManager {
        JwtSessionManager::new(&AuthConfig {
            jwt_secret: SecretString::from("unit-test-secret"),
            access_ttl_secs: 15 * 60,
            refresh_ttl_secs: 7 * 24 * 60 * 60,
            cookie_domain: "localhost".into(),
            cookie_secure: false,
        })
    }

    #[test]
    fn mint_and_verify_round_trip() {
        let manager = test_manager();
        let user_id = Uuid::now_v7();

        let pair = manager.issue_pair(user_id).unwrap();
        assert_eq!(manager.verify(&pair.access).unwrap().sub, user_id);
        assert_eq!(manager.verify(&pair.refresh).unwrap().sub, user_id);
    }

    #[test]
    fn tampered_token_fails_signature() {
        let manager = test_manager();
        let token = manager.issue_access(Uuid::now_v7()).unwrap();

        let mut tampered = token.clone();
        tampered.push('x');
        assert_eq!(
            manager.verify(&tampered).unwrap_err(),
            AuthError::InvalidSignature
        );
    }

    #[test]
    fn foreign_secret_fails_signature() {
        let manager = test_manager();
        let foreign = JwtSessionManager::new(&AuthConfig {
            jwt_secret: SecretString::from("some-other-secret"),
            access_ttl_secs: 900,
            refresh_ttl_secs: 3600,
            cookie_domain: "localhost".into(),
            cookie_secure: false,
        });

        let token = foreign.issue_access(Uuid::now_v7()).unwrap();
        assert_eq!(
            manager.verify(&token).unwrap_err(),
            AuthError::InvalidSignature
        );
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let manager = test_manager();

        // Encode an already-dead token with the same secret, expired well
        // past the default validation leeway.
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::now_v7(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("unit-test-secret".as_bytes()),
        )
        .unwrap();

        assert_eq!(manager.verify(&token).unwrap_err(), AuthError::Expired);
    }
}
