//! # configs
//!
//! Layered configuration for the agora binary: built-in defaults, then
//! `AGORA_*` environment variables (a local `.env` file is honored via
//! dotenvy). The result is one immutable [`AppConfig`] constructed at
//! startup and passed down explicitly; nothing in the core reads the
//! process environment on its own.
//!
//! Nested keys use `__` as the separator, e.g. `AGORA_SERVER__PORT=8080`,
//! `AGORA_AUTH__JWT_SECRET=...`, `AGORA_DATABASE__URL=postgres://...`.

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin allowed by the CORS layer; the SPA lives on another domain.
    pub frontend_origin: String,
    pub environment: Environment,
}

#[cfg(feature = "db-postgres")]
#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    pub url: SecretString,
    pub max_connections: u32,
}

#[cfg(feature = "auth-jwt")]
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 signing secret for both token kinds.
    pub jwt_secret: SecretString,
    /// Access token lifetime; short so a leaked token ages out quickly.
    pub access_ttl_secs: u64,
    /// Refresh token lifetime; bounds how long a session survives idle.
    pub refresh_ttl_secs: u64,
    /// Domain attribute stamped on session cookies.
    pub cookie_domain: String,
    /// Secure attribute on session cookies; off only in local development.
    pub cookie_secure: bool,
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[cfg(feature = "db-postgres")]
    pub database: DatabaseConfig,
    #[cfg(feature = "auth-jwt")]
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Loads defaults, then overlays `AGORA_*` environment variables.
    ///
    /// Secrets (database URL, JWT secret) have no defaults: a deployment
    /// that forgets them fails here, at startup, not on first use.
    pub fn load() -> Result<Self, ConfigError> {
        // Best effort: absence of a .env file is the normal production case.
        dotenvy::dotenv().ok();

        let builder = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080_i64)?
            .set_default("server.frontend_origin", "http://localhost:5173")?
            .set_default("server.environment", "development")?;

        #[cfg(feature = "db-postgres")]
        let builder = builder.set_default("database.max_connections", 16_i64)?;

        #[cfg(feature = "auth-jwt")]
        let builder = builder
            .set_default("auth.access_ttl_secs", 15_i64 * 60)?
            .set_default("auth.refresh_ttl_secs", 7_i64 * 24 * 60 * 60)?
            .set_default("auth.cookie_domain", "localhost")?
            .set_default("auth.cookie_secure", false)?;

        let config = builder
            .add_source(config::Environment::with_prefix("AGORA").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parsing() {
        assert!(Environment::Production.is_production());
        assert!(!Environment::Development.is_production());
    }
}
