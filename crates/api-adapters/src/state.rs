//! Shared application state handed to every handler.

use std::sync::Arc;

use configs::AuthConfig;

use auth_adapters::JwtSessionManager;
use domains::{CategoryRepo, CommentRepo, ThreadRepo, UserRepo};
use services::{InteractionService, ReputationService};

/// Cookie attributes that vary by deployment (domain, Secure flag).
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub domain: String,
    pub secure: bool,
}

impl CookieSettings {
    pub fn from_auth_config(config: &AuthConfig) -> Self {
        Self {
            domain: config.cookie_domain.clone(),
            secure: config.cookie_secure,
        }
    }
}

/// Everything the API layer needs, assembled once in the binary.
/// Dynamic dispatch at the ports keeps handlers testable against fakes.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepo>,
    pub threads: Arc<dyn ThreadRepo>,
    pub comments: Arc<dyn CommentRepo>,
    pub categories: Arc<dyn CategoryRepo>,
    pub interactions: Arc<InteractionService>,
    pub reputation: Arc<ReputationService>,
    pub sessions: Arc<JwtSessionManager>,
    pub cookies: CookieSettings,
}
