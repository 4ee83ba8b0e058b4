//! # api-adapters
//!
//! The HTTP transport layer: axum handlers, the session middleware that
//! gates every protected entry point, and the cookie plumbing both share.

#[cfg(feature = "web-axum")]
pub mod cookies;
#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod middleware;
#[cfg(feature = "web-axum")]
pub mod routes;
#[cfg(feature = "web-axum")]
pub mod state;

#[cfg(feature = "web-axum")]
pub use middleware::CurrentUser;
#[cfg(feature = "web-axum")]
pub use routes::router;
#[cfg(feature = "web-axum")]
pub use state::{AppState, CookieSettings};
