//! Route table and middleware stack.

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware as axum_middleware;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use domains::DomainError;

use crate::handlers::{auth, categories, comments, interactions, threads, users};
use crate::middleware::{authenticate, require_not_banned};
use crate::state::AppState;

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Assembles the full application router.
///
/// Public routes serve reads and the session entry points; everything that
/// writes goes through `authenticate` (session resolution + transparent
/// refresh) and then the ban gate.
pub fn router(state: AppState, frontend_origin: &str) -> Result<Router, DomainError> {
    let origin = frontend_origin
        .parse::<HeaderValue>()
        .map_err(|_| DomainError::validation("frontend origin is not a valid header value"))?;

    // Credentials mode: cookies cross the origin boundary, so the allowed
    // origin must be explicit, never a wildcard.
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true);

    let public = Router::new()
        .route("/health", get(health))
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route("/api/categories", get(categories::list_categories))
        .route("/api/threads/{id}", get(threads::get_thread))
        .route("/api/threads/category/{category_id}", get(threads::list_by_category))
        .route("/api/threads/{id}/comments", get(comments::list_by_thread))
        .route("/api/users/{id}", get(users::get_profile));

    let protected = Router::new()
        .route("/api/change-password", post(auth::change_password))
        .route("/api/threads", post(threads::create_thread))
        .route("/api/threads/{id}", delete(threads::delete_thread))
        .route("/api/comments", post(comments::create_comment))
        .route("/api/comments/{id}", delete(comments::delete_comment))
        .route("/api/categories", post(categories::create_category))
        .route(
            "/api/interactions",
            get(interactions::list_interactions).post(interactions::create_interaction),
        )
        .route("/api/interactions/{id}", put(interactions::update_interaction))
        .route("/api/users/{id}/ban", put(users::toggle_ban))
        .route("/api/users/{id}/role", put(users::toggle_moderator))
        // Inner layer runs second: the ban gate sees the resolved principal.
        .layer(axum_middleware::from_fn(require_not_banned))
        .layer(axum_middleware::from_fn_with_state(state.clone(), authenticate));

    Ok(public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
