//! Session middleware: resolves the authenticated principal for every
//! protected request, transparently renewing an expired access token from
//! the refresh token.
//!
//! State machine per request:
//!   access valid                      → proceed
//!   access absent/invalid/expired,
//!   refresh valid                     → mint access, set cookie, proceed
//!   refresh absent/invalid/expired    → 401, processing halts

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::SET_COOKIE;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use domains::{AuthError, DomainError, User};

use crate::cookies::{cookie_value, set_cookie, ACCESS_COOKIE, REFRESH_COOKIE};
use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated principal, inserted by [`authenticate`] and extracted
/// by handlers. Carrying the full user row means handlers never re-resolve
/// identity or downcast anything out of ambient request context.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError(DomainError::Auth(AuthError::MissingCredential)))
    }
}

/// Protected-route layer: resolve or renew the session, then run the rest
/// of the stack with `CurrentUser` attached. A renewed access token is
/// appended to the response on the way out.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let (user, minted) = match resolve_session(&state, request.headers()).await {
        Ok(resolved) => resolved,
        Err(err) => return ApiError(err).into_response(),
    };

    request.extensions_mut().insert(CurrentUser(user));
    let mut response = next.run(request).await;

    if let Some(token) = minted {
        let cookie = set_cookie(ACCESS_COOKIE, &token, state.sessions.access_ttl(), &state.cookies);
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(err) => warn!(error = %err, "dropping unencodable session cookie"),
        }
    }
    response
}

/// Ban gate, layered inside [`authenticate`] on the protected routes.
pub async fn require_not_banned(request: Request, next: Next) -> Response {
    match request.extensions().get::<CurrentUser>() {
        Some(CurrentUser(user)) if user.is_banned => {
            ApiError(DomainError::forbidden("account is banned")).into_response()
        }
        Some(_) => next.run(request).await,
        None => ApiError(DomainError::Auth(AuthError::MissingCredential)).into_response(),
    }
}

/// Resolves the caller's identity from the session cookies. Returns the
/// user and, when the access token had to be renewed, the fresh token.
async fn resolve_session(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(User, Option<String>), DomainError> {
    if let Some(token) = cookie_value(headers, ACCESS_COOKIE) {
        match state.sessions.verify(&token) {
            Ok(claims) => return Ok((load_user(state, claims.sub).await?, None)),
            // Expired or garbled: both fall through to the refresh token.
            Err(err) => debug!(error = %err, "access token rejected, trying refresh"),
        }
    }

    let refresh = cookie_value(headers, REFRESH_COOKIE)
        .ok_or(DomainError::Auth(AuthError::MissingCredential))?;
    let claims = state.sessions.verify(&refresh).map_err(DomainError::Auth)?;

    let user = load_user(state, claims.sub).await?;
    let minted = state.sessions.issue_access(user.id)?;
    Ok((user, Some(minted)))
}

async fn load_user(state: &AppState, user_id: uuid::Uuid) -> Result<User, DomainError> {
    state.users.find_by_id(user_id).await?.ok_or_else(|| {
        // A verified token pointing at no account: treat the credential as
        // dead rather than leaking which ids exist.
        warn!(%user_id, "session token resolved to unknown user");
        DomainError::Auth(AuthError::InvalidSignature)
    })
}
