//! Account lifecycle: register, login, logout, password change.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use auth_adapters::{hash_password, verify_password};
use domains::{DomainError, NewUser};

use crate::cookies::{clear_cookie, set_cookie, ACCESS_COOKIE, REFRESH_COOKIE};
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

fn validate_username(username: &str) -> Result<(), DomainError> {
    if username.is_empty() || username.len() > 32 {
        return Err(DomainError::validation("username must be 1-32 characters"));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(DomainError::validation(
            "username can only contain letters, numbers, underscores, and dashes",
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), DomainError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(
            "password must be at least 8 characters long",
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub username: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> ApiResult<Response> {
    validate_username(&body.username)?;
    validate_password(&body.password)?;

    let password_hash = hash_password(&body.password)?;
    state
        .users
        .create(NewUser { username: body.username, password_hash })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "user created successfully" })),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> ApiResult<Response> {
    // One uniform rejection for unknown name and wrong password; the
    // difference is not for callers to observe.
    let rejected = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid username or password" })),
        )
            .into_response()
    };

    let Some(user) = state.users.find_by_username(&body.username).await? else {
        return Ok(rejected());
    };
    if !verify_password(&body.password, &user.password_hash) {
        return Ok(rejected());
    }

    let pair = state.sessions.issue_pair(user.id)?;

    let mut response =
        (StatusCode::OK, Json(json!({ "message": "login successful" }))).into_response();
    append_cookie(
        &mut response,
        set_cookie(ACCESS_COOKIE, &pair.access, state.sessions.access_ttl(), &state.cookies),
    )?;
    append_cookie(
        &mut response,
        set_cookie(REFRESH_COOKIE, &pair.refresh, state.sessions.refresh_ttl(), &state.cookies),
    )?;
    Ok(response)
}

/// Logout is purely client-side: both cookies are expired. Any token the
/// client already leaked stays valid until its own expiry.
pub async fn logout(State(state): State<AppState>) -> ApiResult<Response> {
    let mut response =
        (StatusCode::OK, Json(json!({ "message": "logout successful" }))).into_response();
    append_cookie(&mut response, clear_cookie(ACCESS_COOKIE, &state.cookies))?;
    append_cookie(&mut response, clear_cookie(REFRESH_COOKIE, &state.cookies))?;
    Ok(response)
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordBody {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<ChangePasswordBody>,
) -> ApiResult<Json<serde_json::Value>> {
    validate_password(&body.new_password)?;
    if body.new_password != body.confirm_password {
        return Err(DomainError::validation("new password and confirmation do not match").into());
    }
    if !verify_password(&body.current_password, &user.password_hash) {
        return Err(DomainError::forbidden("current password is incorrect").into());
    }

    let password_hash = hash_password(&body.new_password)?;
    state.users.update_password(user.id, &password_hash).await?;

    Ok(Json(json!({ "message": "password updated successfully" })))
}

fn append_cookie(response: &mut Response, cookie: String) -> Result<(), ApiError> {
    let value = HeaderValue::from_str(&cookie)
        .map_err(|err| ApiError(DomainError::internal(err)))?;
    response.headers_mut().append(SET_COOKIE, value);
    Ok(())
}
