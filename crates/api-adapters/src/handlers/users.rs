//! Public profiles and staff moderation actions.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use domains::{DomainError, Role, User};

use crate::error::ApiResult;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Profile view: reputation is exposed as a plain read-only integer.
fn profile_body(user: &User) -> serde_json::Value {
    json!({
        "user_id": user.id,
        "username": user.username,
        "role": user.role,
        "reputation": user.reputation,
        "is_banned": user.is_banned,
        "created_at": user.created_at,
    })
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("user"))?;
    Ok(Json(profile_body(&user)))
}

/// Flips the ban flag. Banning also retracts the target's live threads and
/// comments; the nightly reputation pass then settles their score.
pub async fn toggle_ban(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let target = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("user"))?;

    if !actor.role.can_ban(target.role) {
        return Err(DomainError::forbidden("you do not have permission to ban this user").into());
    }

    let banning = !target.is_banned;
    state.users.set_banned(target.id, banning).await?;

    if banning {
        state.threads.soft_delete_by_author(target.id).await?;
        state.comments.soft_delete_by_author(target.id).await?;
    }

    let message = if banning {
        "successfully banned the user"
    } else {
        "successfully unbanned the user"
    };
    Ok(Json(json!({ "message": message })))
}

/// Admin-only toggle between the ordinary and moderator roles.
pub async fn toggle_moderator(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    if actor.role != Role::Admin {
        return Err(DomainError::forbidden("only admins can assign moderators").into());
    }

    let target = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("user"))?;

    if target.role == Role::Admin {
        return Err(DomainError::forbidden("cannot change another admin's role").into());
    }

    let new_role = if target.role == Role::Moderator {
        Role::User
    } else {
        Role::Moderator
    };
    state.users.set_role(target.id, new_role).await?;

    let message = if new_role == Role::Moderator {
        "successfully assigned user as moderator"
    } else {
        "successfully removed user from moderators"
    };
    Ok(Json(json!({ "message": message })))
}
