//! Comment CRUD. Creation and deletion also move the owning thread's
//! `comments` counter, atomically with the row write, inside the adapter.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use domains::{Comment, DomainError, NewComment};

use crate::error::ApiResult;
use crate::handlers::threads::Pagination;
use crate::middleware::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCommentBody {
    pub thread_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub content: String,
}

pub async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateCommentBody>,
) -> ApiResult<Response> {
    if body.content.trim().is_empty() {
        return Err(DomainError::validation("content must not be empty").into());
    }

    let comment = state
        .comments
        .create_with_stats(NewComment {
            thread_id: body.thread_id,
            author_id: user.id,
            parent_comment_id: body.parent_comment_id,
            content: body.content,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(comment)).into_response())
}

pub async fn list_by_thread(
    State(state): State<AppState>,
    Path(thread_id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<Vec<Comment>>> {
    let (limit, offset) = pagination.clamp();
    let comments = state.comments.list_by_thread(thread_id, limit, offset).await?;
    Ok(Json(comments))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let comment = state
        .comments
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("comment"))?;

    if comment.author_id != user.id && !user.role.is_staff() {
        return Err(DomainError::forbidden("not the author of this comment").into());
    }

    state.comments.soft_delete_with_stats(id).await?;
    Ok(Json(serde_json::json!({ "message": "comment deleted successfully" })))
}
