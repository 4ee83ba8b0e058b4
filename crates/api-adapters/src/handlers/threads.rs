//! Thread CRUD. Thin orchestration over the ports; the interesting counter
//! work happens in the storage adapter.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use domains::{DomainError, NewThread, Thread};

use crate::error::ApiResult;
use crate::middleware::CurrentUser;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    pub fn clamp(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateThreadBody {
    pub category_id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub async fn create_thread(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateThreadBody>,
) -> ApiResult<Response> {
    if body.title.trim().is_empty() {
        return Err(DomainError::validation("title must not be empty").into());
    }
    if body.content.trim().is_empty() {
        return Err(DomainError::validation("content must not be empty").into());
    }

    let thread = state
        .threads
        .create(NewThread {
            author_id: user.id,
            category_id: body.category_id,
            title: body.title,
            content: body.content,
            tags: body.tags,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(thread)).into_response())
}

pub async fn get_thread(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Thread>> {
    let thread = state
        .threads
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("thread"))?;
    Ok(Json(thread))
}

pub async fn list_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<Vec<Thread>>> {
    let (limit, offset) = pagination.clamp();
    let threads = state.threads.list_by_category(category_id, limit, offset).await?;
    Ok(Json(threads))
}

/// Authors delete their own threads; staff may delete anyone's.
pub async fn delete_thread(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let thread = state
        .threads
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("thread"))?;

    if thread.author_id != user.id && !user.role.is_staff() {
        return Err(DomainError::forbidden("not the author of this thread").into());
    }

    state.threads.soft_delete(id).await?;
    Ok(Json(serde_json::json!({ "message": "thread deleted successfully" })))
}
