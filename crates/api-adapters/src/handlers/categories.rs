//! Category listing and (admin-only) creation.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use domains::{Category, DomainError, Role};

use crate::error::ApiResult;
use crate::middleware::CurrentUser;
use crate::state::AppState;

pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.categories.list().await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryBody {
    pub name: String,
}

pub async fn create_category(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateCategoryBody>,
) -> ApiResult<Response> {
    if user.role != Role::Admin {
        return Err(DomainError::forbidden("only admins can create categories").into());
    }
    let name = body.name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("category name must not be empty").into());
    }

    let category = state.categories.create(name).await?;
    Ok((StatusCode::CREATED, Json(category)).into_response())
}
