//! The ledger's HTTP face: record, toggle/switch, and read back votes and
//! follows. All three routes sit behind the session middleware.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use domains::{Interaction, InteractionKind, TargetRef};
use services::InteractionUpdate;

use crate::error::ApiResult;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Wire form of a ledger row, echoing the target as the optional id pair
/// clients sent in.
fn interaction_body(interaction: &Interaction) -> serde_json::Value {
    json!({
        "interaction_id": interaction.id,
        "user_id": interaction.user_id,
        "thread_id": interaction.target.thread_id(),
        "comment_id": interaction.target.comment_id(),
        "interaction_type": interaction.kind.as_str(),
        "created_at": interaction.created_at,
    })
}

#[derive(Debug, Deserialize)]
pub struct TargetQuery {
    pub thread_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
}

pub async fn list_interactions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<TargetQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let target = TargetRef::from_parts(query.thread_id, query.comment_id)?;
    let interactions = state.interactions.list(user.id, target).await?;

    Ok(Json(json!({
        "interactions": interactions.iter().map(interaction_body).collect::<Vec<_>>(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct CreateInteractionBody {
    pub thread_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
    pub interaction_type: String,
}

pub async fn create_interaction(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateInteractionBody>,
) -> ApiResult<Response> {
    let target = TargetRef::from_parts(body.thread_id, body.comment_id)?;
    let kind = InteractionKind::parse(&body.interaction_type)?;

    let interaction = state.interactions.create(user.id, target, kind).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "interaction created successfully",
            "interaction": interaction_body(&interaction),
        })),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct UpdateInteractionBody {
    pub interaction_type: String,
}

pub async fn update_interaction(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateInteractionBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let requested = InteractionKind::parse(&body.interaction_type)?;

    let outcome = state.interactions.update(user.id, id, requested).await?;
    Ok(Json(match outcome {
        InteractionUpdate::Removed => json!({ "message": "interaction removed" }),
        InteractionUpdate::Switched(interaction) => json!({
            "message": "interaction updated",
            "interaction": interaction_body(&interaction),
        }),
    }))
}
