use anyhow::anyhow;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, post};
use axum::{middleware, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::types::Uuid;

use promptmarket_common::ModuleClient;
use promptmarket_database::SqlxCrud;
use promptmarket_market::{DraftInput, PromptDraft};

use crate::middleware::{authenticate, ensure_profile, ensure_seller};
use crate::response::{AppError, AppSuccess};
use crate::GlobalState;

pub fn draft_routes() -> Router<GlobalState> {
    Router::new()
        .route(
            "/save-draft",
            post(save_draft)
                .get(list_drafts)
                .route_layer(middleware::from_fn(authenticate)),
        )
        .route(
            "/publish-draft",
            post(publish_draft).route_layer(middleware::from_fn(authenticate)),
        )
        .route(
            "/delete-draft/{draft_id}",
            delete(delete_draft).route_layer(middleware::from_fn(authenticate)),
        )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveDraftRequest {
    #[serde(rename = "draftId", default)]
    pub draft_id: Option<Uuid>,
    #[serde(flatten)]
    pub input: DraftInput,
}

/// Creates a draft, or updates an existing one when `draftId` is present.
/// Updates only land on the caller's own draft-status rows; everything else
/// reads as not found.
async fn save_draft(
    State(state): State<GlobalState>,
    Extension(caller): Extension<Uuid>,
    Json(payload): Json<SaveDraftRequest>,
) -> Result<AppSuccess, AppError> {
    let profile = ensure_profile(&state, caller).await?;
    ensure_seller(&profile)?;

    let pool: &sqlx::PgPool = state.db.get_client();

    let draft = match payload.draft_id {
        Some(draft_id) => {
            PromptDraft::update_fields(pool, draft_id, profile.id, payload.input)
                .await?
                .ok_or_else(|| {
                    AppError::new(
                        StatusCode::NOT_FOUND,
                        anyhow!("[/save-draft] draft not found or not editable"),
                    )
                })?
        }
        None => PromptDraft::new(profile.id, payload.input)?.create(pool).await?,
    };

    Ok(AppSuccess::new(
        StatusCode::OK,
        "Draft saved",
        json!({ "draft": draft }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct DraftListQuery {
    #[serde(default)]
    pub include_published: bool,
}

async fn list_drafts(
    State(state): State<GlobalState>,
    Extension(caller): Extension<Uuid>,
    Query(query): Query<DraftListQuery>,
) -> Result<AppSuccess, AppError> {
    let profile = ensure_profile(&state, caller).await?;
    ensure_seller(&profile)?;

    let pool: &sqlx::PgPool = state.db.get_client();
    let drafts = PromptDraft::list_for_seller(pool, profile.id, query.include_published).await?;

    Ok(AppSuccess::new(
        StatusCode::OK,
        "Drafts",
        json!({ "drafts": drafts }),
    ))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublishDraftRequest {
    #[serde(rename = "draftId")]
    pub draft_id: Uuid,
}

async fn publish_draft(
    State(state): State<GlobalState>,
    Extension(caller): Extension<Uuid>,
    Json(payload): Json<PublishDraftRequest>,
) -> Result<AppSuccess, AppError> {
    let profile = ensure_profile(&state, caller).await?;
    ensure_seller(&profile)?;

    let pool: &sqlx::PgPool = state.db.get_client();
    let outcome = PromptDraft::publish(pool, payload.draft_id, profile.id)
        .await?
        .ok_or_else(|| {
            AppError::new(
                StatusCode::NOT_FOUND,
                anyhow!("[/publish-draft] draft not found or already published"),
            )
        })?;

    Ok(AppSuccess::new(
        StatusCode::OK,
        "Draft published",
        json!({
            "promptId": outcome.prompt_id,
            "templateId": outcome.template_id,
        }),
    ))
}

async fn delete_draft(
    State(state): State<GlobalState>,
    Extension(caller): Extension<Uuid>,
    Path(draft_id): Path<Uuid>,
) -> Result<AppSuccess, AppError> {
    let profile = ensure_profile(&state, caller).await?;
    ensure_seller(&profile)?;

    let pool: &sqlx::PgPool = state.db.get_client();
    let removed = PromptDraft::delete_for_seller(pool, draft_id, profile.id).await?;
    if removed == 0 {
        return Err(AppError::new(
            StatusCode::NOT_FOUND,
            anyhow!("[/delete-draft] draft not found"),
        ));
    }

    Ok(AppSuccess::new(StatusCode::OK, "Draft deleted", json!({})))
}
