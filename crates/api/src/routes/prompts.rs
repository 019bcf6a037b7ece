use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::types::Uuid;

use promptmarket_common::ModuleClient;
use promptmarket_database::SqlxCrud;
use promptmarket_market::{CatalogFilter, ProductType, Prompt, PromptTemplate};

use crate::middleware::{authenticate, ensure_profile, ensure_seller};
use crate::response::{AppError, AppSuccess};
use crate::GlobalState;

pub fn prompt_routes() -> Router<GlobalState> {
    Router::new()
        .route(
            "/create-prompt",
            post(create_prompt).route_layer(middleware::from_fn(authenticate)),
        )
        .route(
            "/available-seller-prompts",
            get(available_seller_prompts).route_layer(middleware::from_fn(authenticate)),
        )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePromptRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub content: String,
    #[serde(default)]
    pub price_cents: i64,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub type_display_name: Option<String>,
    #[serde(default)]
    pub type_description: Option<String>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub is_public: bool,
}

fn default_category() -> String {
    "custom".to_string()
}

/// Direct publish without the draft detour: registers the product type, then
/// inserts the Prompt and its seller template in one transaction.
async fn create_prompt(
    State(state): State<GlobalState>,
    Extension(caller): Extension<Uuid>,
    Json(payload): Json<CreatePromptRequest>,
) -> Result<AppSuccess, AppError> {
    let profile = ensure_profile(&state, caller).await?;
    ensure_seller(&profile)?;

    if payload.title.trim().is_empty()
        || payload.content.trim().is_empty()
        || payload.type_name.trim().is_empty()
    {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            anyhow::anyhow!("[/create-prompt] Missing required fields: title, content, type"),
        ));
    }

    let pool: &sqlx::PgPool = state.db.get_client();

    ProductType::get_or_create(
        pool,
        &payload.type_name,
        payload.type_display_name.as_deref(),
        payload.type_description.as_deref(),
        &payload.category,
        Some(profile.id),
    )
    .await?;

    let mut tx = pool.begin().await?;
    let prompt = Prompt::new(
        payload.title,
        payload.description.unwrap_or_default(),
        payload.content,
        payload.price_cents,
        payload.type_name,
        payload.is_public,
        profile.id,
    )
    .create(&mut *tx)
    .await?;
    let template = PromptTemplate::for_prompt(&prompt, profile.id)
        .create(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(
        "prompt {} created by seller {} as template {}",
        prompt.id,
        profile.id,
        template.type_name
    );
    Ok(AppSuccess::new(
        StatusCode::OK,
        "Prompt created",
        json!({ "prompt": prompt, "template": template }),
    ))
}

/// Public catalog. Anonymous callers see public templates only; signed-in
/// sellers additionally see their own private ones.
async fn available_seller_prompts(
    State(state): State<GlobalState>,
    Extension(caller): Extension<Uuid>,
    Query(filter): Query<CatalogFilter>,
) -> Result<AppSuccess, AppError> {
    let viewer = (!caller.is_nil()).then_some(caller);

    let pool: &sqlx::PgPool = state.db.get_client();
    let templates = PromptTemplate::list_available(pool, viewer, &filter).await?;

    Ok(AppSuccess::new(
        StatusCode::OK,
        "Available seller prompts",
        json!({ "prompts": templates }),
    ))
}
