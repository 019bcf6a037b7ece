use anyhow::anyhow;
use async_openai::types::{
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{middleware, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::types::Uuid;

use promptmarket_common::ModuleClient;
use promptmarket_database::{QueryCriteria, SqlxFilterQuery};
use promptmarket_market::{fill_template, resolve_access, GenerationInput, ProductRef, PromptTemplate};

use crate::middleware::{authenticate, ensure_profile};
use crate::response::{AppError, AppSuccess};
use crate::GlobalState;

const GENERATION_TEMPERATURE: f32 = 0.8;
const GENERATION_MAX_TOKENS: u32 = 2048;

pub fn generation_routes() -> Router<GlobalState> {
    Router::new().route(
        "/generate-prompt",
        post(generate_prompt).route_layer(middleware::from_fn(authenticate)),
    )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(flatten)]
    pub input: GenerationInput,
}

/// Entitlement-gated generation. An LLM failure degrades to the filled
/// template text instead of erroring; the buyer always leaves with content.
async fn generate_prompt(
    State(state): State<GlobalState>,
    Extension(caller): Extension<Uuid>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Response, AppError> {
    let profile = ensure_profile(&state, caller).await?;

    if payload.input.topic.trim().is_empty() {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            anyhow!("[/generate-prompt] topic is required"),
        ));
    }
    let product = ProductRef::parse(&payload.type_name)?;

    let pool: &sqlx::PgPool = state.db.get_client();

    let access = resolve_access(pool, profile.id, &product).await?;
    if !access.owns {
        return Ok(AppError::new(
            StatusCode::FORBIDDEN,
            anyhow!("[/generate-prompt] purchase required"),
        )
        .with_data(json!({
            "requiresPurchase": true,
            "type": product.to_string(),
        })));
    }

    let template = PromptTemplate::find_one_by_criteria(
        QueryCriteria::new().add_valued_filter("type_name", "=", product.to_string()),
        pool,
    )
    .await?
    .ok_or_else(|| {
        AppError::new(
            StatusCode::NOT_FOUND,
            anyhow!("[/generate-prompt] template not found"),
        )
    })?;

    let filled = fill_template(&template.template, &payload.input);

    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
    let request = CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages(vec![ChatCompletionRequestUserMessageArgs::default()
            .content(filled.clone())
            .build()?
            .into()])
        .temperature(GENERATION_TEMPERATURE)
        .max_tokens(GENERATION_MAX_TOKENS)
        .build()?;

    let generated = match state.llm.get_client().chat().create(request).await {
        Ok(response) => response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone()),
        Err(e) => {
            tracing::warn!("[/generate-prompt] llm call failed, degrading: {}", e);
            None
        }
    };

    let success = match generated {
        Some(content) => AppSuccess::new(
            StatusCode::OK,
            "Content generated",
            json!({
                "title": template.title,
                "content": content,
                "generated": true,
            }),
        ),
        None => AppSuccess::new(
            StatusCode::OK,
            "Content generated",
            json!({
                "title": format!("{} (Template)", template.title),
                "content": filled,
                "generated": false,
            }),
        ),
    };

    Ok(success.into_response())
}
