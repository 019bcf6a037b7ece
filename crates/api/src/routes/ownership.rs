use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::types::Uuid;

use promptmarket_common::ModuleClient;
use promptmarket_market::{owned_product_types, resolve_access, ProductRef};

use crate::middleware::{authenticate, ensure_profile};
use crate::response::{AppError, AppSuccess};
use crate::GlobalState;

pub fn ownership_routes() -> Router<GlobalState> {
    Router::new()
        .route(
            "/check-ownership",
            post(check_ownership).route_layer(middleware::from_fn(authenticate)),
        )
        .route(
            "/check-prompt-creator",
            post(check_prompt_creator).route_layer(middleware::from_fn(authenticate)),
        )
        .route(
            "/owned-prompts",
            get(owned_prompts).route_layer(middleware::from_fn(authenticate)),
        )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductTypeRequest {
    #[serde(rename = "type")]
    pub type_name: String,
}

async fn check_ownership(
    State(state): State<GlobalState>,
    Extension(caller): Extension<Uuid>,
    Json(payload): Json<ProductTypeRequest>,
) -> Result<AppSuccess, AppError> {
    let profile = ensure_profile(&state, caller).await?;
    let product = ProductRef::parse(&payload.type_name)?;

    let pool: &sqlx::PgPool = state.db.get_client();
    let access = resolve_access(pool, profile.id, &product).await?;

    Ok(AppSuccess::new(
        StatusCode::OK,
        "Ownership resolved",
        json!({
            "owns": access.owns,
            "isAdmin": access.is_admin,
            "isCreator": access.is_creator,
        }),
    ))
}

async fn check_prompt_creator(
    State(state): State<GlobalState>,
    Extension(caller): Extension<Uuid>,
    Json(payload): Json<ProductTypeRequest>,
) -> Result<AppSuccess, AppError> {
    let profile = ensure_profile(&state, caller).await?;
    let product = ProductRef::parse(&payload.type_name)?;

    // only seller templates have a creator to speak of
    if !product.is_seller() {
        return Ok(AppSuccess::new(
            StatusCode::OK,
            "Creator resolved",
            json!({ "isCreator": false }),
        ));
    }

    let pool: &sqlx::PgPool = state.db.get_client();
    let access = resolve_access(pool, profile.id, &product).await?;

    Ok(AppSuccess::new(
        StatusCode::OK,
        "Creator resolved",
        json!({ "isCreator": access.is_creator }),
    ))
}

async fn owned_prompts(
    State(state): State<GlobalState>,
    Extension(caller): Extension<Uuid>,
) -> Result<AppSuccess, AppError> {
    let profile = ensure_profile(&state, caller).await?;

    let pool: &sqlx::PgPool = state.db.get_client();
    let owned = owned_product_types(pool, profile.id).await?;

    let prompts = owned
        .iter()
        .map(|entry| {
            json!({
                "productType": entry.product_type,
                "promptId": entry.prompt_id,
                "amountCents": entry.amount_cents,
                "purchasedAt": entry.purchased_at,
                "promptTitle": entry.prompt_title,
                "sellerName": entry.seller_name,
                "isSellerPrompt": entry.is_seller_prompt(),
            })
        })
        .collect::<Vec<_>>();

    Ok(AppSuccess::new(
        StatusCode::OK,
        "Owned prompts",
        json!({ "prompts": prompts }),
    ))
}
