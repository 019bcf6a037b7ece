use anyhow::anyhow;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{middleware, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::types::Uuid;

use promptmarket_common::ModuleClient;
use promptmarket_database::{OrderDirection, QueryCriteria, SqlxFilterQuery};
use promptmarket_market::ProductType;

use crate::middleware::{authenticate, ensure_profile};
use crate::response::{AppError, AppSuccess};
use crate::GlobalState;

pub fn product_type_routes() -> Router<GlobalState> {
    // authenticate is a no-op for anonymous callers, so the public GET can
    // share the method router
    Router::new().route(
        "/product-types",
        get(list_product_types)
            .post(create_product_type)
            .route_layer(middleware::from_fn(authenticate)),
    )
}

async fn list_product_types(State(state): State<GlobalState>) -> Result<AppSuccess, AppError> {
    let pool: &sqlx::PgPool = state.db.get_client();
    let product_types = ProductType::find_by_criteria(
        QueryCriteria::new().order_by("name", OrderDirection::Asc),
        pool,
    )
    .await?;

    Ok(AppSuccess::new(
        StatusCode::OK,
        "Product types",
        json!({ "productTypes": product_types }),
    ))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateProductTypeRequest {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    "custom".to_string()
}

async fn create_product_type(
    State(state): State<GlobalState>,
    Extension(caller): Extension<Uuid>,
    Json(payload): Json<CreateProductTypeRequest>,
) -> Result<AppSuccess, AppError> {
    let profile = ensure_profile(&state, caller).await?;
    if !profile.role.can_manage_product_types() {
        return Err(AppError::new(
            StatusCode::FORBIDDEN,
            anyhow!("[/product-types] seller or admin account required"),
        ));
    }

    if payload.name.trim().is_empty() {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            anyhow!("[/product-types] name is required"),
        ));
    }

    let pool: &sqlx::PgPool = state.db.get_client();
    let product_type = ProductType::get_or_create(
        pool,
        &payload.name,
        payload.display_name.as_deref(),
        payload.description.as_deref(),
        &payload.category,
        Some(profile.id),
    )
    .await?;

    Ok(AppSuccess::new(
        StatusCode::OK,
        "Product type registered",
        json!({ "productType": product_type }),
    ))
}
