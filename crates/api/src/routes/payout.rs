use anyhow::anyhow;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{middleware, Json, Router};
use serde_json::json;
use sqlx::types::Uuid;

use promptmarket_common::ModuleClient;
use promptmarket_database::SqlxCrud;
use promptmarket_market::{PayoutDetails, PayoutMethod};

use crate::middleware::{authenticate, ensure_profile, ensure_seller};
use crate::response::{AppError, AppSuccess};
use crate::GlobalState;

pub fn payout_routes() -> Router<GlobalState> {
    Router::new()
        .route(
            "/payout-method",
            post(save_payout_method).route_layer(middleware::from_fn(authenticate)),
        )
        .route(
            "/payout-request",
            post(request_payout).route_layer(middleware::from_fn(authenticate)),
        )
}

async fn save_payout_method(
    State(state): State<GlobalState>,
    Extension(caller): Extension<Uuid>,
    Json(payload): Json<PayoutDetails>,
) -> Result<AppSuccess, AppError> {
    let profile = ensure_profile(&state, caller).await?;
    ensure_seller(&profile)?;

    let pool: &sqlx::PgPool = state.db.get_client();
    let method = PayoutMethod::from_details(profile.id, &payload)?
        .upsert(pool)
        .await?;

    Ok(AppSuccess::new(
        StatusCode::OK,
        "Payout method saved",
        json!({ "payoutMethod": method }),
    ))
}

/// Accepts the request and verifies a payout destination exists. Actual
/// disbursement is handled out of band until a payouts provider is wired in.
async fn request_payout(
    State(state): State<GlobalState>,
    Extension(caller): Extension<Uuid>,
) -> Result<AppSuccess, AppError> {
    let profile = ensure_profile(&state, caller).await?;
    ensure_seller(&profile)?;

    let pool: &sqlx::PgPool = state.db.get_client();
    let method = PayoutMethod::find_by_id(profile.id, pool)
        .await?
        .ok_or_else(|| {
            AppError::new(
                StatusCode::BAD_REQUEST,
                anyhow!("[/payout-request] no payout method on file"),
            )
        })?;

    tracing::info!(
        "payout requested by seller {} via {}",
        profile.id,
        method.method
    );
    Ok(AppSuccess::new(
        StatusCode::OK,
        "Payout request received",
        json!({ "status": "queued", "method": method.method }),
    ))
}
