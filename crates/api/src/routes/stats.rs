use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{middleware, Router};
use serde_json::json;
use sqlx::types::Uuid;

use promptmarket_common::{get_current_timestamp, ModuleClient};
use promptmarket_database::{QueryCriteria, SqlxFilterQuery, SqlxSchema};
use promptmarket_market::{aggregate_seller_stats, Prompt, Purchase};

use crate::middleware::{authenticate, ensure_profile, ensure_seller};
use crate::response::{AppError, AppSuccess};
use crate::GlobalState;

const RECENT_SALES_LIMIT: usize = 10;

pub fn stats_routes() -> Router<GlobalState> {
    Router::new().route(
        "/seller-stats",
        get(seller_stats).route_layer(middleware::from_fn(authenticate)),
    )
}

async fn seller_stats(
    State(state): State<GlobalState>,
    Extension(caller): Extension<Uuid>,
) -> Result<AppSuccess, AppError> {
    let profile = ensure_profile(&state, caller).await?;
    ensure_seller(&profile)?;

    let pool: &sqlx::PgPool = state.db.get_client();

    let prompts = Prompt::find_by_criteria(
        QueryCriteria::new().add_valued_filter("author_id", "=", profile.id),
        pool,
    )
    .await?;
    let prompt_ids = prompts.iter().map(|p| p.get_id_value()).collect::<Vec<_>>();
    let purchases = Purchase::completed_for_prompts(pool, &prompt_ids).await?;

    let report = aggregate_seller_stats(&prompts, &purchases, get_current_timestamp());
    // completed_for_prompts returns newest first
    let recent_sales = purchases
        .iter()
        .take(RECENT_SALES_LIMIT)
        .collect::<Vec<_>>();

    Ok(AppSuccess::new(
        StatusCode::OK,
        "Seller stats",
        json!({ "stats": report, "recentSales": recent_sales }),
    ))
}
