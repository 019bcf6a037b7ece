use anyhow::Result;
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use promptmarket_api::{
    checkout_routes, draft_routes, generation_routes, ownership_routes, payout_routes,
    product_type_routes, profile_routes, prompt_routes, setup_tracing, stats_routes, GlobalState,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    setup_tracing();

    let cors = CorsLayer::very_permissive();
    let trace = TraceLayer::new_for_http();

    let state = GlobalState::new().await;

    let app = Router::new()
        .merge(profile_routes())
        .merge(ownership_routes())
        .merge(draft_routes())
        .merge(prompt_routes())
        .merge(product_type_routes())
        .merge(checkout_routes())
        .merge(stats_routes())
        .merge(payout_routes())
        .merge(generation_routes())
        .layer(cors)
        .layer(trace)
        .with_state(state);

    let port: u16 = std::env::var("PORT")
        .unwrap_or("3033".into())
        .parse()
        .expect("failed to convert to number");

    let listener = tokio::net::TcpListener::bind(format!(":::{port}")).await?;

    tracing::info!("LISTENING ON {port}");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
