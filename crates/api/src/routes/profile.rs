use anyhow::anyhow;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{middleware, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::types::Uuid;

use promptmarket_common::ModuleClient;
use promptmarket_database::{QueryCriteria, SqlxCrud, SqlxFilterQuery};
use promptmarket_market::{Profile, UserRole};

use crate::middleware::authenticate;
use crate::response::{AppError, AppSuccess};
use crate::GlobalState;

pub fn profile_routes() -> Router<GlobalState> {
    Router::new().route(
        "/user/register",
        post(register).route_layer(middleware::from_fn(authenticate)),
    )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub display_name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
}

async fn register(
    State(state): State<GlobalState>,
    Extension(caller): Extension<Uuid>,
    Json(payload): Json<RegisterRequest>,
) -> Result<AppSuccess, AppError> {
    if caller.is_nil() {
        return Err(AppError::new(
            StatusCode::UNAUTHORIZED,
            anyhow!("[/user/register] authentication required"),
        ));
    }

    if payload.username.trim().is_empty() || payload.display_name.trim().is_empty() {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            anyhow!("[/user/register] username and display_name are required"),
        ));
    }

    // role is fixed at signup; admin cannot be self-assigned
    let role = payload.role.unwrap_or_default();
    if role.is_admin() {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            anyhow!("[/user/register] invalid role"),
        ));
    }

    let pool: &sqlx::PgPool = state.db.get_client();

    if Profile::find_by_id(caller, pool).await?.is_some() {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            anyhow!("[/user/register] profile already exists"),
        ));
    }

    let username_taken = Profile::find_one_by_criteria(
        QueryCriteria::new().add_valued_filter("username", "=", payload.username.clone()),
        pool,
    )
    .await?
    .is_some();
    if username_taken {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            anyhow!("[/user/register] username already taken"),
        ));
    }

    let profile = Profile::new(
        caller,
        payload.username,
        payload.display_name,
        payload.bio,
        role,
    )
    .create(pool)
    .await?;

    tracing::info!("profile {} registered as {}", profile.id, profile.role);
    Ok(AppSuccess::new(
        StatusCode::OK,
        "Profile created",
        json!({ "profile": profile }),
    ))
}
