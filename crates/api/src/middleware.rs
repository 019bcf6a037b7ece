use anyhow::anyhow;
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;

use promptmarket_common::{decrypt, get_current_timestamp, EnvVars, ModuleClient};
use promptmarket_database::SqlxCrud;
use promptmarket_market::Profile;

use crate::env::ApiServerEnv;
use crate::response::AppError;
use crate::utils::extract_bearer_token;
use crate::GlobalState;

/// Tokens older than this are rejected.
const TOKEN_TTL_SECS: i64 = 3600;

/// Decrypted bearer token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedRequest {
    pub user_id: Uuid,
    pub timestamp: i64,
    pub origin: String,
}

/// Decrypts the bearer token and stores the caller id as a request extension.
///
/// A missing or invalid credential does not fail the request here; the caller
/// id falls back to the nil uuid and routes that require an account reject it
/// through `ensure_profile`. Routes with an anonymous mode read the nil id
/// directly.
pub async fn authenticate(mut req: Request, next: Next) -> Result<Response<Body>, AppError> {
    let env = ApiServerEnv::load();
    let caller = extract_bearer_token(&req)
        .and_then(|token| {
            decrypt(&token, &env.get_env_var("SECRET_SALT"))
                .map_err(|e| AppError::new(StatusCode::UNAUTHORIZED, anyhow!(e)))
        })
        .and_then(|decrypted| {
            serde_json::from_str::<AuthenticatedRequest>(&decrypted)
                .map_err(|e| AppError::new(StatusCode::UNAUTHORIZED, anyhow!(e)))
        })
        .and_then(|authenticated_request| {
            if authenticated_request.timestamp < get_current_timestamp() - TOKEN_TTL_SECS {
                return Err(AppError::new(
                    StatusCode::UNAUTHORIZED,
                    anyhow!("credential expired"),
                ));
            }
            Ok(authenticated_request.user_id)
        })
        .unwrap_or(Uuid::nil());

    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}

/// Loads the caller's profile. Nil caller means no usable credential (401);
/// a valid credential without a profile row is 404.
pub async fn ensure_profile(state: &GlobalState, user_id: Uuid) -> Result<Profile, AppError> {
    if user_id.is_nil() {
        return Err(AppError::new(
            StatusCode::UNAUTHORIZED,
            anyhow!("authentication required"),
        ));
    }

    let pool: &sqlx::PgPool = state.db.get_client();
    Profile::find_by_id(user_id, pool)
        .await?
        .ok_or_else(|| AppError::new(StatusCode::NOT_FOUND, anyhow!("profile not found")))
}

pub fn ensure_seller(profile: &Profile) -> Result<(), AppError> {
    if !profile.role.is_seller() {
        return Err(AppError::new(
            StatusCode::FORBIDDEN,
            anyhow!("seller account required"),
        ));
    }
    Ok(())
}
