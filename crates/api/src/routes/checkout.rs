use std::collections::HashMap;
use std::str::FromStr;

use anyhow::anyhow;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{middleware, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::types::Uuid;
use stripe::{
    CheckoutSession, CheckoutSessionId, CheckoutSessionMode, CheckoutSessionPaymentStatus,
    CreateCheckoutSession, CreateCheckoutSessionLineItems, CreateCheckoutSessionLineItemsPriceData,
    CreateCheckoutSessionLineItemsPriceDataProductData, CreateCheckoutSessionPaymentMethodTypes,
    Currency,
};

use promptmarket_common::{get_current_timestamp, EnvVars, ModuleClient};
use promptmarket_database::{QueryCriteria, SqlxFilterQuery};
use promptmarket_market::{
    builtin_product, resolve_access, NewPurchase, ProductRef, ProductType, Profile,
    PromptTemplate, Purchase,
};

use crate::env::ApiServerEnv;
use crate::middleware::{authenticate, ensure_profile};
use crate::response::{AppError, AppSuccess};
use crate::GlobalState;

pub fn checkout_routes() -> Router<GlobalState> {
    Router::new()
        .route(
            "/create-checkout-session",
            post(create_checkout_session).route_layer(middleware::from_fn(authenticate)),
        )
        .route(
            "/verify-payment",
            post(verify_payment).route_layer(middleware::from_fn(authenticate)),
        )
        .route(
            "/purchase-seller-prompt",
            post(purchase_seller_prompt).route_layer(middleware::from_fn(authenticate)),
        )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutRequest {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub amount_cents: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
}

/// What we are charging for, resolved from the template rows with the
/// built-in catalog and the client-supplied amount as fallbacks.
struct ResolvedProduct {
    name: String,
    description: String,
    price_cents: i64,
    prompt_id: Option<Uuid>,
}

async fn resolve_product(
    pool: &sqlx::PgPool,
    product: &ProductRef,
    fallback_amount_cents: Option<i64>,
) -> Result<ResolvedProduct, AppError> {
    let template = PromptTemplate::find_one_by_criteria(
        QueryCriteria::new().add_valued_filter("type_name", "=", product.to_string()),
        pool,
    )
    .await?;

    match product {
        ProductRef::Seller { .. } => {
            let template = template.filter(|t| t.is_public).ok_or_else(|| {
                AppError::new(
                    StatusCode::NOT_FOUND,
                    anyhow!("[/create-checkout-session] prompt not available for purchase"),
                )
            })?;
            Ok(ResolvedProduct {
                name: template.title,
                description: "AI prompt template from the seller marketplace".to_string(),
                price_cents: template.price_cents,
                prompt_id: template.prompt_id,
            })
        }
        ProductRef::Traditional(name) => {
            if let Some(template) = template {
                return Ok(ResolvedProduct {
                    name: template.title,
                    description: "AI prompt template".to_string(),
                    price_cents: template.price_cents,
                    prompt_id: template.prompt_id,
                });
            }
            if let Some(builtin) = builtin_product(name) {
                return Ok(ResolvedProduct {
                    name: builtin.name.to_string(),
                    description: builtin.description.to_string(),
                    price_cents: builtin.price_cents,
                    prompt_id: None,
                });
            }
            let amount = fallback_amount_cents.ok_or_else(|| {
                AppError::new(
                    StatusCode::BAD_REQUEST,
                    anyhow!("[/create-checkout-session] unknown product and no amount given"),
                )
            })?;
            Ok(ResolvedProduct {
                name: name.clone(),
                description: "AI prompt template".to_string(),
                price_cents: amount,
                prompt_id: None,
            })
        }
    }
}

fn session_metadata(
    profile: &Profile,
    product: &ProductRef,
    resolved: &ResolvedProduct,
    email: Option<&str>,
) -> HashMap<String, String> {
    let mut metadata = HashMap::from([
        ("user_id".to_string(), profile.id.to_string()),
        ("username".to_string(), profile.username.clone()),
        ("display_name".to_string(), profile.display_name.clone()),
        ("product_type".to_string(), product.to_string()),
        (
            "is_seller_prompt".to_string(),
            product.is_seller().to_string(),
        ),
    ]);
    if let Some(prompt_id) = resolved.prompt_id {
        metadata.insert("prompt_id".to_string(), prompt_id.to_string());
    }
    if let Some(email) = email {
        metadata.insert("user_email".to_string(), email.to_string());
    }
    metadata
}

async fn create_checkout_session(
    State(state): State<GlobalState>,
    Extension(caller): Extension<Uuid>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<AppSuccess, AppError> {
    let profile = ensure_profile(&state, caller).await?;
    let product = ProductRef::parse(&payload.type_name)?;

    let pool: &sqlx::PgPool = state.db.get_client();

    let access = resolve_access(pool, profile.id, &product).await?;
    if access.owns {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            anyhow!("[/create-checkout-session] product already owned"),
        ));
    }

    let resolved = resolve_product(pool, &product, payload.amount_cents).await?;
    let metadata = session_metadata(&profile, &product, &resolved, payload.email.as_deref());

    let env = ApiServerEnv::load();
    let app_url = env.get_env_var("APP_URL");
    let success_url = format!("{}/success?session_id={{CHECKOUT_SESSION_ID}}", app_url);
    let cancel_url = format!("{}/cancel", app_url);
    let caller_id_str = profile.id.to_string();

    let params = CreateCheckoutSession {
        customer_email: payload.email.as_deref(),
        client_reference_id: Some(&caller_id_str),
        payment_method_types: Some(vec![CreateCheckoutSessionPaymentMethodTypes::Card]),
        line_items: Some(vec![CreateCheckoutSessionLineItems {
            price_data: Some(CreateCheckoutSessionLineItemsPriceData {
                currency: Currency::USD,
                product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                    name: resolved.name.clone(),
                    description: Some(resolved.description.clone()),
                    ..Default::default()
                }),
                unit_amount: Some(resolved.price_cents),
                ..Default::default()
            }),
            quantity: Some(1),
            ..Default::default()
        }]),
        mode: Some(CheckoutSessionMode::Payment),
        success_url: Some(&success_url),
        cancel_url: Some(&cancel_url),
        metadata: Some(metadata),
        ..Default::default()
    };

    let session = CheckoutSession::create(&state.stripe_client, params)
        .await
        .map_err(|e| {
            AppError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                anyhow!("Stripe error: {}", e),
            )
        })?;
    let url = session.url.ok_or_else(|| {
        AppError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            anyhow!("Stripe error: no session url"),
        )
    })?;

    Ok(AppSuccess::new(
        StatusCode::OK,
        "Checkout session created",
        json!({ "sessionId": session.id.to_string(), "url": url }),
    ))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Confirms a checkout session with Stripe and records the purchase exactly
/// once. Replays of the same session id return the original row.
async fn verify_payment(
    State(state): State<GlobalState>,
    Extension(caller): Extension<Uuid>,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<AppSuccess, AppError> {
    let profile = ensure_profile(&state, caller).await?;
    let pool: &sqlx::PgPool = state.db.get_client();

    if let Some(existing) = Purchase::find_by_session(pool, &payload.session_id).await? {
        return Ok(AppSuccess::new(
            StatusCode::OK,
            "Payment already recorded",
            json!({ "purchase": existing, "alreadyProcessed": true }),
        ));
    }

    let session_id = CheckoutSessionId::from_str(&payload.session_id)
        .map_err(|e| AppError::new(StatusCode::BAD_REQUEST, anyhow!("invalid session id: {}", e)))?;
    let session = CheckoutSession::retrieve(&state.stripe_client, &session_id, &[])
        .await
        .map_err(|e| {
            AppError::new(
                StatusCode::NOT_FOUND,
                anyhow!("[/verify-payment] session not found: {}", e),
            )
        })?;

    if session.payment_status != CheckoutSessionPaymentStatus::Paid {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            anyhow!("[/verify-payment] payment not completed"),
        ));
    }

    let metadata = session.metadata.clone().unwrap_or_default();
    let product_type = metadata.get("product_type").cloned().ok_or_else(|| {
        AppError::new(
            StatusCode::BAD_REQUEST,
            anyhow!("[/verify-payment] session has no product_type"),
        )
    })?;
    let product = ProductRef::parse(&product_type)?;
    let prompt_id = metadata
        .get("prompt_id")
        .and_then(|raw| raw.parse::<Uuid>().ok())
        .or_else(|| product.prompt_id());

    if let ProductRef::Traditional(name) = &product {
        ProductType::get_or_create(pool, name, None, None, "custom", None).await?;
    }

    let record = Purchase::record(
        pool,
        NewPurchase {
            user_id: profile.id,
            prompt_id,
            product_type,
            amount_cents: session.amount_total.unwrap_or_default(),
            currency: session
                .currency
                .map(|c| c.to_string())
                .unwrap_or_else(|| "usd".to_string()),
            stripe_session_id: payload.session_id,
            metadata: serde_json::to_value(&metadata)?,
        },
    )
    .await?;

    Ok(AppSuccess::new(
        StatusCode::OK,
        "Payment verified",
        json!({
            "purchase": record.purchase,
            "alreadyProcessed": record.already_processed,
        }),
    ))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PurchaseSellerPromptRequest {
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Manual (non-Stripe) purchase path for seller templates; the synthetic
/// session id keeps the idempotency machinery uniform.
async fn purchase_seller_prompt(
    State(state): State<GlobalState>,
    Extension(caller): Extension<Uuid>,
    Json(payload): Json<PurchaseSellerPromptRequest>,
) -> Result<AppSuccess, AppError> {
    let profile = ensure_profile(&state, caller).await?;
    let product = ProductRef::parse(&payload.type_name)?;
    if !product.is_seller() {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            anyhow!("[/purchase-seller-prompt] not a seller prompt"),
        ));
    }

    let pool: &sqlx::PgPool = state.db.get_client();

    let access = resolve_access(pool, profile.id, &product).await?;
    if access.owns {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            anyhow!("[/purchase-seller-prompt] prompt already owned"),
        ));
    }

    let template = PromptTemplate::find_one_by_criteria(
        QueryCriteria::new().add_valued_filter("type_name", "=", product.to_string()),
        pool,
    )
    .await?
    .ok_or_else(|| {
        AppError::new(
            StatusCode::NOT_FOUND,
            anyhow!("[/purchase-seller-prompt] prompt not found"),
        )
    })?;

    let record = Purchase::record(
        pool,
        NewPurchase {
            user_id: profile.id,
            prompt_id: template.prompt_id,
            product_type: product.to_string(),
            amount_cents: template.price_cents,
            currency: "usd".to_string(),
            stripe_session_id: format!(
                "manual_purchase_{}_{}",
                get_current_timestamp(),
                Uuid::new_v4()
            ),
            metadata: json!({ "manual": true, "title": template.title }),
        },
    )
    .await?;

    Ok(AppSuccess::new(
        StatusCode::OK,
        "Prompt purchased",
        json!({
            "purchase": record.purchase,
            "alreadyProcessed": record.already_processed,
        }),
    ))
}
