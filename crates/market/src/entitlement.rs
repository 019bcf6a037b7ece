use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use sqlx::PgPool;

use promptmarket_database::{QueryCriteria, SqlxCrud, SqlxFilterQuery};

use crate::product::{ProductRef, SELLER_TYPE_PREFIX};
use crate::profile::{Profile, UserRole};
use crate::purchase::{Purchase, PurchaseStatus};
use crate::template::PromptTemplate;

/// Answer to "may this user generate from this product?". Pure read, no side
/// effects.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct AccessResolution {
    pub owns: bool,
    pub is_admin: bool,
    pub is_creator: bool,
}

impl AccessResolution {
    /// The entitlement rule, separated from I/O: admins own everything,
    /// creators own their own templates, everyone else owns what they bought.
    pub fn evaluate(role: UserRole, is_creator: bool, has_purchase: bool) -> Self {
        let is_admin = role.is_admin();
        Self {
            owns: is_admin || is_creator || has_purchase,
            is_admin,
            is_creator,
        }
    }
}

/// Resolves entitlement for `user_id` on `product`.
///
/// A missing profile row downgrades the caller to non-admin, non-creator;
/// purchase history alone then decides.
pub async fn resolve_access(
    pool: &PgPool,
    user_id: Uuid,
    product: &ProductRef,
) -> Result<AccessResolution> {
    let role = Profile::find_by_id(user_id, pool)
        .await?
        .map(|p| p.role)
        .unwrap_or_default();

    let is_creator = match product {
        ProductRef::Seller { .. } => PromptTemplate::find_one_by_criteria(
            QueryCriteria::new().add_valued_filter("type_name", "=", product.to_string()),
            pool,
        )
        .await?
        .map(|t| t.seller_id == Some(user_id))
        .unwrap_or(false),
        ProductRef::Traditional(_) => false,
    };

    let has_purchase = completed_purchase_exists(pool, user_id, product).await?;

    Ok(AccessResolution::evaluate(role, is_creator, has_purchase))
}

/// True when a completed purchase matches the product, either by its type
/// key or, for seller templates, through the backing prompt id.
async fn completed_purchase_exists(
    pool: &PgPool,
    user_id: Uuid,
    product: &ProductRef,
) -> Result<bool> {
    let by_type = Purchase::find_one_by_criteria(
        QueryCriteria::new()
            .add_valued_filter("user_id", "=", user_id)
            .add_valued_filter("product_type", "=", product.to_string())
            .add_valued_filter("status", "=", PurchaseStatus::Completed.to_string()),
        pool,
    )
    .await?;
    if by_type.is_some() {
        return Ok(true);
    }

    if let Some(prompt_id) = product.prompt_id() {
        let by_prompt = Purchase::find_one_by_criteria(
            QueryCriteria::new()
                .add_valued_filter("user_id", "=", user_id)
                .add_valued_filter("prompt_id", "=", prompt_id)
                .add_valued_filter("status", "=", PurchaseStatus::Completed.to_string()),
            pool,
        )
        .await?;
        return Ok(by_prompt.is_some());
    }

    Ok(false)
}

/// One entry per product the user is entitled to through purchase history,
/// enriched with template title and seller name where available.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct OwnedPrompt {
    pub product_type: String,
    pub prompt_id: Option<Uuid>,
    pub amount_cents: i64,
    pub purchased_at: i64,
    pub prompt_title: Option<String>,
    pub seller_name: Option<String>,
}

impl OwnedPrompt {
    pub fn is_seller_prompt(&self) -> bool {
        self.product_type.starts_with(SELLER_TYPE_PREFIX)
    }
}

/// Completed purchases for the user, joined against templates and seller
/// profiles.
pub async fn owned_product_types(pool: &PgPool, user_id: Uuid) -> Result<Vec<OwnedPrompt>> {
    let rows = sqlx::query_as::<_, OwnedPrompt>(
        "SELECT p.product_type, p.prompt_id, p.amount_cents, p.created_at AS purchased_at, \
         t.title AS prompt_title, pr.display_name AS seller_name \
         FROM purchases p \
         LEFT JOIN prompt_templates t ON t.type_name = p.product_type \
         LEFT JOIN profiles pr ON pr.id = t.seller_id \
         WHERE p.user_id = $1 AND p.status = $2 \
         ORDER BY p.created_at DESC",
    )
    .bind(user_id)
    .bind(PurchaseStatus::Completed.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_owns_everything() {
        for (is_creator, has_purchase) in
            [(false, false), (true, false), (false, true), (true, true)]
        {
            let access = AccessResolution::evaluate(UserRole::Admin, is_creator, has_purchase);
            assert!(access.owns);
            assert!(access.is_admin);
        }
    }

    #[test]
    fn creator_owns_own_template_without_purchases() {
        let access = AccessResolution::evaluate(UserRole::Seller, true, false);
        assert!(access.owns);
        assert!(access.is_creator);
        assert!(!access.is_admin);
    }

    #[test]
    fn stranger_without_purchase_owns_nothing() {
        for role in [UserRole::User, UserRole::Seller] {
            let access = AccessResolution::evaluate(role, false, false);
            assert!(!access.owns);
            assert!(!access.is_admin);
            assert!(!access.is_creator);
        }
    }

    #[test]
    fn purchase_grants_ownership() {
        let access = AccessResolution::evaluate(UserRole::User, false, true);
        assert!(access.owns);
        assert!(!access.is_admin);
        assert!(!access.is_creator);
    }

    #[test]
    fn seller_prompt_classification() {
        let owned = OwnedPrompt {
            product_type: format!("seller_{}", Uuid::new_v4()),
            prompt_id: Some(Uuid::new_v4()),
            amount_cents: 1999,
            purchased_at: 0,
            prompt_title: None,
            seller_name: None,
        };
        assert!(owned.is_seller_prompt());

        let traditional = OwnedPrompt {
            product_type: "seo_blog".into(),
            prompt_id: None,
            amount_cents: 2999,
            purchased_at: 0,
            prompt_title: None,
            seller_name: None,
        };
        assert!(!traditional.is_seller_prompt());
    }
}
