use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;

use crate::prompt::Prompt;
use crate::purchase::Purchase;

/// A prompt is surfaced as "new" for this long after creation.
const NEW_PROMPT_WINDOW_SECS: i64 = 14 * 24 * 60 * 60;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SellerStatsReport {
    pub total_prompts: usize,
    pub public_prompts: usize,
    pub total_sales: usize,
    pub total_revenue_cents: i64,
    pub total_customers: usize,
    pub new_prompts_count: usize,
    pub old_prompts_count: usize,
    pub prompts: Vec<PromptSales>,
}

/// Per-prompt sales aggregate.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PromptSales {
    pub prompt_id: Uuid,
    pub title: String,
    pub price_cents: i64,
    pub is_public: bool,
    pub sales_count: usize,
    pub revenue_cents: i64,
    pub last_sold_at: Option<i64>,
    pub is_new: bool,
}

/// Folds a seller's prompts and the completed purchases against them into the
/// dashboard report. Revenue is counted at the prompt's list price.
pub fn aggregate_seller_stats(
    prompts: &[Prompt],
    purchases: &[Purchase],
    now: i64,
) -> SellerStatsReport {
    let price_by_prompt: HashMap<Uuid, i64> =
        prompts.iter().map(|p| (p.id, p.price_cents)).collect();

    let mut sales_by_prompt: HashMap<Uuid, (usize, Option<i64>)> = HashMap::new();
    let mut customers: HashSet<Uuid> = HashSet::new();
    let mut total_revenue_cents = 0i64;

    for purchase in purchases {
        customers.insert(purchase.user_id);
        let Some(prompt_id) = purchase.prompt_id else {
            continue;
        };
        let price = price_by_prompt.get(&prompt_id).copied().unwrap_or(0);
        total_revenue_cents += price;

        let entry = sales_by_prompt.entry(prompt_id).or_insert((0, None));
        entry.0 += 1;
        entry.1 = Some(entry.1.map_or(purchase.created_at, |t: i64| t.max(purchase.created_at)));
    }

    let prompt_sales: Vec<PromptSales> = prompts
        .iter()
        .map(|prompt| {
            let (sales_count, last_sold_at) = sales_by_prompt
                .get(&prompt.id)
                .copied()
                .unwrap_or((0, None));
            PromptSales {
                prompt_id: prompt.id,
                title: prompt.title.clone(),
                price_cents: prompt.price_cents,
                is_public: prompt.is_public,
                sales_count,
                revenue_cents: prompt.price_cents * sales_count as i64,
                last_sold_at,
                is_new: now - prompt.created_at < NEW_PROMPT_WINDOW_SECS,
            }
        })
        .collect();

    let new_prompts_count = prompt_sales.iter().filter(|p| p.is_new).count();

    SellerStatsReport {
        total_prompts: prompts.len(),
        public_prompts: prompts.iter().filter(|p| p.is_public).count(),
        total_sales: purchases.len(),
        total_revenue_cents,
        total_customers: customers.len(),
        new_prompts_count,
        old_prompts_count: prompts.len() - new_prompts_count,
        prompts: prompt_sales,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::purchase::PurchaseStatus;
    use sqlx::types::Json;

    fn prompt(price_cents: i64, is_public: bool, created_at: i64) -> Prompt {
        let mut p = Prompt::new(
            "t".into(),
            "d".into(),
            "c".into(),
            price_cents,
            "custom".into(),
            is_public,
            Uuid::new_v4(),
        );
        p.created_at = created_at;
        p
    }

    fn purchase(user_id: Uuid, prompt_id: Uuid, created_at: i64) -> Purchase {
        Purchase {
            id: Uuid::new_v4(),
            user_id,
            prompt_id: Some(prompt_id),
            product_type: format!("seller_{}", prompt_id),
            status: PurchaseStatus::Completed,
            amount_cents: 0,
            currency: "usd".into(),
            stripe_session_id: Uuid::new_v4().to_string(),
            metadata: Json(serde_json::json!({})),
            created_at,
        }
    }

    #[test]
    fn aggregates_revenue_and_customers() {
        let now = 1_000_000_000;
        let old = prompt(2999, true, now - NEW_PROMPT_WINDOW_SECS - 10);
        let fresh = prompt(1999, false, now - 100);

        let buyer_a = Uuid::new_v4();
        let buyer_b = Uuid::new_v4();
        let purchases = vec![
            purchase(buyer_a, old.id, now - 50),
            purchase(buyer_b, old.id, now - 20),
            purchase(buyer_a, fresh.id, now - 10),
        ];

        let report = aggregate_seller_stats(&[old.clone(), fresh.clone()], &purchases, now);

        assert_eq!(report.total_prompts, 2);
        assert_eq!(report.public_prompts, 1);
        assert_eq!(report.total_sales, 3);
        assert_eq!(report.total_revenue_cents, 2999 * 2 + 1999);
        assert_eq!(report.total_customers, 2);
        assert_eq!(report.new_prompts_count, 1);
        assert_eq!(report.old_prompts_count, 1);

        let old_sales = report
            .prompts
            .iter()
            .find(|p| p.prompt_id == old.id)
            .unwrap();
        assert_eq!(old_sales.sales_count, 2);
        assert_eq!(old_sales.revenue_cents, 2999 * 2);
        assert_eq!(old_sales.last_sold_at, Some(now - 20));
        assert!(!old_sales.is_new);
    }

    #[test]
    fn empty_inputs_produce_zeroes() {
        let report = aggregate_seller_stats(&[], &[], 0);
        assert_eq!(report.total_prompts, 0);
        assert_eq!(report.total_sales, 0);
        assert_eq!(report.total_revenue_cents, 0);
        assert!(report.prompts.is_empty());
    }
}
