use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgArguments;
use sqlx::types::{Json, Uuid};
use sqlx::{PgPool, Postgres};
use strum_macros::{Display, EnumString};

use promptmarket_common::get_current_timestamp;
use promptmarket_database::{
    is_unique_violation, QueryCriteria, SqlxCrud, SqlxFilterQuery, SqlxSchema,
};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Display, EnumString, Default)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    #[default]
    Pending,
    Completed,
    Refunded,
}

/// One row per successful payment session. The unique constraint on
/// `stripe_session_id` is the idempotency guard; rows are immutable after
/// creation in normal flow.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Purchase {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prompt_id: Option<Uuid>,
    pub product_type: String,
    pub status: PurchaseStatus,
    pub amount_cents: i64,
    pub currency: String,
    pub stripe_session_id: String,
    pub metadata: Json<serde_json::Value>,
    pub created_at: i64,
}

/// Input for recording a completed payment.
#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub user_id: Uuid,
    pub prompt_id: Option<Uuid>,
    pub product_type: String,
    pub amount_cents: i64,
    pub currency: String,
    pub stripe_session_id: String,
    pub metadata: serde_json::Value,
}

/// Outcome of the idempotent recorder: the row plus whether it already
/// existed before this call.
#[derive(Debug, Clone)]
pub struct PurchaseRecord {
    pub purchase: Purchase,
    pub already_processed: bool,
}

impl Purchase {
    pub async fn find_by_session(pool: &PgPool, session_id: &str) -> Result<Option<Self>> {
        Ok(Self::find_one_by_criteria(
            QueryCriteria::new().add_valued_filter(
                "stripe_session_id",
                "=",
                session_id.to_string(),
            ),
            pool,
        )
        .await?)
    }

    /// Completed purchases against any of the given prompts, newest first.
    /// Feeds the seller dashboard aggregation.
    pub async fn completed_for_prompts(pool: &PgPool, prompt_ids: &[Uuid]) -> Result<Vec<Self>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE prompt_id = ANY($1) AND status = $2 ORDER BY created_at DESC",
            Self::columns_csv(),
            Self::TABLE_NAME,
        );
        let rows: Vec<PurchaseRow> = sqlx::query_as(&sql)
            .bind(prompt_ids.to_vec())
            .bind(PurchaseStatus::Completed.to_string())
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(Self::from_row).collect())
    }

    /// Idempotent, at-most-once recording keyed by the payment session id.
    ///
    /// An existing row is returned unchanged. When two requests race past the
    /// existence check, the loser's insert hits the unique index and falls
    /// back to re-reading the winner's row instead of propagating the error.
    pub async fn record(pool: &PgPool, new: NewPurchase) -> Result<PurchaseRecord> {
        if let Some(existing) = Self::find_by_session(pool, &new.stripe_session_id).await? {
            return Ok(PurchaseRecord {
                purchase: existing,
                already_processed: true,
            });
        }

        let session_id = new.stripe_session_id.clone();
        let candidate = Self {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            prompt_id: new.prompt_id,
            product_type: new.product_type,
            status: PurchaseStatus::Completed,
            amount_cents: new.amount_cents,
            currency: new.currency,
            stripe_session_id: new.stripe_session_id,
            metadata: Json(new.metadata),
            created_at: get_current_timestamp(),
        };

        match candidate.create(pool).await {
            Ok(purchase) => Ok(PurchaseRecord {
                purchase,
                already_processed: false,
            }),
            Err(e) if is_unique_violation(&e) => {
                tracing::info!("duplicate purchase detected for session {}", session_id);
                let existing = Self::find_by_session(pool, &session_id)
                    .await?
                    .ok_or(e)?;
                Ok(PurchaseRecord {
                    purchase: existing,
                    already_processed: true,
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PurchaseRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prompt_id: Option<Uuid>,
    pub product_type: String,
    pub status: String,
    pub amount_cents: i64,
    pub currency: String,
    pub stripe_session_id: String,
    pub metadata: Json<serde_json::Value>,
    pub created_at: i64,
}

impl SqlxSchema for Purchase {
    type Id = Uuid;
    type Row = PurchaseRow;

    const TABLE_NAME: &'static str = "purchases";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "prompt_id",
        "product_type",
        "status",
        "amount_cents",
        "currency",
        "stripe_session_id",
        "metadata",
        "created_at",
    ];

    fn get_id_value(&self) -> Uuid {
        self.id
    }

    fn from_row(row: PurchaseRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            prompt_id: row.prompt_id,
            product_type: row.product_type,
            status: row.status.parse().unwrap_or_default(),
            amount_cents: row.amount_cents,
            currency: row.currency,
            stripe_session_id: row.stripe_session_id,
            metadata: row.metadata,
            created_at: row.created_at,
        }
    }

    fn create_table_sql() -> String {
        r#"
        CREATE TABLE IF NOT EXISTS purchases (
            id UUID PRIMARY KEY,
            user_id UUID NOT NULL REFERENCES profiles(id),
            prompt_id UUID REFERENCES prompts(id),
            product_type TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            amount_cents BIGINT NOT NULL,
            currency TEXT NOT NULL DEFAULT 'usd',
            stripe_session_id TEXT NOT NULL UNIQUE,
            metadata JSONB NOT NULL DEFAULT '{}',
            created_at BIGINT NOT NULL
        );
        "#
        .to_string()
    }
}

impl SqlxCrud for Purchase {
    fn bind_insert<'q>(
        &self,
        query: sqlx::query::QueryAs<'q, Postgres, PurchaseRow, PgArguments>,
    ) -> sqlx::query::QueryAs<'q, Postgres, PurchaseRow, PgArguments> {
        query
            .bind(self.id)
            .bind(self.user_id)
            .bind(self.prompt_id)
            .bind(self.product_type.clone())
            .bind(self.status.to_string())
            .bind(self.amount_cents)
            .bind(self.currency.clone())
            .bind(self.stripe_session_id.clone())
            .bind(self.metadata.clone())
            .bind(self.created_at)
    }

    fn bind_update<'q>(
        &self,
        query: sqlx::query::QueryAs<'q, Postgres, PurchaseRow, PgArguments>,
    ) -> sqlx::query::QueryAs<'q, Postgres, PurchaseRow, PgArguments> {
        query
            .bind(self.user_id)
            .bind(self.prompt_id)
            .bind(self.product_type.clone())
            .bind(self.status.to_string())
            .bind(self.amount_cents)
            .bind(self.currency.clone())
            .bind(self.stripe_session_id.clone())
            .bind(self.metadata.clone())
            .bind(self.created_at)
            .bind(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_storage_form() {
        assert_eq!(PurchaseStatus::Completed.to_string(), "completed");
        assert_eq!(
            "completed".parse::<PurchaseStatus>().unwrap(),
            PurchaseStatus::Completed
        );
        // unparsable status must not silently become completed
        assert_eq!(PurchaseStatus::default(), PurchaseStatus::Pending);
    }
}
