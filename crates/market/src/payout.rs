use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgArguments;
use sqlx::types::Uuid;
use sqlx::{PgPool, Postgres};
use strum_macros::{Display, EnumString};

use promptmarket_common::get_current_timestamp;
use promptmarket_database::{SqlxCrud, SqlxSchema};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Display, EnumString, Default)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PayoutMethodKind {
    #[default]
    Paypal,
    Bank,
}

/// Wire payload for saving a payout method.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PayoutDetails {
    pub method: PayoutMethodKind,
    #[serde(default)]
    pub paypal_email: Option<String>,
    #[serde(default)]
    pub bank_account: Option<String>,
    #[serde(default)]
    pub bank_routing: Option<String>,
}

impl PayoutDetails {
    pub fn validate(&self) -> Result<()> {
        match self.method {
            PayoutMethodKind::Paypal if self.paypal_email.as_deref().unwrap_or("").is_empty() => {
                Err(anyhow!("Missing required fields: paypal_email"))
            }
            PayoutMethodKind::Bank
                if self.bank_account.as_deref().unwrap_or("").is_empty()
                    || self.bank_routing.as_deref().unwrap_or("").is_empty() =>
            {
                Err(anyhow!("Missing required fields: bank_account, bank_routing"))
            }
            _ => Ok(()),
        }
    }
}

/// One payout destination per user, upserted in place.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PayoutMethod {
    pub user_id: Uuid,
    pub method: PayoutMethodKind,
    pub paypal_email: Option<String>,
    pub bank_account: Option<String>,
    pub bank_routing: Option<String>,
    pub updated_at: i64,
}

impl PayoutMethod {
    pub fn from_details(user_id: Uuid, details: &PayoutDetails) -> Result<Self> {
        details.validate()?;
        // only the fields relevant to the chosen method are retained
        let (paypal_email, bank_account, bank_routing) = match details.method {
            PayoutMethodKind::Paypal => (details.paypal_email.clone(), None, None),
            PayoutMethodKind::Bank => (
                None,
                details.bank_account.clone(),
                details.bank_routing.clone(),
            ),
        };
        Ok(Self {
            user_id,
            method: details.method,
            paypal_email,
            bank_account,
            bank_routing,
            updated_at: get_current_timestamp(),
        })
    }

    /// Insert-or-replace keyed by the unique `user_id`.
    pub async fn upsert(self, pool: &PgPool) -> Result<Self> {
        let sql = format!(
            "INSERT INTO {} (user_id, method, paypal_email, bank_account, bank_routing, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (user_id) DO UPDATE SET method = $2, paypal_email = $3, \
             bank_account = $4, bank_routing = $5, updated_at = $6 RETURNING {}",
            Self::TABLE_NAME,
            Self::columns_csv(),
        );

        let row: PayoutMethodRow = sqlx::query_as(&sql)
            .bind(self.user_id)
            .bind(self.method.to_string())
            .bind(self.paypal_email)
            .bind(self.bank_account)
            .bind(self.bank_routing)
            .bind(self.updated_at)
            .fetch_one(pool)
            .await?;

        Ok(Self::from_row(row))
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PayoutMethodRow {
    pub user_id: Uuid,
    pub method: String,
    pub paypal_email: Option<String>,
    pub bank_account: Option<String>,
    pub bank_routing: Option<String>,
    pub updated_at: i64,
}

impl SqlxSchema for PayoutMethod {
    type Id = Uuid;
    type Row = PayoutMethodRow;

    const TABLE_NAME: &'static str = "payout_methods";
    const ID_COLUMN_NAME: &'static str = "user_id";
    const COLUMNS: &'static [&'static str] = &[
        "user_id",
        "method",
        "paypal_email",
        "bank_account",
        "bank_routing",
        "updated_at",
    ];

    fn get_id_value(&self) -> Uuid {
        self.user_id
    }

    fn from_row(row: PayoutMethodRow) -> Self {
        Self {
            user_id: row.user_id,
            method: row.method.parse().unwrap_or_default(),
            paypal_email: row.paypal_email,
            bank_account: row.bank_account,
            bank_routing: row.bank_routing,
            updated_at: row.updated_at,
        }
    }

    fn create_table_sql() -> String {
        r#"
        CREATE TABLE IF NOT EXISTS payout_methods (
            user_id UUID PRIMARY KEY REFERENCES profiles(id),
            method TEXT NOT NULL,
            paypal_email TEXT,
            bank_account TEXT,
            bank_routing TEXT,
            updated_at BIGINT NOT NULL
        );
        "#
        .to_string()
    }
}

impl SqlxCrud for PayoutMethod {
    fn bind_insert<'q>(
        &self,
        query: sqlx::query::QueryAs<'q, Postgres, PayoutMethodRow, PgArguments>,
    ) -> sqlx::query::QueryAs<'q, Postgres, PayoutMethodRow, PgArguments> {
        query
            .bind(self.user_id)
            .bind(self.method.to_string())
            .bind(self.paypal_email.clone())
            .bind(self.bank_account.clone())
            .bind(self.bank_routing.clone())
            .bind(self.updated_at)
    }

    fn bind_update<'q>(
        &self,
        query: sqlx::query::QueryAs<'q, Postgres, PayoutMethodRow, PgArguments>,
    ) -> sqlx::query::QueryAs<'q, Postgres, PayoutMethodRow, PgArguments> {
        query
            .bind(self.method.to_string())
            .bind(self.paypal_email.clone())
            .bind(self.bank_account.clone())
            .bind(self.bank_routing.clone())
            .bind(self.updated_at)
            .bind(self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paypal_requires_email() {
        let details = PayoutDetails {
            method: PayoutMethodKind::Paypal,
            paypal_email: None,
            bank_account: None,
            bank_routing: None,
        };
        assert!(details.validate().is_err());

        let details = PayoutDetails {
            paypal_email: Some("seller@example.com".into()),
            ..details
        };
        assert!(details.validate().is_ok());
    }

    #[test]
    fn bank_requires_account_and_routing() {
        let mut details = PayoutDetails {
            method: PayoutMethodKind::Bank,
            paypal_email: None,
            bank_account: Some("123".into()),
            bank_routing: None,
        };
        assert!(details.validate().is_err());
        details.bank_routing = Some("456".into());
        assert!(details.validate().is_ok());
    }

    #[test]
    fn irrelevant_fields_are_dropped() {
        let user = Uuid::new_v4();
        let details = PayoutDetails {
            method: PayoutMethodKind::Paypal,
            paypal_email: Some("seller@example.com".into()),
            bank_account: Some("stale".into()),
            bank_routing: Some("stale".into()),
        };
        let method = PayoutMethod::from_details(user, &details).unwrap();
        assert_eq!(method.paypal_email.as_deref(), Some("seller@example.com"));
        assert!(method.bank_account.is_none());
        assert!(method.bank_routing.is_none());
    }
}
