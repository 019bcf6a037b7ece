use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgArguments;
use sqlx::types::Uuid;
use sqlx::{PgPool, Postgres};
use strum_macros::{Display, EnumString};

use promptmarket_common::get_current_timestamp;
use promptmarket_database::{
    OrderDirection, QueryCriteria, SqlxCrud, SqlxFilterQuery, SqlxSchema,
};

use crate::prompt::Prompt;
use crate::template::PromptTemplate;

/// Two-state lifecycle: `draft` is initial and the only mutable state;
/// `published` is terminal.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Display, EnumString, Default)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    #[default]
    Draft,
    Published,
}

/// Payload shared by draft create and update.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DraftInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub content: String,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub type_display_name: Option<String>,
    #[serde(default)]
    pub type_description: Option<String>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub is_public: bool,
}

fn default_category() -> String {
    "custom".to_string()
}

impl DraftInput {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty()
            || self.content.trim().is_empty()
            || self.type_name.trim().is_empty()
        {
            return Err(anyhow!("Missing required fields: title, content, type"));
        }
        Ok(())
    }
}

/// Ids of the rows produced by promoting a draft.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PublishOutcome {
    pub prompt_id: Uuid,
    pub template_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PromptDraft {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    pub price_cents: Option<i64>,
    pub type_name: String,
    pub type_display_name: Option<String>,
    pub type_description: Option<String>,
    pub category: String,
    pub is_public: bool,
    pub status: DraftStatus,
    pub version: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

impl PromptDraft {
    pub fn new(seller_id: Uuid, input: DraftInput) -> Result<Self> {
        input.validate()?;
        let now = get_current_timestamp();
        Ok(Self {
            id: Uuid::new_v4(),
            seller_id,
            title: input.title,
            description: input.description,
            content: input.content,
            price_cents: input.price_cents,
            type_name: input.type_name,
            type_display_name: input.type_display_name,
            type_description: input.type_description,
            category: input.category,
            is_public: input.is_public,
            status: DraftStatus::Draft,
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_editable(&self) -> bool {
        self.status == DraftStatus::Draft
    }

    /// The caller's drafts, newest first. Published rows are excluded from the
    /// default listing.
    pub async fn list_for_seller(
        pool: &PgPool,
        seller_id: Uuid,
        include_published: bool,
    ) -> Result<Vec<Self>> {
        let mut criteria = QueryCriteria::new()
            .add_valued_filter("seller_id", "=", seller_id)
            .order_by("updated_at", OrderDirection::Desc);
        if !include_published {
            criteria =
                criteria.add_valued_filter("status", "=", DraftStatus::Draft.to_string());
        }
        Ok(Self::find_by_criteria(criteria, pool).await?)
    }

    /// Seller-scoped update, eligible only while the row is still in `draft`
    /// status. The row filter on `(id, seller_id, status)` is the whole
    /// concurrency story: zero matched rows means not found, not owned or
    /// already published, and the caller cannot tell which.
    ///
    /// On success the version is incremented and `updated_at` refreshed.
    pub async fn update_fields(
        pool: &PgPool,
        draft_id: Uuid,
        seller_id: Uuid,
        input: DraftInput,
    ) -> Result<Option<Self>> {
        input.validate()?;

        let sql = format!(
            "UPDATE {} SET title = $1, description = $2, content = $3, price_cents = $4, \
             type_name = $5, type_display_name = $6, type_description = $7, category = $8, \
             is_public = $9, version = version + 1, updated_at = $10 \
             WHERE id = $11 AND seller_id = $12 AND status = $13 RETURNING {}",
            Self::TABLE_NAME,
            Self::columns_csv(),
        );

        let row: Option<PromptDraftRow> = sqlx::query_as(&sql)
            .bind(input.title)
            .bind(input.description)
            .bind(input.content)
            .bind(input.price_cents)
            .bind(input.type_name)
            .bind(input.type_display_name)
            .bind(input.type_description)
            .bind(input.category)
            .bind(input.is_public)
            .bind(get_current_timestamp())
            .bind(draft_id)
            .bind(seller_id)
            .bind(DraftStatus::Draft.to_string())
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Self::from_row))
    }

    /// Promotes a draft to a live Prompt + PromptTemplate pair and marks the
    /// draft published, atomically. Any failure rolls the whole transaction
    /// back and the draft stays in `draft` status for retry.
    ///
    /// Returns `None` when no draft-status row matched `(id, seller_id)` —
    /// including a second publish attempt racing the first.
    pub async fn publish(
        pool: &PgPool,
        draft_id: Uuid,
        seller_id: Uuid,
    ) -> Result<Option<PublishOutcome>> {
        let mut tx = pool.begin().await?;

        let draft = match Self::find_one_by_criteria(
            QueryCriteria::new()
                .add_valued_filter("id", "=", draft_id)
                .add_valued_filter("seller_id", "=", seller_id)
                .add_valued_filter("status", "=", DraftStatus::Draft.to_string()),
            &mut *tx,
        )
        .await?
        {
            Some(draft) => draft,
            None => return Ok(None),
        };

        let prompt = Prompt::new(
            draft.title.clone(),
            draft.description.clone().unwrap_or_default(),
            draft.content.clone(),
            draft.price_cents.unwrap_or(0),
            draft.type_name.clone(),
            draft.is_public,
            seller_id,
        )
        .create(&mut *tx)
        .await?;

        let template = PromptTemplate::for_prompt(&prompt, seller_id)
            .create(&mut *tx)
            .await?;

        let mut published = draft;
        published.status = DraftStatus::Published;
        published.updated_at = get_current_timestamp();
        published.update(&mut *tx).await?;

        tx.commit().await?;

        tracing::info!(
            "draft {} published as prompt {} / template {}",
            draft_id,
            prompt.id,
            template.id
        );
        Ok(Some(PublishOutcome {
            prompt_id: prompt.id,
            template_id: template.id,
        }))
    }

    /// Deletes the seller's draft row regardless of status. Promoted
    /// Prompt/Template rows are never retracted by this call.
    pub async fn delete_for_seller(pool: &PgPool, draft_id: Uuid, seller_id: Uuid) -> Result<u64> {
        Ok(Self::delete_by_criteria(
            QueryCriteria::new()
                .add_valued_filter("id", "=", draft_id)
                .add_valued_filter("seller_id", "=", seller_id),
            pool,
        )
        .await?)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PromptDraftRow {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    pub price_cents: Option<i64>,
    pub type_name: String,
    pub type_display_name: Option<String>,
    pub type_description: Option<String>,
    pub category: String,
    pub is_public: bool,
    pub status: String,
    pub version: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

impl SqlxSchema for PromptDraft {
    type Id = Uuid;
    type Row = PromptDraftRow;

    const TABLE_NAME: &'static str = "prompt_drafts";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "seller_id",
        "title",
        "description",
        "content",
        "price_cents",
        "type_name",
        "type_display_name",
        "type_description",
        "category",
        "is_public",
        "status",
        "version",
        "created_at",
        "updated_at",
    ];

    fn get_id_value(&self) -> Uuid {
        self.id
    }

    fn from_row(row: PromptDraftRow) -> Self {
        Self {
            id: row.id,
            seller_id: row.seller_id,
            title: row.title,
            description: row.description,
            content: row.content,
            price_cents: row.price_cents,
            type_name: row.type_name,
            type_display_name: row.type_display_name,
            type_description: row.type_description,
            category: row.category,
            is_public: row.is_public,
            status: row.status.parse().unwrap_or_default(),
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    fn create_table_sql() -> String {
        r#"
        CREATE TABLE IF NOT EXISTS prompt_drafts (
            id UUID PRIMARY KEY,
            seller_id UUID NOT NULL REFERENCES profiles(id),
            title TEXT NOT NULL,
            description TEXT,
            content TEXT NOT NULL,
            price_cents BIGINT,
            type_name TEXT NOT NULL,
            type_display_name TEXT,
            type_description TEXT,
            category TEXT NOT NULL DEFAULT 'custom',
            is_public BOOLEAN NOT NULL DEFAULT FALSE,
            status TEXT NOT NULL DEFAULT 'draft',
            version INTEGER NOT NULL DEFAULT 1,
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL
        );
        "#
        .to_string()
    }
}

impl SqlxCrud for PromptDraft {
    fn bind_insert<'q>(
        &self,
        query: sqlx::query::QueryAs<'q, Postgres, PromptDraftRow, PgArguments>,
    ) -> sqlx::query::QueryAs<'q, Postgres, PromptDraftRow, PgArguments> {
        query
            .bind(self.id)
            .bind(self.seller_id)
            .bind(self.title.clone())
            .bind(self.description.clone())
            .bind(self.content.clone())
            .bind(self.price_cents)
            .bind(self.type_name.clone())
            .bind(self.type_display_name.clone())
            .bind(self.type_description.clone())
            .bind(self.category.clone())
            .bind(self.is_public)
            .bind(self.status.to_string())
            .bind(self.version)
            .bind(self.created_at)
            .bind(self.updated_at)
    }

    fn bind_update<'q>(
        &self,
        query: sqlx::query::QueryAs<'q, Postgres, PromptDraftRow, PgArguments>,
    ) -> sqlx::query::QueryAs<'q, Postgres, PromptDraftRow, PgArguments> {
        query
            .bind(self.seller_id)
            .bind(self.title.clone())
            .bind(self.description.clone())
            .bind(self.content.clone())
            .bind(self.price_cents)
            .bind(self.type_name.clone())
            .bind(self.type_display_name.clone())
            .bind(self.type_description.clone())
            .bind(self.category.clone())
            .bind(self.is_public)
            .bind(self.status.to_string())
            .bind(self.version)
            .bind(self.created_at)
            .bind(self.updated_at)
            .bind(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str, content: &str, type_name: &str) -> DraftInput {
        DraftInput {
            title: title.into(),
            description: None,
            content: content.into(),
            price_cents: Some(1999),
            type_name: type_name.into(),
            type_display_name: None,
            type_description: None,
            category: "custom".into(),
            is_public: false,
        }
    }

    #[test]
    fn new_draft_starts_at_version_one() {
        let draft = PromptDraft::new(Uuid::new_v4(), input("X", "Y", "custom_1")).unwrap();
        assert_eq!(draft.status, DraftStatus::Draft);
        assert_eq!(draft.version, 1);
        assert!(draft.is_editable());
    }

    #[test]
    fn required_fields_enforced() {
        assert!(PromptDraft::new(Uuid::new_v4(), input("", "Y", "t")).is_err());
        assert!(PromptDraft::new(Uuid::new_v4(), input("X", "  ", "t")).is_err());
        assert!(PromptDraft::new(Uuid::new_v4(), input("X", "Y", "")).is_err());
    }

    #[test]
    fn published_draft_is_not_editable() {
        let mut draft = PromptDraft::new(Uuid::new_v4(), input("X", "Y", "t")).unwrap();
        draft.status = DraftStatus::Published;
        assert!(!draft.is_editable());
    }

    #[test]
    fn status_storage_form() {
        assert_eq!(DraftStatus::Draft.to_string(), "draft");
        assert_eq!(DraftStatus::Published.to_string(), "published");
        assert_eq!("published".parse::<DraftStatus>().unwrap(), DraftStatus::Published);
    }

    #[test]
    fn draft_input_default_category() {
        let parsed: DraftInput = serde_json::from_str(
            r#"{"title":"X","content":"Y","type":"custom_1"}"#,
        )
        .unwrap();
        assert_eq!(parsed.category, "custom");
        assert!(!parsed.is_public);
        assert!(parsed.validate().is_ok());
    }
}
