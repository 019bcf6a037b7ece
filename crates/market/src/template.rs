use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgArguments;
use sqlx::types::Uuid;
use sqlx::{PgPool, Postgres};

use promptmarket_common::get_current_timestamp;
use promptmarket_database::{SqlxCrud, SqlxSchema};

use crate::product::ProductRef;
use crate::prompt::Prompt;

/// The unit referenced by generation and purchase flows; `type_name` is the
/// universal product key.
///
/// Invariant: seller-originated templates carry the backing prompt
/// (`prompt_id` non-null, `type_name = "seller_<prompt_id>"`); admin
/// templates have a null `prompt_id` and a fixed canonical type.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct PromptTemplate {
    pub id: Uuid,
    /// Wire key is "type", matching the request payloads.
    #[serde(rename = "type")]
    pub type_name: String,
    pub title: String,
    pub template: String,
    pub price_cents: i64,
    pub is_public: bool,
    pub is_admin_only: bool,
    pub seller_id: Option<Uuid>,
    pub prompt_id: Option<Uuid>,
    pub created_at: i64,
}

/// Optional narrowing filters for the public catalog listing.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CatalogFilter {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub min_price: Option<i64>,
    #[serde(default)]
    pub max_price: Option<i64>,
    #[serde(default)]
    pub seller_id: Option<Uuid>,
}

impl PromptTemplate {
    /// Seller templates visible to `viewer`: public ones plus the viewer's
    /// own, newest first. Category is resolved through the backing prompt's
    /// registered product type.
    pub async fn list_available(
        pool: &PgPool,
        viewer_id: Option<Uuid>,
        filter: &CatalogFilter,
    ) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, Self>(
            "SELECT t.id, t.type_name, t.title, t.template, t.price_cents, t.is_public, \
             t.is_admin_only, t.seller_id, t.prompt_id, t.created_at \
             FROM prompt_templates t \
             JOIN prompts p ON p.id = t.prompt_id \
             LEFT JOIN product_types pt ON pt.name = p.type_name \
             WHERE t.is_admin_only = FALSE \
               AND (t.is_public = TRUE OR t.seller_id = $1) \
               AND ($2::text IS NULL OR pt.category = $2) \
               AND ($3::bigint IS NULL OR t.price_cents >= $3) \
               AND ($4::bigint IS NULL OR t.price_cents <= $4) \
               AND ($5::uuid IS NULL OR t.seller_id = $5) \
             ORDER BY t.created_at DESC",
        )
        .bind(viewer_id)
        .bind(filter.category.clone())
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.seller_id)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// Seller template backing a freshly created prompt row.
    pub fn for_prompt(prompt: &Prompt, seller_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            type_name: ProductRef::for_prompt(prompt.id).to_string(),
            title: prompt.title.clone(),
            template: prompt.content.clone(),
            price_cents: prompt.price_cents,
            is_public: prompt.is_public,
            is_admin_only: false,
            seller_id: Some(seller_id),
            prompt_id: Some(prompt.id),
            created_at: get_current_timestamp(),
        }
    }
}

impl SqlxSchema for PromptTemplate {
    type Id = Uuid;
    type Row = PromptTemplate;

    const TABLE_NAME: &'static str = "prompt_templates";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "type_name",
        "title",
        "template",
        "price_cents",
        "is_public",
        "is_admin_only",
        "seller_id",
        "prompt_id",
        "created_at",
    ];

    fn get_id_value(&self) -> Uuid {
        self.id
    }

    fn from_row(row: PromptTemplate) -> Self {
        row
    }

    fn create_table_sql() -> String {
        r#"
        CREATE TABLE IF NOT EXISTS prompt_templates (
            id UUID PRIMARY KEY,
            type_name TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            template TEXT NOT NULL,
            price_cents BIGINT NOT NULL DEFAULT 0,
            is_public BOOLEAN NOT NULL DEFAULT FALSE,
            is_admin_only BOOLEAN NOT NULL DEFAULT FALSE,
            seller_id UUID REFERENCES profiles(id),
            prompt_id UUID REFERENCES prompts(id),
            created_at BIGINT NOT NULL
        );
        "#
        .to_string()
    }
}

impl SqlxCrud for PromptTemplate {
    fn bind_insert<'q>(
        &self,
        query: sqlx::query::QueryAs<'q, Postgres, PromptTemplate, PgArguments>,
    ) -> sqlx::query::QueryAs<'q, Postgres, PromptTemplate, PgArguments> {
        query
            .bind(self.id)
            .bind(self.type_name.clone())
            .bind(self.title.clone())
            .bind(self.template.clone())
            .bind(self.price_cents)
            .bind(self.is_public)
            .bind(self.is_admin_only)
            .bind(self.seller_id)
            .bind(self.prompt_id)
            .bind(self.created_at)
    }

    fn bind_update<'q>(
        &self,
        query: sqlx::query::QueryAs<'q, Postgres, PromptTemplate, PgArguments>,
    ) -> sqlx::query::QueryAs<'q, Postgres, PromptTemplate, PgArguments> {
        query
            .bind(self.type_name.clone())
            .bind(self.title.clone())
            .bind(self.template.clone())
            .bind(self.price_cents)
            .bind(self.is_public)
            .bind(self.is_admin_only)
            .bind(self.seller_id)
            .bind(self.prompt_id)
            .bind(self.created_at)
            .bind(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seller_template_links_back_to_prompt() {
        let seller = Uuid::new_v4();
        let prompt = Prompt::new(
            "X".into(),
            "desc".into(),
            "Y".into(),
            1500,
            "custom_1".into(),
            true,
            seller,
        );
        let template = PromptTemplate::for_prompt(&prompt, seller);

        assert_eq!(template.type_name, format!("seller_{}", prompt.id));
        assert_eq!(template.prompt_id, Some(prompt.id));
        assert_eq!(template.seller_id, Some(seller));
        assert_eq!(template.price_cents, prompt.price_cents);
        assert_eq!(template.is_public, prompt.is_public);
        assert!(!template.is_admin_only);
    }

    #[test]
    fn type_serializes_under_wire_key() {
        let seller = Uuid::new_v4();
        let prompt = Prompt::new(
            "X".into(),
            "desc".into(),
            "Y".into(),
            1500,
            "custom_1".into(),
            true,
            seller,
        );
        let value =
            serde_json::to_value(PromptTemplate::for_prompt(&prompt, seller)).unwrap();

        assert_eq!(
            value.get("type").and_then(|v| v.as_str()),
            Some(format!("seller_{}", prompt.id).as_str())
        );
        assert!(value.get("type_name").is_none());
    }
}
