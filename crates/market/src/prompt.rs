use serde::{Deserialize, Serialize};
use sqlx::postgres::PgArguments;
use sqlx::types::Uuid;
use sqlx::Postgres;

use promptmarket_common::get_current_timestamp;
use promptmarket_database::{SqlxCrud, SqlxSchema};

/// The sellable intellectual content. Created when a seller publishes,
/// either directly or through draft promotion.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Prompt {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub content: String,
    pub price_cents: i64,
    pub type_name: String,
    pub is_public: bool,
    pub author_id: Uuid,
    pub created_at: i64,
}

impl Prompt {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: String,
        description: String,
        content: String,
        price_cents: i64,
        type_name: String,
        is_public: bool,
        author_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            content,
            price_cents,
            type_name,
            is_public,
            author_id,
            created_at: get_current_timestamp(),
        }
    }
}

impl SqlxSchema for Prompt {
    type Id = Uuid;
    type Row = Prompt;

    const TABLE_NAME: &'static str = "prompts";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "description",
        "content",
        "price_cents",
        "type_name",
        "is_public",
        "author_id",
        "created_at",
    ];

    fn get_id_value(&self) -> Uuid {
        self.id
    }

    fn from_row(row: Prompt) -> Self {
        row
    }

    fn create_table_sql() -> String {
        r#"
        CREATE TABLE IF NOT EXISTS prompts (
            id UUID PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            content TEXT NOT NULL,
            price_cents BIGINT NOT NULL DEFAULT 0,
            type_name TEXT NOT NULL,
            is_public BOOLEAN NOT NULL DEFAULT FALSE,
            author_id UUID NOT NULL REFERENCES profiles(id),
            created_at BIGINT NOT NULL
        );
        "#
        .to_string()
    }
}

impl SqlxCrud for Prompt {
    fn bind_insert<'q>(
        &self,
        query: sqlx::query::QueryAs<'q, Postgres, Prompt, PgArguments>,
    ) -> sqlx::query::QueryAs<'q, Postgres, Prompt, PgArguments> {
        query
            .bind(self.id)
            .bind(self.title.clone())
            .bind(self.description.clone())
            .bind(self.content.clone())
            .bind(self.price_cents)
            .bind(self.type_name.clone())
            .bind(self.is_public)
            .bind(self.author_id)
            .bind(self.created_at)
    }

    fn bind_update<'q>(
        &self,
        query: sqlx::query::QueryAs<'q, Postgres, Prompt, PgArguments>,
    ) -> sqlx::query::QueryAs<'q, Postgres, Prompt, PgArguments> {
        query
            .bind(self.title.clone())
            .bind(self.description.clone())
            .bind(self.content.clone())
            .bind(self.price_cents)
            .bind(self.type_name.clone())
            .bind(self.is_public)
            .bind(self.author_id)
            .bind(self.created_at)
            .bind(self.id)
    }
}
