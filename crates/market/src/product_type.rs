use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgArguments;
use sqlx::types::Uuid;
use sqlx::{PgPool, Postgres};

use promptmarket_database::{
    is_unique_violation, QueryCriteria, SqlxCrud, SqlxFilterQuery, SqlxSchema,
};

/// Registry of allowed product type names, lazily populated on first use.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct ProductType {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub category: String,
    pub creator_id: Option<Uuid>,
}

impl ProductType {
    /// Get-or-create semantics keyed by the unique `name`. A lost insert race
    /// falls back to re-reading the winner's row.
    pub async fn get_or_create(
        pool: &PgPool,
        name: &str,
        display_name: Option<&str>,
        description: Option<&str>,
        category: &str,
        creator_id: Option<Uuid>,
    ) -> Result<Self> {
        if let Some(existing) = Self::find_one_by_criteria(
            QueryCriteria::new().add_valued_filter("name", "=", name.to_string()),
            pool,
        )
        .await?
        {
            return Ok(existing);
        }

        let candidate = Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            display_name: display_name.unwrap_or(name).to_string(),
            description: description.map(str::to_string),
            category: category.to_string(),
            creator_id,
        };

        match candidate.create(pool).await {
            Ok(created) => Ok(created),
            Err(e) if is_unique_violation(&e) => Self::find_one_by_criteria(
                QueryCriteria::new().add_valued_filter("name", "=", name.to_string()),
                pool,
            )
            .await?
            .ok_or_else(|| e.into()),
            Err(e) => Err(e.into()),
        }
    }
}

impl SqlxSchema for ProductType {
    type Id = Uuid;
    type Row = ProductType;

    const TABLE_NAME: &'static str = "product_types";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "display_name",
        "description",
        "category",
        "creator_id",
    ];

    fn get_id_value(&self) -> Uuid {
        self.id
    }

    fn from_row(row: ProductType) -> Self {
        row
    }

    fn create_table_sql() -> String {
        r#"
        CREATE TABLE IF NOT EXISTS product_types (
            id UUID PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            description TEXT,
            category TEXT NOT NULL DEFAULT 'custom',
            creator_id UUID REFERENCES profiles(id)
        );
        "#
        .to_string()
    }
}

impl SqlxCrud for ProductType {
    fn bind_insert<'q>(
        &self,
        query: sqlx::query::QueryAs<'q, Postgres, ProductType, PgArguments>,
    ) -> sqlx::query::QueryAs<'q, Postgres, ProductType, PgArguments> {
        query
            .bind(self.id)
            .bind(self.name.clone())
            .bind(self.display_name.clone())
            .bind(self.description.clone())
            .bind(self.category.clone())
            .bind(self.creator_id)
    }

    fn bind_update<'q>(
        &self,
        query: sqlx::query::QueryAs<'q, Postgres, ProductType, PgArguments>,
    ) -> sqlx::query::QueryAs<'q, Postgres, ProductType, PgArguments> {
        query
            .bind(self.name.clone())
            .bind(self.display_name.clone())
            .bind(self.description.clone())
            .bind(self.category.clone())
            .bind(self.creator_id)
            .bind(self.id)
    }
}
