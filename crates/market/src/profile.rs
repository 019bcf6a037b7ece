use serde::{Deserialize, Serialize};
use sqlx::postgres::PgArguments;
use sqlx::types::Uuid;
use sqlx::Postgres;
use strum_macros::{Display, EnumString};

use promptmarket_common::get_current_timestamp;
use promptmarket_database::{SqlxCrud, SqlxSchema};

/// Closed role set. Assigned once at registration and never mutated afterwards;
/// there is deliberately no update path for this column.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Display, EnumString, Default)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Seller,
    Admin,
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Draft and prompt mutation is restricted to sellers proper; admins curate
    /// the catalog but do not sell.
    pub fn is_seller(&self) -> bool {
        matches!(self, UserRole::Seller)
    }

    pub fn can_manage_product_types(&self) -> bool {
        matches!(self, UserRole::Seller | UserRole::Admin)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub role: UserRole,
    pub created_at: i64,
}

impl Profile {
    pub fn new(id: Uuid, username: String, display_name: String, bio: Option<String>, role: UserRole) -> Self {
        Self {
            id,
            username,
            display_name,
            bio,
            role,
            created_at: get_current_timestamp(),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub role: String,
    pub created_at: i64,
}

impl SqlxSchema for Profile {
    type Id = Uuid;
    type Row = ProfileRow;

    const TABLE_NAME: &'static str = "profiles";
    const COLUMNS: &'static [&'static str] =
        &["id", "username", "display_name", "bio", "role", "created_at"];

    fn get_id_value(&self) -> Uuid {
        self.id
    }

    fn from_row(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            display_name: row.display_name,
            bio: row.bio,
            role: row.role.parse().unwrap_or_default(),
            created_at: row.created_at,
        }
    }

    fn create_table_sql() -> String {
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id UUID PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            bio TEXT,
            role TEXT NOT NULL DEFAULT 'user',
            created_at BIGINT NOT NULL
        );
        "#
        .to_string()
    }
}

impl SqlxCrud for Profile {
    fn bind_insert<'q>(
        &self,
        query: sqlx::query::QueryAs<'q, Postgres, ProfileRow, PgArguments>,
    ) -> sqlx::query::QueryAs<'q, Postgres, ProfileRow, PgArguments> {
        query
            .bind(self.id)
            .bind(self.username.clone())
            .bind(self.display_name.clone())
            .bind(self.bio.clone())
            .bind(self.role.to_string())
            .bind(self.created_at)
    }

    fn bind_update<'q>(
        &self,
        query: sqlx::query::QueryAs<'q, Postgres, ProfileRow, PgArguments>,
    ) -> sqlx::query::QueryAs<'q, Postgres, ProfileRow, PgArguments> {
        query
            .bind(self.username.clone())
            .bind(self.display_name.clone())
            .bind(self.bio.clone())
            .bind(self.role.to_string())
            .bind(self.created_at)
            .bind(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_round_trip_storage_form() {
        for role in [UserRole::User, UserRole::Seller, UserRole::Admin] {
            let stored = role.to_string();
            assert_eq!(stored, stored.to_lowercase());
            assert_eq!(stored.parse::<UserRole>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_falls_back_to_user() {
        assert!("superuser".parse::<UserRole>().is_err());
        let row = ProfileRow {
            id: Uuid::new_v4(),
            username: "u".into(),
            display_name: "U".into(),
            bio: None,
            role: "superuser".into(),
            created_at: 0,
        };
        assert_eq!(Profile::from_row(row).role, UserRole::User);
    }

    #[test]
    fn capability_matrix() {
        assert!(!UserRole::User.is_seller());
        assert!(!UserRole::User.can_manage_product_types());
        assert!(UserRole::Seller.is_seller());
        assert!(UserRole::Seller.can_manage_product_types());
        assert!(!UserRole::Admin.is_seller());
        assert!(UserRole::Admin.can_manage_product_types());
        assert!(UserRole::Admin.is_admin());
    }
}
