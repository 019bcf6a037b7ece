/// Initializes the application's database connection pool.
///
/// Single point of entry for pool setup: creates one shared `PgPool` and,
/// when asked, drops/creates the tables for the listed model types in
/// declaration order (references must come after their referents).
///
/// # Generated function
/// - `async fn connect(drop_tables: bool, create_tables: bool) -> &'static PgPool`
#[macro_export]
macro_rules! init_databases {
    ( tables: [$($model_type:ty),* $(,)?] ) => {
        use $crate::SqlxSchema as _;

        static POOL: tokio::sync::OnceCell<sqlx::PgPool> = tokio::sync::OnceCell::const_new();

        async fn connect(drop_tables: bool, create_tables: bool) -> &'static sqlx::PgPool {
            POOL.get_or_init(|| async {
                let database_url = std::env::var("DATABASE_URL")
                    .expect("DATABASE_URL environment variable not set");

                let pool = sqlx::PgPool::connect(&database_url).await
                    .expect("Failed to connect to database");

                if drop_tables {
                    $(
                        let drop_sql = <$model_type as $crate::SqlxSchema>::drop_table_sql();
                        if !drop_sql.trim().is_empty() {
                            if let Err(e) = sqlx::query(&drop_sql).execute(&pool).await {
                                tracing::warn!(
                                    "Failed to drop table for '{}': {:?}",
                                    stringify!($model_type), e
                                );
                            }
                        }
                    )*
                }

                if create_tables {
                    $(
                        let create_sql = <$model_type as $crate::SqlxSchema>::create_table_sql();
                        if !create_sql.trim().is_empty() {
                            sqlx::query(&create_sql).execute(&pool).await
                                .unwrap_or_else(|e| panic!(
                                    "Failed to create table for '{}'. Error: {:?}",
                                    stringify!($model_type), e
                                ));
                        }
                    )*
                }

                pool
            }).await
        }
    };
}
