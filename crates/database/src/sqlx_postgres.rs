use sqlx::postgres::PgArguments;
use sqlx::{Error as SqlxError, Executor, FromRow, Postgres};

/// Trait to define the schema of a database object for PostgreSQL.
///
/// Implementations list the table layout as constants; every SQL statement the
/// CRUD layer needs is assembled from those constants by the default methods,
/// so a model only supplies its column list, its `create_table_sql` and the
/// row conversion.
pub trait SqlxSchema: Send + Sync + Unpin + Clone + std::fmt::Debug {
    /// The type of the primary key for this database object.
    type Id: Send + Sync + for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Clone;

    /// The intermediate type that implements FromRow, used for fetching from the database.
    type Row: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin;

    const TABLE_NAME: &'static str;
    const ID_COLUMN_NAME: &'static str = "id";
    /// All column names, primary key first. Must match the binding order of
    /// `SqlxCrud::bind_insert`.
    const COLUMNS: &'static [&'static str];

    /// Retrieves the value of the primary key for an instance of the object.
    fn get_id_value(&self) -> Self::Id;

    /// Converts the intermediate Row type to the Self type.
    fn from_row(row: Self::Row) -> Self;

    fn create_table_sql() -> String;

    fn drop_table_sql() -> String {
        format!("DROP TABLE IF EXISTS {} CASCADE;", Self::TABLE_NAME)
    }

    fn columns_csv() -> String {
        Self::COLUMNS.join(", ")
    }

    fn select_all_sql() -> String {
        format!("SELECT {} FROM {}", Self::columns_csv(), Self::TABLE_NAME)
    }

    fn select_by_id_sql() -> String {
        format!(
            "SELECT {} FROM {} WHERE {} = $1",
            Self::columns_csv(),
            Self::TABLE_NAME,
            Self::ID_COLUMN_NAME
        )
    }

    fn insert_sql() -> String {
        let placeholders = (1..=Self::COLUMNS.len())
            .map(|i| format!("${}", i))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            Self::TABLE_NAME,
            Self::columns_csv(),
            placeholders,
            Self::columns_csv()
        )
    }

    fn update_by_id_sql() -> String {
        let assignments = Self::COLUMNS
            .iter()
            .filter(|c| **c != Self::ID_COLUMN_NAME)
            .enumerate()
            .map(|(i, c)| format!("{} = ${}", c, i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
            Self::TABLE_NAME,
            assignments,
            Self::ID_COLUMN_NAME,
            Self::COLUMNS.len(),
            Self::columns_csv()
        )
    }

    fn delete_by_id_sql() -> String {
        format!(
            "DELETE FROM {} WHERE {} = $1",
            Self::TABLE_NAME,
            Self::ID_COLUMN_NAME
        )
    }
}

/// Trait for CRUD (Create, Read, Update, Delete) operations for PostgreSQL.
#[async_trait::async_trait]
pub trait SqlxCrud: SqlxSchema + Sized {
    /// Binds the struct fields to an insert query, in `COLUMNS` order.
    fn bind_insert<'q>(
        &self,
        query: sqlx::query::QueryAs<'q, Postgres, Self::Row, PgArguments>,
    ) -> sqlx::query::QueryAs<'q, Postgres, Self::Row, PgArguments>;

    /// Binds the struct fields to an update query: every non-id column in
    /// `COLUMNS` order, then the id for the WHERE clause.
    fn bind_update<'q>(
        &self,
        query: sqlx::query::QueryAs<'q, Postgres, Self::Row, PgArguments>,
    ) -> sqlx::query::QueryAs<'q, Postgres, Self::Row, PgArguments>;

    /// Creates a new record in the database.
    async fn create<'e, E>(self, executor: E) -> Result<Self, SqlxError>
    where
        E: Executor<'e, Database = Postgres> + Send,
    {
        let sql = Self::insert_sql();
        let query = self.bind_insert(sqlx::query_as(&sql));
        query.fetch_one(executor).await.map(Self::from_row)
    }

    /// Finds a record by its primary key.
    async fn find_by_id<'e, E>(id: Self::Id, executor: E) -> Result<Option<Self>, SqlxError>
    where
        E: Executor<'e, Database = Postgres> + Send,
    {
        let sql = Self::select_by_id_sql();
        sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await
            .map(|opt_row| opt_row.map(Self::from_row))
    }

    /// Updates an existing record in the database (identified by its primary key).
    async fn update<'e, E>(self, executor: E) -> Result<Self, SqlxError>
    where
        E: Executor<'e, Database = Postgres> + Send,
    {
        let sql = Self::update_by_id_sql();
        let query = self.bind_update(sqlx::query_as(&sql));
        query.fetch_one(executor).await.map(Self::from_row)
    }

    /// Deletes a record from the database by its primary key.
    async fn delete<'e, E>(self, executor: E) -> Result<u64, SqlxError>
    where
        E: Executor<'e, Database = Postgres> + Send,
    {
        let sql = Self::delete_by_id_sql();
        sqlx::query(&sql)
            .bind(self.get_id_value())
            .execute(executor)
            .await
            .map(|result| result.rows_affected())
    }
}

/// Specifies the direction for ordering query results.
#[derive(Debug, Clone, Copy)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// A trait to allow for boxing of different types that can be encoded as sqlx arguments.
/// This is a helper for the `QueryCriteria` struct to store argument values of different types.
pub trait AsSqlxArg: Send + Sync {
    fn add_to_args(&self, args: &mut PgArguments) -> Result<(), SqlxError>;
}

/// A blanket implementation of AsSqlxArg for any type that meets the bounds.
/// This allows us to store any value that can be encoded for Postgres.
impl<T> AsSqlxArg for T
where
    T: for<'a> sqlx::Encode<'a, Postgres> + sqlx::Type<Postgres> + Send + Sync + Clone + 'static,
{
    fn add_to_args(&self, args: &mut PgArguments) -> Result<(), SqlxError> {
        use sqlx::Arguments;
        args.add(self.clone()).map_err(SqlxError::Encode)
    }
}

/// Represents a single filter condition for a database query.
pub struct FilterCondition {
    pub column: &'static str,
    pub operator: &'static str,
    /// Holds the value for the condition's placeholder, if any.
    /// `None` covers valueless predicates such as `IS NULL`.
    pub value: Option<Box<dyn AsSqlxArg>>,
}

/// Represents the complete criteria for a filtered database query.
/// All conditions are ANDed together.
#[derive(Default)]
pub struct QueryCriteria {
    pub conditions: Vec<FilterCondition>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub order_by: Vec<(&'static str, OrderDirection)>,
}

impl QueryCriteria {
    /// Creates a new, empty `QueryCriteria` builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter condition that may or may not have a value.
    pub fn add_filter<V>(
        mut self,
        column: &'static str,
        operator: &'static str,
        value: Option<V>,
    ) -> Self
    where
        V: for<'a> sqlx::Encode<'a, Postgres> + sqlx::Type<Postgres> + Send + Sync + Clone + 'static,
    {
        self.conditions.push(FilterCondition {
            column,
            operator,
            value: value.map(|v| Box::new(v) as Box<dyn AsSqlxArg>),
        });
        self
    }

    /// A convenience method for `add_filter` that requires a value.
    pub fn add_valued_filter<V>(self, column: &'static str, operator: &'static str, value: V) -> Self
    where
        V: for<'a> sqlx::Encode<'a, Postgres> + sqlx::Type<Postgres> + Send + Sync + Clone + 'static,
    {
        self.add_filter(column, operator, Some(value))
    }

    /// Sets the LIMIT for the query.
    pub fn limit(mut self, limit_val: i64) -> Self {
        self.limit = Some(limit_val);
        self
    }

    /// Sets the OFFSET for the query.
    pub fn offset(mut self, offset_val: i64) -> Self {
        self.offset = Some(offset_val);
        self
    }

    /// Adds an ORDER BY clause.
    pub fn order_by(mut self, column: &'static str, direction: OrderDirection) -> Self {
        self.order_by.push((column, direction));
        self
    }

    /// Renders the WHERE/ORDER BY/LIMIT/OFFSET tail and collects the bound
    /// arguments. Placeholders are numbered from 1.
    fn build_tail(&self) -> Result<(String, PgArguments), SqlxError> {
        let mut sql = String::new();
        let mut args = PgArguments::default();
        let mut placeholder = 0usize;

        if !self.conditions.is_empty() {
            let mut parts = Vec::with_capacity(self.conditions.len());
            for condition in &self.conditions {
                match &condition.value {
                    Some(value) => {
                        placeholder += 1;
                        parts.push(format!(
                            "{} {} ${}",
                            condition.column, condition.operator, placeholder
                        ));
                        value.add_to_args(&mut args)?;
                    }
                    None => parts.push(format!("{} {}", condition.column, condition.operator)),
                }
            }
            sql.push_str(" WHERE ");
            sql.push_str(&parts.join(" AND "));
        }

        if !self.order_by.is_empty() {
            let ordering = self
                .order_by
                .iter()
                .map(|(column, direction)| format!("{} {}", column, direction.as_sql()))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(" ORDER BY ");
            sql.push_str(&ordering);
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        Ok((sql, args))
    }
}

/// Trait for finding records based on dynamic filter criteria.
#[async_trait::async_trait]
pub trait SqlxFilterQuery: SqlxSchema + Sized {
    /// Finds records based on the provided criteria.
    async fn find_by_criteria<'e, E>(
        criteria: QueryCriteria,
        executor: E,
    ) -> Result<Vec<Self>, SqlxError>
    where
        E: Executor<'e, Database = Postgres> + Send,
    {
        let (tail, args) = criteria.build_tail()?;
        let sql = format!("{}{}", Self::select_all_sql(), tail);
        let rows: Vec<Self::Row> = sqlx::query_as_with(&sql, args).fetch_all(executor).await?;
        Ok(rows.into_iter().map(Self::from_row).collect())
    }

    /// Finds a single optional record based on the provided criteria.
    /// If multiple records match, the first one returned by the database wins.
    async fn find_one_by_criteria<'e, E>(
        mut criteria: QueryCriteria,
        executor: E,
    ) -> Result<Option<Self>, SqlxError>
    where
        E: Executor<'e, Database = Postgres> + Send,
    {
        if criteria.limit.is_none() {
            criteria = criteria.limit(1);
        }
        let mut results = Self::find_by_criteria(criteria, executor).await?;
        Ok(results.pop())
    }

    /// Deletes records based on the provided criteria and reports how many
    /// rows were removed.
    async fn delete_by_criteria<'e, E>(
        criteria: QueryCriteria,
        executor: E,
    ) -> Result<u64, SqlxError>
    where
        E: Executor<'e, Database = Postgres> + Send,
    {
        let (tail, args) = criteria.build_tail()?;
        let sql = format!("DELETE FROM {}{}", Self::TABLE_NAME, tail);
        sqlx::query_with(&sql, args)
            .execute(executor)
            .await
            .map(|result| result.rows_affected())
    }
}

#[async_trait::async_trait]
impl<T> SqlxFilterQuery for T where T: SqlxSchema + Sized {}

/// True when the error is a Postgres unique-constraint violation (SQLSTATE 23505).
/// Callers that rely on a unique index as their concurrency guard use this to
/// treat a lost insert race as "row already exists".
pub fn is_unique_violation(err: &SqlxError) -> bool {
    match err {
        SqlxError::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct StubDbError(&'static str);

    impl fmt::Display for StubDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "SQLSTATE {}", self.0)
        }
    }

    impl StdError for StubDbError {}

    impl DatabaseError for StubDbError {
        fn message(&self) -> &str {
            "stub database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.0))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    #[test]
    fn unique_violation_sqlstate_is_classified() {
        let err = SqlxError::Database(Box::new(StubDbError("23505")));
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn other_errors_are_not_unique_violations() {
        // foreign key violation carries a different SQLSTATE
        let fk = SqlxError::Database(Box::new(StubDbError("23503")));
        assert!(!is_unique_violation(&fk));
        assert!(!is_unique_violation(&SqlxError::RowNotFound));
    }
}
