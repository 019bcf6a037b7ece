mod postgres_connect;
mod sqlx_postgres;

pub use sqlx_postgres::{
    is_unique_violation, AsSqlxArg, FilterCondition, OrderDirection, QueryCriteria, SqlxCrud,
    SqlxFilterQuery, SqlxSchema,
};
