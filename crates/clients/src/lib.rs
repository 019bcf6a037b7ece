mod llm;
mod postgres;

pub use llm::LlmClient;
pub use postgres::PostgresClient;
