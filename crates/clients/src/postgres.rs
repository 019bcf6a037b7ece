use promptmarket_common::define_module_client;
use promptmarket_database::init_databases;
use promptmarket_market::{
    PayoutMethod, ProductType, Profile, Prompt, PromptDraft, PromptTemplate, Purchase,
};

// order matters: referenced tables first
init_databases! {
    tables: [
        Profile,
        ProductType,
        Prompt,
        PromptTemplate,
        PromptDraft,
        Purchase,
        PayoutMethod,
    ]
}

define_module_client! {
    (struct PostgresClient, "postgres")
    client_type: sqlx::PgPool,
    env: ["DATABASE_URL"],
    setup: async {
        let reset = std::env::var("DATABASE_RESET")
            .map(|v| v == "true")
            .unwrap_or(false);
        connect(reset, true).await.clone()
    }
}
