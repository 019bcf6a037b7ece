use stripe::Client as StripeClient;

use promptmarket_clients::{LlmClient, PostgresClient};
use promptmarket_common::{EnvVars, ModuleClient};

use crate::env::ApiServerEnv;

#[derive(Clone)]
pub struct GlobalState {
    pub db: PostgresClient,
    pub llm: LlmClient,
    pub stripe_client: StripeClient,
}

impl GlobalState {
    pub async fn new() -> Self {
        let env = ApiServerEnv::load();
        let db = PostgresClient::setup_connection().await;
        let llm = LlmClient::setup_connection().await;
        let stripe_client = StripeClient::new(env.get_env_var("STRIPE_SECRET_KEY"));

        Self {
            db,
            llm,
            stripe_client,
        }
    }
}
