use async_openai::config::OpenAIConfig;
use async_openai::Client;

use promptmarket_common::define_module_client;

define_module_client! {
    (struct LlmClient, "llm")
    client_type: Client<OpenAIConfig>,
    env: ["OPENAI_BASE_URL", "OPENAI_API_KEY"],
    setup: async {
        let config = OpenAIConfig::new()
            .with_api_base(std::env::var("OPENAI_BASE_URL").unwrap_or_default())
            .with_api_key(std::env::var("OPENAI_API_KEY").unwrap_or_default());
        Client::with_config(config)
    }
}
