use promptmarket_common::EnvVars;

pub struct ApiServerEnv {
    pub secret_salt: String,
    pub stripe_secret_key: String,
    pub app_url: String,
}

impl EnvVars for ApiServerEnv {
    fn load() -> Self {
        Self {
            secret_salt: std::env::var("SECRET_SALT").expect("SECRET_SALT is not set"),
            stripe_secret_key: std::env::var("STRIPE_SECRET_KEY")
                .expect("STRIPE_SECRET_KEY is not set"),
            app_url: std::env::var("APP_URL").unwrap_or("http://localhost:3000".to_string()),
        }
    }

    fn get_env_var(&self, key: &str) -> String {
        match key {
            "SECRET_SALT" => self.secret_salt.clone(),
            "STRIPE_SECRET_KEY" => self.stripe_secret_key.clone(),
            "APP_URL" => self.app_url.clone(),
            _ => panic!("{} is not set", key),
        }
    }
}
