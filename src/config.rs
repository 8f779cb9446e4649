use anyhow::anyhow;
use shuttle_runtime::SecretStore;

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub completion_api_key: Option<String>,
    pub completion_api_base: Option<String>,
    pub completion_model: String,
}

impl AppConfig {
    pub fn new(secret_store: &SecretStore) -> Result<Self, anyhow::Error> {
        let database_url = secret_store
            .get("DATABASE_URL")
            .ok_or_else(|| anyhow!("DATABASE_URL not found"))?;

        let jwt_secret = secret_store
            .get("JWT_SECRET")
            .ok_or_else(|| anyhow!("JWT_SECRET not found"))?;

        // The completion key may legitimately be absent; the completion client
        // reports that per request instead of blocking boot.
        let completion_api_key = secret_store.get("COMPLETION_API_KEY");
        let completion_api_base = secret_store.get("COMPLETION_API_BASE");
        let completion_model = secret_store
            .get("COMPLETION_MODEL")
            .unwrap_or_else(|| "gpt-4o-mini".to_string());

        Ok(AppConfig {
            database_url,
            jwt_secret,
            completion_api_key,
            completion_api_base,
            completion_model,
        })
    }
}
