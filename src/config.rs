use std::env;

/// Application configuration, loaded once at startup from the environment
/// (plus `.env` via dotenvy in `main`).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub secret_key: String,
    /// Token lifetime, e.g. "120" (minutes), "2h", "7d".
    pub jwt_expires_in: String,
    pub cors_allow_origin: String,
    /// When absent, AI enrichment runs in heuristic-only mode.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    /// Upper bound for a single provider call, in seconds.
    pub ai_request_timeout_secs: u64,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env_or("PORT", "8000")
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a number"))?;

        let ai_request_timeout_secs = env_or("AI_REQUEST_TIMEOUT_SECS", "30")
            .parse()
            .map_err(|_| anyhow::anyhow!("AI_REQUEST_TIMEOUT_SECS must be a number"))?;

        let gemini_api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        Ok(Config {
            host: env_or("HOST", "0.0.0.0"),
            port,
            database_url: env_or("DATABASE_URL", "sqlite://./app.db"),
            secret_key: env_or(
                "SECRET_KEY",
                "your-secret-key-here-change-in-production",
            ),
            jwt_expires_in: env_or("ACCESS_TOKEN_EXPIRES_IN", "120m"),
            cors_allow_origin: env_or("CORS_ALLOW_ORIGIN", "http://localhost:3000"),
            gemini_api_key,
            gemini_model: env_or("GEMINI_MODEL", "gemini-1.5-flash"),
            ai_request_timeout_secs,
        })
    }
}
