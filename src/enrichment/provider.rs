use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Seam between the enrichment service and the remote model. One call, one
/// prompt, one text response; timeouts and transport failures surface as
/// errors for the caller to degrade on.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> AppResult<String>;
}

/// Gemini `generateContent` client. Read-only after construction, safe to
/// share across concurrent requests.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        GeminiClient {
            http: reqwest::Client::new(),
            api_key,
            model,
            timeout,
        }
    }
}

#[async_trait]
impl ProviderClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> AppResult<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            GEMINI_API_BASE, self.model
        );

        let payload = json!({
            "contents": [{
                "parts": [{"text": prompt}]
            }]
        });

        let response = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Provider returned status {}",
                response.status()
            )));
        }

        let body = response.json::<Value>().await?;

        let text = body
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.get(0))
            .and_then(|p| p.get("text"))
            .and_then(|t| t.as_str())
            .ok_or_else(|| {
                AppError::ExternalServiceError("Provider response carried no text".to_string())
            })?;

        Ok(text.to_string())
    }
}
