pub mod heuristic;
pub mod parser;
pub mod provider;

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use provider::{GeminiClient, ProviderClient};

/// Output of one enrichment run. Ephemeral: merged into a note, never
/// persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub summary: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
struct ProviderSettings {
    api_key: String,
    model: String,
    timeout: Duration,
}

/// Derives a summary and tags for a note, preferring the configured AI
/// provider and degrading to [`heuristic::fallback`] on any failure.
///
/// Provider availability is decided once at construction; the client itself
/// is built lazily on first use and reused for the lifetime of the service
/// (one instance shared by all request handlers).
pub struct EnrichmentService {
    settings: Option<ProviderSettings>,
    client: OnceCell<Arc<dyn ProviderClient>>,
}

impl EnrichmentService {
    pub fn from_config(config: &Config) -> Self {
        let settings = config.gemini_api_key.as_ref().map(|key| ProviderSettings {
            api_key: key.clone(),
            model: config.gemini_model.clone(),
            timeout: Duration::from_secs(config.ai_request_timeout_secs),
        });

        if settings.is_none() {
            tracing::info!("No AI provider configured, enrichment runs in heuristic mode");
        }

        EnrichmentService {
            settings,
            client: OnceCell::new(),
        }
    }

    /// Service instance with an injected provider client, for tests.
    #[cfg(test)]
    pub(crate) fn with_client(client: Arc<dyn ProviderClient>) -> Self {
        let cell = OnceCell::new();
        cell.set(client).ok();
        EnrichmentService {
            settings: Some(ProviderSettings {
                api_key: "test".to_string(),
                model: "test".to_string(),
                timeout: Duration::from_secs(1),
            }),
            client: cell,
        }
    }

    fn client(&self) -> Option<&Arc<dyn ProviderClient>> {
        let settings = self.settings.as_ref()?;

        Some(self.client.get_or_init(|| {
            Arc::new(GeminiClient::new(
                settings.api_key.clone(),
                settings.model.clone(),
                settings.timeout,
            ))
        }))
    }

    /// Generates a summary and tags for the given note content. Infallible:
    /// provider absence, transport errors, timeouts and empty responses all
    /// degrade to the deterministic heuristic. Exactly one provider attempt
    /// per call, no retries.
    pub async fn enrich(
        &self,
        title: &str,
        content: &str,
        manual_tags: Option<&[String]>,
    ) -> EnrichmentResult {
        let client = match self.client() {
            Some(client) => client,
            None => return heuristic::fallback(title, content, manual_tags),
        };

        let prompt = build_prompt(title, content);

        match client.generate(&prompt).await {
            Ok(text) if !text.trim().is_empty() => parser::parse(text.trim(), manual_tags),
            Ok(_) => {
                tracing::warn!("AI provider returned an empty response, using heuristic");
                heuristic::fallback(title, content, manual_tags)
            }
            Err(e) => {
                tracing::warn!("AI provider call failed: {}, using heuristic", e);
                heuristic::fallback(title, content, manual_tags)
            }
        }
    }
}

fn build_prompt(title: &str, content: &str) -> String {
    format!(
        "You are an assistant that summarizes notes and extracts concise tags.\n\
         Title: {}\n\n\
         Content:\n{}\n\n\
         Return JSON with `summary` (<=80 words) and `tags` (3-6 short tags).",
        title, content
    )
}
