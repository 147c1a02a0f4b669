use crate::config::ConsolidatorConfig;
use crate::error::Result;
use crate::llm::client::GeminiClient;
use crate::llm::prompts::consolidation_prompt;
use crate::session::RecordSource;
use futures::future::BoxFuture;
use log::{info, warn};

/// Record source backed by Gemini, with a single fallback model.
pub struct GeminiRecordSource {
    client: GeminiClient,
    primary_model: String,
    fallback_model: String,
}

impl GeminiRecordSource {
    pub fn new(
        client: GeminiClient,
        primary_model: impl Into<String>,
        fallback_model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            primary_model: primary_model.into(),
            fallback_model: fallback_model.into(),
        }
    }

    pub fn from_config(config: &ConsolidatorConfig) -> Result<Self> {
        let client = GeminiClient::new(config.require_api_key()?);
        Ok(Self::new(
            client,
            config.primary_model.clone(),
            config.fallback_model.clone(),
        ))
    }

    async fn consolidate(&self, context: &str) -> Result<String> {
        let prompt = consolidation_prompt(context)?;

        match self.client.generate_json(&self.primary_model, &prompt).await {
            Ok(text) => {
                info!("Consolidation answered by {}", self.primary_model);
                Ok(text)
            }
            Err(e) => {
                warn!(
                    "{} failed ({}), retrying with {}",
                    self.primary_model, e, self.fallback_model
                );
                self.client.generate_json(&self.fallback_model, &prompt).await
            }
        }
    }
}

impl RecordSource for GeminiRecordSource {
    fn fetch<'a>(&'a self, context: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.consolidate(context))
    }
}
