use crate::error::{ConsolidatorError, Result};
use crate::llm::types::*;
use log::debug;
use reqwest::Client;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    /// Sends `prompt` as a single user turn and returns the reply text.
    pub async fn generate_text(&self, model: &str, prompt: &str) -> Result<String> {
        self.generate(model, prompt, None).await
    }

    /// Like [`generate_text`](Self::generate_text), but asks for a JSON reply.
    pub async fn generate_json(&self, model: &str, prompt: &str) -> Result<String> {
        let config = GenerationConfig {
            temperature: None,
            response_mime_type: Some("application/json".to_string()),
        };
        self.generate(model, prompt, Some(config)).await
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        generation_config: Option<GenerationConfig>,
    ) -> Result<String> {
        let payload = GenerateContentRequest {
            contents: vec![Content::user(prompt)],
            generation_config,
        };

        debug!("Calling {} with {} chars of prompt", model, prompt.chars().count());

        let res = self
            .client
            .post(self.endpoint(model))
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(ConsolidatorError::ExternalSource(format!(
                "Gemini API Error (status {}) from {}: {}",
                status, model, err_text
            )));
        }

        let body: GenerateContentResponse = res.json().await?;
        body.first_text().ok_or_else(|| {
            ConsolidatorError::ExternalSource(format!("{} returned no text candidates", model))
        })
    }
}
