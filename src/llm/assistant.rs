use crate::error::Result;
use crate::llm::client::GeminiClient;
use crate::llm::prompts::analyst_prompt;
use crate::llm::types::{ChatRole, ChatTurn};
use crate::render::view_to_csv;
use crate::report::ReportView;

/// Answers questions about the report currently on screen.
pub struct FinancialAnalyst {
    client: GeminiClient,
    model: String,
    transcript: Vec<ChatTurn>,
}

impl FinancialAnalyst {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            transcript: Vec::new(),
        }
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    /// Ask a question about `view`.
    ///
    /// The view is sent as CSV at its current unit. On failure the question
    /// stays in the transcript without an answer.
    pub async fn ask(&mut self, question: &str, view: &ReportView) -> Result<String> {
        self.transcript.push(ChatTurn {
            role: ChatRole::User,
            content: question.to_string(),
        });

        let data = view_to_csv(view)?;
        let prompt = analyst_prompt(&data, view.unit_label(), question);
        let answer = self.client.generate_text(&self.model, &prompt).await?;

        self.transcript.push(ChatTurn {
            role: ChatRole::Assistant,
            content: answer.clone(),
        });
        Ok(answer)
    }
}
