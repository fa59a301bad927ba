use super::{ChatCompletionRequest, LlmClient};
use crate::{Error, Result, config::LlmConfig};
use std::{sync::Arc, time::Duration};
use tracing::{error, info};

pub const UNAVAILABLE_PREFIX: &str = "AI analysis unavailable: ";

/// Turns a description into a prediction string by asking the chat backend.
///
/// Backend failures never escape: they come back as a displayable
/// `AI analysis unavailable: ...` prediction.
pub struct Predictor {
    client: Arc<dyn LlmClient>,
    model: String,
    timeout: Option<Duration>,
}

impl Predictor {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            timeout: None,
        }
    }

    pub fn from_config(client: Arc<dyn LlmClient>, config: &LlmConfig) -> Self {
        Self::new(client, config.model.clone()).with_timeout(config.timeout())
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn predict(&self, description: &str) -> String {
        info!(
            "Attempting to get prediction for description: {}...",
            preview(description, 100)
        );
        info!("Using model: {}", self.model);

        match self.complete(description).await {
            Ok(content) => {
                info!("AI Response: {}...", preview(&content, 200));
                content
            }
            Err(e) => {
                error!("Completion service error: {}", e);
                format!("{UNAVAILABLE_PREFIX}{e}")
            }
        }
    }

    async fn complete(&self, description: &str) -> Result<String> {
        let request = ChatCompletionRequest::single_user_message(&self.model, description);
        let call = self.client.create_chat_completion(request);

        let response = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| Error::timeout("chat completion", limit))??,
            None => call.await?,
        };

        response
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| Error::llm("completion returned no choices"))
    }
}

pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
