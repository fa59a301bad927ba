use async_trait::async_trait;
use prediction_relay::{
    Error, Result,
    llm::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Choice, LlmClient},
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type ErrorFactory = Box<dyn Fn() -> Error + Send + Sync>;

/// Stub completion backend keyed by the user message.
///
/// Unknown inputs are echoed back as `echo: <input>`.
pub struct StubLlmClient {
    replies: HashMap<String, String>,
    error: Option<ErrorFactory>,
    delay: Option<Duration>,
    pub requests: Arc<Mutex<Vec<ChatCompletionRequest>>>,
}

impl StubLlmClient {
    pub fn new() -> Self {
        Self {
            replies: HashMap::new(),
            error: None,
            delay: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_reply(mut self, input: &str, reply: &str) -> Self {
        self.replies.insert(input.to_string(), reply.to_string());
        self
    }

    pub fn with_error(mut self, error: impl Fn() -> Error + Send + Sync + 'static) -> Self {
        self.error = Some(Box::new(error));
        self
    }

    /// Sleeps before answering, so concurrent requests overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for StubLlmClient {
    async fn create_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(ref error) = self.error {
            return Err(error());
        }

        let input = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let reply = self
            .replies
            .get(&input)
            .cloned()
            .unwrap_or_else(|| format!("echo: {input}"));

        Ok(create_mock_chat_response(&request.model, &reply))
    }
}

impl Default for StubLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

pub fn create_mock_chat_response(model: &str, content: &str) -> ChatCompletionResponse {
    ChatCompletionResponse {
        id: "test-id".to_string(),
        model: model.to_string(),
        choices: vec![Choice {
            index: 0,
            message: ChatMessage {
                role: "assistant".to_string(),
                content: content.to_string(),
            },
            finish_reason: Some("Stop".to_string()),
        }],
        usage: None,
    }
}
