use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::{chat_messages, send_for_text};
use crate::provider::{LlmError, LlmProvider, Message};

/// OpenAI chat completions (also any compatible gateway via `base_url`).
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let body = json!({
            "model": self.model,
            "messages": chat_messages(&messages),
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        debug!(model = %self.model, %url, "openai segmentation request");

        let request = self.client.post(&url).bearer_auth(&self.api_key).json(&body);
        send_for_text(request, "/choices/0/message/content").await
    }

    fn name(&self) -> &str {
        "openai"
    }
}
