use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument};

use crate::conversation::Message;
use crate::error::{Result, ShopBotError};

/// Produces the assistant's next reply for a full message list.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String>;
}

// Structures matching the OpenAI-compatible /chat/completions endpoint
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Groq chat-completion client.
pub struct GroqClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GroqClient {
    pub fn new(base_url: &str, api_key: &str, model: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ShopBotError::Completion(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    #[instrument(skip(self, messages), fields(model = %self.model, message_count = messages.len()))]
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request_payload = ChatCompletionRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_payload)
            .send()
            .await
            .map_err(|e| ShopBotError::Completion(format!("Failed to send request to {}: {}", url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(%status, %error_body, "Chat completion request failed");
            return Err(ShopBotError::Completion(format!(
                "request failed with status {}: {}",
                status, error_body
            )));
        }

        let completion = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| ShopBotError::Completion(format!("Failed to parse completion response: {}", e)))?;

        let first = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ShopBotError::Completion("response contained no choices".to_string()))?;
        let reply = first
            .message
            .content
            .ok_or_else(|| ShopBotError::Completion("first choice has no message content".to_string()))?;

        debug!(reply_len = reply.len(), "Received completion");
        Ok(reply)
    }
}
