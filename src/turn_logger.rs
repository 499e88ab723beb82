//! Mirrors each completed turn to a prompt-logging sink.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, instrument};

use crate::conversation::{Message, Role};
use crate::error::{Result, ShopBotError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnMetadata {
    pub role: Role,
    pub content: String,
    pub context: Vec<Message>,
    pub product_list: String,
}

/// One turn as reported to the logging service. Built per turn, then dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub prompt: String,
    pub output: String,
    pub metadata: TurnMetadata,
}

impl TurnRecord {
    /// `role`/`content` describe the last log entry; `context` is the whole log.
    pub fn new(prompt: &str, output: &str, log: &[Message], product_list: &str) -> Self {
        let (role, content) = log
            .last()
            .map(|m| (m.role, m.content.clone()))
            .unwrap_or_else(|| (Role::Assistant, output.to_string()));

        Self {
            prompt: prompt.to_string(),
            output: output.to_string(),
            metadata: TurnMetadata {
                role,
                content,
                context: log.to_vec(),
                product_list: product_list.to_string(),
            },
        }
    }
}

#[async_trait]
pub trait TurnLogger: Send + Sync {
    async fn log_turn(&self, record: &TurnRecord) -> Result<()>;
}

#[derive(Serialize)]
struct CometLogRequest<'a> {
    project: &'a str,
    #[serde(flatten)]
    record: &'a TurnRecord,
}

/// Posts turn records to the Comet prompt-logging endpoint.
pub struct CometLogger {
    client: Client,
    endpoint: String,
    api_key: String,
    project: String,
}

impl CometLogger {
    pub fn new(endpoint: &str, api_key: &str, project: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            project: project.to_string(),
        }
    }
}

#[async_trait]
impl TurnLogger for CometLogger {
    #[instrument(skip(self, record), fields(project = %self.project))]
    async fn log_turn(&self, record: &TurnRecord) -> Result<()> {
        let payload = CometLogRequest {
            project: &self.project,
            record,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", self.api_key.as_str())
            .json(&payload)
            .send()
            .await
            .map_err(|e| ShopBotError::Logging(format!("Failed to send log to {}: {}", self.endpoint, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(%status, %error_body, "Prompt log request failed");
            return Err(ShopBotError::Logging(format!("request failed with status {}", status)));
        }

        debug!("Turn logged");
        Ok(())
    }
}

/// Appends turn records as JSON lines to a local file.
pub struct JsonlTurnLogger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlTurnLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TurnLogger for JsonlTurnLogger {
    async fn log_turn(&self, record: &TurnRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_describes_last_message() {
        let log = vec![
            Message::assistant("welcome"),
            Message::user("hello"),
            Message::assistant("반갑습니다!"),
        ];
        let record = TurnRecord::new("hello", "반갑습니다!", &log, "catalog");

        assert_eq!(record.metadata.role, Role::Assistant);
        assert_eq!(record.metadata.content, "반갑습니다!");
        assert_eq!(record.metadata.context, log);
        assert_eq!(record.metadata.product_list, "catalog");
    }

    #[test]
    fn test_comet_payload_shape() {
        let record = TurnRecord::new("hi", "무엇을 도와드릴까요?", &[Message::assistant("무엇을 도와드릴까요?")], "p");
        let payload = serde_json::to_value(CometLogRequest { project: "E-commerce_Chatbot", record: &record }).unwrap();

        assert_eq!(payload["project"], "E-commerce_Chatbot");
        assert_eq!(payload["prompt"], "hi");
        assert_eq!(payload["output"], "무엇을 도와드릴까요?");
        assert_eq!(payload["metadata"]["role"], "assistant");
        assert_eq!(payload["metadata"]["context"][0]["content"], "무엇을 도와드릴까요?");
    }
}
