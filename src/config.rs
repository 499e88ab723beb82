use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::StaticContext;
use crate::completion::GroqClient;
use crate::constants;
use crate::error::{Result, ShopBotError};
use crate::greeting::GreetingMatch;
use crate::orchestrator::{LoggingPolicy, TurnOrchestrator};
use crate::turn_logger::{CometLogger, JsonlTurnLogger, TurnLogger};

/// Settings shared by every subcommand. Flags fall back to the environment.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true, help = "API key for the chat-completion service.")]
    pub groq_api_key: Option<String>,

    #[arg(long, env = "COMET_API_KEY", hide_env_values = true, help = "API key for the prompt-logging service.")]
    pub comet_api_key: Option<String>,

    #[arg(long, default_value_t = constants::SHOPBOT_CHAT_MODEL.clone(), help = "Chat model identifier.")]
    pub model: String,

    #[arg(long, default_value_t = constants::GROQ_API_URL.clone(), help = "Base URL of the chat-completion API.")]
    pub groq_url: String,

    #[arg(long, default_value_t = constants::COMET_LOG_URL.clone(), help = "Prompt-logging endpoint.")]
    pub comet_url: String,

    #[arg(long, default_value_t = constants::COMET_PROJECT.clone(), help = "Project name for logged prompts.")]
    pub project: String,

    #[arg(long, value_name = "PATH", help = "Write turn logs to a local JSONL file instead of the logging service.")]
    pub turn_log: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = GreetingMatch::Word, help = "How greetings are detected.")]
    pub greeting_match: GreetingMatch,

    #[arg(long, value_enum, default_value_t = LoggingPolicy::BestEffort, help = "Whether a turn-logging failure fails the turn.")]
    pub logging_policy: LoggingPolicy,

    #[arg(long, value_name = "SECS", help = "Timeout for chat-completion requests.")]
    pub request_timeout: Option<u64>,
}

fn require(value: &Option<String>, name: &'static str) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ShopBotError::CredentialMissing(name)),
    }
}

impl Settings {
    /// Wires the orchestrator from these settings. Fails if a required key is
    /// missing; the logging key is not needed when `turn_log` is set.
    pub fn build_orchestrator(&self) -> Result<TurnOrchestrator> {
        let groq_key = require(&self.groq_api_key, constants::GROQ_API_KEY_VAR)?;

        let logger: Arc<dyn TurnLogger> = match &self.turn_log {
            Some(path) => Arc::new(JsonlTurnLogger::new(path)),
            None => {
                let comet_key = require(&self.comet_api_key, constants::COMET_API_KEY_VAR)?;
                Arc::new(CometLogger::new(&self.comet_url, &comet_key, &self.project))
            }
        };

        let completion = GroqClient::new(
            &self.groq_url,
            &groq_key,
            &self.model,
            self.request_timeout.map(Duration::from_secs),
        )?;

        let context = StaticContext::trendy_fashion()?;

        Ok(TurnOrchestrator::new(Arc::new(context), Arc::new(completion), logger)
            .with_greeting_match(self.greeting_match)
            .with_logging_policy(self.logging_policy))
    }
}
