// Defaults for runtime configuration, overridable from the environment.

use std::env;

lazy_static::lazy_static! {
    pub static ref GROQ_API_URL: String = env::var("GROQ_API_URL").unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string());
    pub static ref SHOPBOT_CHAT_MODEL: String = env::var("SHOPBOT_CHAT_MODEL").unwrap_or_else(|_| "gemma2-9b-it".to_string());
    pub static ref COMET_LOG_URL: String = env::var("COMET_LOG_URL").unwrap_or_else(|_| "https://www.comet.com/api/rest/v2/llm/log-prompt".to_string());
    pub static ref COMET_PROJECT: String = env::var("COMET_PROJECT").unwrap_or_else(|_| "E-commerce_Chatbot".to_string());
}

pub const GROQ_API_KEY_VAR: &str = "GROQ_API_KEY";
pub const COMET_API_KEY_VAR: &str = "COMET_API_KEY";

pub const DEFAULT_PORT: u16 = 9900;

// Idle sessions are dropped after this long; swept once a minute.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60;
pub const SESSION_SWEEP_INTERVAL_SECS: u64 = 60;
