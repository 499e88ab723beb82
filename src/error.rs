//! Error types shared by the orchestrator and its collaborators.

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ShopBotError {
    /// A required secret was not supplied by the hosting environment.
    #[error("Missing credential: {0} is not set")]
    CredentialMissing(&'static str),

    /// The chat-completion service failed; the turn is aborted.
    #[error("Completion service error: {0}")]
    Completion(String),

    /// The prompt-logging service failed.
    #[error("Logging service error: {0}")]
    Logging(String),

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Message text is empty")]
    EmptyInput,

    /// A client frame that is not a `{"text": ...}` object.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}

impl ShopBotError {
    /// Text safe to show to the shopper. Details stay in the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => "대화 세션을 찾을 수 없습니다. 페이지를 새로고침해 주세요.",
            Self::EmptyInput => "메시지를 입력해 주세요.",
            Self::MalformedRequest(_) => "요청 형식이 올바르지 않습니다.",
            _ => "죄송합니다. 일시적인 오류가 발생했습니다. 잠시 후 다시 시도해 주세요.",
        }
    }
}

pub type Result<T> = std::result::Result<T, ShopBotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_missing_names_variable() {
        let err = ShopBotError::CredentialMissing("GROQ_API_KEY");
        assert_eq!(err.to_string(), "Missing credential: GROQ_API_KEY is not set");
    }

    #[test]
    fn test_service_errors_share_generic_user_message() {
        let completion = ShopBotError::Completion("503".to_string());
        let logging = ShopBotError::Logging("timeout".to_string());
        assert_eq!(completion.user_message(), logging.user_message());
        assert!(!completion.user_message().contains("503"));
    }

    #[test]
    fn test_malformed_request_has_its_own_message() {
        let malformed = ShopBotError::MalformedRequest("missing field `text`".to_string());
        assert_ne!(malformed.user_message(), ShopBotError::EmptyInput.user_message());
        assert!(!malformed.user_message().contains("text"));
    }
}
