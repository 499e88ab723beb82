use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Assistant,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// One shopper's chat session: an append-only message log plus the
/// "already greeted" flag.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    log: Vec<Message>,
    has_greeted: bool,
}

impl Conversation {
    /// Starts a session whose log holds only the opening greeting.
    pub fn new(greeting: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            log: vec![Message::assistant(greeting)],
            has_greeted: false,
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.log.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.log.push(Message::assistant(content));
    }

    pub fn messages(&self) -> &[Message] {
        &self.log
    }

    pub fn last(&self) -> Option<&Message> {
        self.log.last()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn has_greeted(&self) -> bool {
        self.has_greeted
    }

    /// Latches the flag; there is no way to clear it.
    pub fn mark_greeted(&mut self) {
        self.has_greeted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_conversation_starts_with_greeting() {
        let conv = Conversation::new("반갑습니다");
        assert_eq!(conv.messages(), &[Message::assistant("반갑습니다")]);
        assert!(!conv.has_greeted());
    }

    #[test]
    fn test_push_preserves_order() {
        let mut conv = Conversation::new("hi");
        conv.push_user("티셔츠 있나요?");
        conv.push_assistant("네, 20 달러입니다.");
        conv.push_user("티셔츠 있나요?");

        let roles: Vec<Role> = conv.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant, Role::User]);
        assert_eq!(conv.messages()[1], conv.messages()[3]);
        assert_eq!(conv.len(), 4);
        assert_eq!(conv.last().unwrap().content, "티셔츠 있나요?");
    }

    #[test]
    fn test_mark_greeted_is_sticky() {
        let mut conv = Conversation::new("hi");
        conv.mark_greeted();
        conv.mark_greeted();
        assert!(conv.has_greeted());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_value(Message::user("hello")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hello"}));
    }

    #[test]
    fn test_sessions_have_distinct_ids() {
        assert_ne!(Conversation::new("a").id, Conversation::new("a").id);
    }
}
