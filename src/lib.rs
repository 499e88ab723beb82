pub mod catalog;
pub mod chat;
pub mod completion;
pub mod config;
pub mod constants;
pub mod conversation;
pub mod error;
pub mod greeting;
pub mod orchestrator;
pub mod session;
pub mod turn_logger;
pub mod web_server;

pub use conversation::{Conversation, Message, Role};
pub use error::ShopBotError;
pub use orchestrator::{LoggingPolicy, TurnOrchestrator};
