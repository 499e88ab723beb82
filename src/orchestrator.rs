//! Turn handling: greeting short-circuit, completion call, log append and
//! turn logging, in that order.

use clap::ValueEnum;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::catalog::{StaticContext, HOW_CAN_I_HELP};
use crate::completion::CompletionClient;
use crate::conversation::{Conversation, Message};
use crate::error::Result;
use crate::greeting::GreetingMatch;
use crate::turn_logger::{TurnLogger, TurnRecord};

/// What to do when the turn logger fails after a reply was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LoggingPolicy {
    /// Warn and still return the reply.
    #[default]
    BestEffort,
    /// Fail the turn with the logging error.
    Strict,
}

pub struct TurnOrchestrator {
    context: Arc<StaticContext>,
    completion: Arc<dyn CompletionClient>,
    logger: Arc<dyn TurnLogger>,
    greeting_match: GreetingMatch,
    logging_policy: LoggingPolicy,
}

impl TurnOrchestrator {
    pub fn new(
        context: Arc<StaticContext>,
        completion: Arc<dyn CompletionClient>,
        logger: Arc<dyn TurnLogger>,
    ) -> Self {
        Self {
            context,
            completion,
            logger,
            greeting_match: GreetingMatch::default(),
            logging_policy: LoggingPolicy::default(),
        }
    }

    pub fn with_greeting_match(mut self, greeting_match: GreetingMatch) -> Self {
        self.greeting_match = greeting_match;
        self
    }

    pub fn with_logging_policy(mut self, logging_policy: LoggingPolicy) -> Self {
        self.logging_policy = logging_policy;
        self
    }

    pub fn context(&self) -> &StaticContext {
        &self.context
    }

    /// Starts a fresh session seeded with the shop greeting.
    pub fn new_conversation(&self) -> Conversation {
        Conversation::new(self.context.greeting())
    }

    /// Runs one turn against `conversation` and returns the reply to display.
    ///
    /// A completion failure leaves the user message in the log but appends no
    /// assistant message and skips the turn logger.
    #[instrument(skip(self, user_text, conversation), fields(session = %conversation.id))]
    pub async fn handle_turn(&self, user_text: &str, conversation: &mut Conversation) -> Result<String> {
        conversation.push_user(user_text);

        let reply = if self.greeting_match.is_greeting(user_text) {
            if conversation.has_greeted() {
                debug!("Repeated greeting, short-circuiting");
                HOW_CAN_I_HELP.to_string()
            } else {
                let reply = self.complete(conversation).await?;
                conversation.mark_greeted();
                reply
            }
        } else {
            self.complete(conversation).await?
        };

        conversation.push_assistant(reply.clone());
        info!(log_len = conversation.len(), "Turn completed");

        let record = TurnRecord::new(user_text, &reply, conversation.messages(), self.context.catalog());
        if let Err(e) = self.logger.log_turn(&record).await {
            match self.logging_policy {
                LoggingPolicy::BestEffort => warn!(error = %e, "Turn logging failed; keeping reply"),
                LoggingPolicy::Strict => return Err(e),
            }
        }

        Ok(reply)
    }

    async fn complete(&self, conversation: &Conversation) -> Result<String> {
        let messages: Vec<Message> = self
            .context
            .prefix()
            .into_iter()
            .chain(conversation.messages().iter().cloned())
            .collect();
        self.completion.complete(&messages).await
    }
}
