#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use shopbot::catalog::StaticContext;
use shopbot::completion::CompletionClient;
use shopbot::error::{Result, ShopBotError};
use shopbot::turn_logger::{TurnLogger, TurnRecord};
use shopbot::{Message, TurnOrchestrator};

/// Completion client that replays a fixed reply and records every request.
#[derive(Default)]
pub struct FakeCompletion {
    pub requests: Mutex<Vec<Vec<Message>>>,
    pub fail: bool,
}

impl FakeCompletion {
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Vec<Message> {
        self.requests.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl CompletionClient for FakeCompletion {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(messages.to_vec());
        if self.fail {
            return Err(ShopBotError::Completion("service unavailable".to_string()));
        }
        Ok(format!("model reply #{}", requests.len()))
    }
}

#[derive(Default)]
pub struct FakeLogger {
    pub records: Mutex<Vec<TurnRecord>>,
    pub fail: bool,
}

impl FakeLogger {
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn records(&self) -> Vec<TurnRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl TurnLogger for FakeLogger {
    async fn log_turn(&self, record: &TurnRecord) -> Result<()> {
        self.records.lock().unwrap().push(record.clone());
        if self.fail {
            return Err(ShopBotError::Logging("sink offline".to_string()));
        }
        Ok(())
    }
}

pub fn orchestrator(completion: Arc<FakeCompletion>, logger: Arc<FakeLogger>) -> TurnOrchestrator {
    let context = StaticContext::trendy_fashion().expect("persona renders");
    TurnOrchestrator::new(Arc::new(context), completion, logger)
}
