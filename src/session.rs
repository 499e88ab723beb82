//! Per-session conversation registry for the hosting layers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::conversation::Conversation;
use crate::error::{Result, ShopBotError};

pub type SessionHandle = Arc<Mutex<Conversation>>;

struct SessionEntry {
    handle: SessionHandle,
    last_active: Instant,
}

/// Each session owns its own conversation; holding the session mutex for a
/// whole turn keeps turns within a session strictly sequential.
///
/// With a TTL set, a session idle for longer than the TTL is dropped together
/// with its log. Expired ids look exactly like unknown ones.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
    ttl: Option<Duration>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::default(),
            ttl: Some(ttl),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn is_expired(&self, entry: &SessionEntry, now: Instant) -> bool {
        self.ttl
            .is_some_and(|ttl| now.saturating_duration_since(entry.last_active) > ttl)
    }

    pub async fn insert(&self, conversation: Conversation) -> (Uuid, SessionHandle) {
        let id = conversation.id;
        let handle = Arc::new(Mutex::new(conversation));
        let now = Instant::now();

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, entry| !self.is_expired(entry, now));
        sessions.insert(
            id,
            SessionEntry {
                handle: handle.clone(),
                last_active: now,
            },
        );
        (id, handle)
    }

    /// Looks up a session and marks it active.
    pub async fn get(&self, id: Uuid) -> Result<SessionHandle> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        match sessions.get_mut(&id) {
            Some(entry) if !self.is_expired(entry, now) => {
                entry.last_active = now;
                Ok(entry.handle.clone())
            }
            Some(_) => {
                sessions.remove(&id);
                debug!(session = %id, "Session expired");
                Err(ShopBotError::SessionNotFound(id))
            }
            None => Err(ShopBotError::SessionNotFound(id)),
        }
    }

    pub async fn remove(&self, id: Uuid) -> Option<SessionHandle> {
        self.sessions.write().await.remove(&id).map(|entry| entry.handle)
    }

    /// Drops every idle session and returns how many were removed.
    pub async fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_expired(entry, now));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Periodically evicts idle sessions so abandoned page loads do not pile up.
pub fn spawn_sweeper(store: Arc<SessionStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let evicted = store.evict_expired().await;
            if evicted > 0 {
                let remaining = store.len().await;
                info!(evicted, remaining, "Evicted idle sessions");
            }
        }
    })
}
