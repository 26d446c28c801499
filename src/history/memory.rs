use async_trait::async_trait;
use log::debug;
use std::collections::{ HashMap, VecDeque };
use std::time::Instant;
use tokio::sync::Mutex;

use super::{ HistoryError, HistoryLimits, HistoryStore };
use crate::models::chat::{ ChatMessage, Conversation };

struct Session {
    messages: VecDeque<ChatMessage>,
    last_seen: Instant,
}

/// Process-local history. Bounded per session by `max_turns`, across
/// sessions by `max_sessions`, and in time by an idle `ttl` (zero disables
/// expiry).
pub struct MemoryHistoryStore {
    sessions: Mutex<HashMap<String, Session>>,
    limits: HistoryLimits,
}

impl MemoryHistoryStore {
    pub fn new(limits: HistoryLimits) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            limits,
        }
    }

    fn evict_expired(&self, sessions: &mut HashMap<String, Session>, now: Instant) {
        if self.limits.ttl.is_zero() {
            return;
        }
        let ttl = self.limits.ttl;
        let before = sessions.len();
        sessions.retain(|_, s| now.duration_since(s.last_seen) < ttl);
        if sessions.len() < before {
            debug!("Evicted {} idle history sessions", before - sessions.len());
        }
    }

    fn evict_least_recent(sessions: &mut HashMap<String, Session>) {
        let oldest = sessions
            .iter()
            .min_by_key(|(_, s)| s.last_seen)
            .map(|(id, _)| id.clone());
        if let Some(id) = oldest {
            debug!("History session cap reached, dropping session {}", id);
            sessions.remove(&id);
        }
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append_turns(
        &self,
        conversation_id: &str,
        turns: &[ChatMessage]
    ) -> Result<(), HistoryError> {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        self.evict_expired(&mut sessions, now);

        if !sessions.contains_key(conversation_id) {
            while self.limits.max_sessions > 0 && sessions.len() >= self.limits.max_sessions {
                Self::evict_least_recent(&mut sessions);
            }
        }

        let session = sessions.entry(conversation_id.to_string()).or_insert_with(|| Session {
            messages: VecDeque::new(),
            last_seen: now,
        });
        session.messages.extend(turns.iter().cloned());
        while self.limits.max_turns > 0 && session.messages.len() > self.limits.max_turns {
            session.messages.pop_front();
        }
        session.last_seen = now;
        Ok(())
    }

    async fn get_conversation(
        &self,
        conversation_id: &str,
        limit: usize
    ) -> Result<Conversation, HistoryError> {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        self.evict_expired(&mut sessions, now);

        let Some(session) = sessions.get_mut(conversation_id) else {
            return Ok(Conversation::empty(conversation_id));
        };
        session.last_seen = now;
        let skip = session.messages.len().saturating_sub(limit);
        Ok(Conversation {
            id: conversation_id.to_string(),
            messages: session.messages.iter().skip(skip).cloned().collect(),
        })
    }
}
