use async_trait::async_trait;
use crate::models::chat::{ ChatMessage, Conversation };
use super::{ HistoryError, HistoryLimits, HistoryStore };
use log::error;
use redis::{ Client, AsyncCommands };

/// `LRANGE` bounds selecting the newest `limit` entries, or `None` when
/// nothing should be read. Limits beyond `isize::MAX` read the whole list.
pub(crate) fn read_window(limit: usize) -> Option<(isize, isize)> {
    if limit == 0 {
        return None;
    }
    let start = isize::try_from(limit).map_or(0, |l| -l);
    Some((start, -1))
}

/// `LTRIM` bounds keeping the newest `max_turns` entries, or `None` when the
/// list is unbounded.
pub(crate) fn trim_window(max_turns: usize) -> Option<(isize, isize)> {
    match max_turns {
        0 => None,
        n => read_window(n),
    }
}

/// One Redis list per session, `RPUSH`ed in chronological order.
pub struct RedisHistoryStore {
    client: Client,
    key_prefix: String,
    limits: HistoryLimits,
}

impl RedisHistoryStore {
    pub fn new(host: &str, key_prefix: &str, limits: HistoryLimits) -> Result<Self, HistoryError> {
        Ok(Self {
            client: Client::open(host)?,
            key_prefix: key_prefix.to_string(),
            limits,
        })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    fn key(&self, conversation_id: &str) -> String {
        format!("{}{}", self.key_prefix, conversation_id)
    }
}

#[async_trait]
impl HistoryStore for RedisHistoryStore {
    async fn append_turns(
        &self,
        conversation_id: &str,
        turns: &[ChatMessage]
    ) -> Result<(), HistoryError> {
        if turns.is_empty() {
            return Ok(());
        }
        let key = self.key(conversation_id);
        let entries = turns
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;

        let mut pipe = redis::pipe();
        pipe.atomic().rpush(&key, entries).ignore();
        if let Some((start, stop)) = trim_window(self.limits.max_turns) {
            pipe.ltrim(&key, start, stop).ignore();
        }
        if !self.limits.ttl.is_zero() {
            pipe.expire(&key, self.limits.ttl.as_secs() as i64).ignore();
        }

        let mut conn = self.get_connection().await?;
        pipe.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    async fn get_conversation(
        &self,
        conversation_id: &str,
        limit: usize
    ) -> Result<Conversation, HistoryError> {
        let Some((start, stop)) = read_window(limit) else {
            return Ok(Conversation::empty(conversation_id));
        };
        let mut conn = self.get_connection().await?;
        let key = self.key(conversation_id);
        let json_entries: Vec<String> = conn.lrange(&key, start, stop).await?;
        let mut messages = Vec::with_capacity(json_entries.len());

        for json_entry in &json_entries {
            match serde_json::from_str::<ChatMessage>(json_entry) {
                Ok(msg) => messages.push(msg),
                Err(e) => {
                    error!("Error parsing history entry for {}: {}", conversation_id, e);
                }
            }
        }

        Ok(Conversation {
            id: conversation_id.to_string(),
            messages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_read_window_selects_newest_entries() {
        assert_eq!(read_window(0), None);
        assert_eq!(read_window(1), Some((-1, -1)));
        assert_eq!(read_window(20), Some((-20, -1)));
    }

    #[test]
    fn test_read_window_huge_limit_reads_whole_list() {
        assert_eq!(read_window(usize::MAX), Some((0, -1)));
        assert_eq!(read_window(isize::MAX as usize + 1), Some((0, -1)));
        assert_eq!(read_window(isize::MAX as usize), Some((-isize::MAX, -1)));
    }

    #[test]
    fn test_trim_window() {
        assert_eq!(trim_window(0), None);
        assert_eq!(trim_window(6), Some((-6, -1)));
    }

    #[test]
    fn test_keys_are_prefixed_per_session() {
        let limits = HistoryLimits { max_turns: 4, ttl: Duration::ZERO, max_sessions: 0 };
        let store = RedisHistoryStore::new("redis://127.0.0.1:6379", "recipe_history:", limits).unwrap();
        assert_eq!(store.key("abc"), "recipe_history:abc");
    }

    /// Needs a live server: `HISTORY_TEST_REDIS=redis://127.0.0.1:6379 cargo test -- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn test_round_trip_against_live_redis() {
        let Ok(host) = std::env::var("HISTORY_TEST_REDIS") else {
            return;
        };
        let limits = HistoryLimits { max_turns: 3, ttl: Duration::from_secs(60), max_sessions: 0 };
        let store = RedisHistoryStore::new(&host, "recipe_history_test:", limits).unwrap();
        let session = uuid::Uuid::new_v4().to_string();

        for i in 0..2 {
            store
                .append_turns(&session, &[ChatMessage::user(format!("u{i}")), ChatMessage::model(format!("m{i}"))])
                .await
                .unwrap();
        }

        let all = store.get_conversation(&session, usize::MAX).await.unwrap();
        let contents: Vec<_> = all.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m0", "u1", "m1"]);

        let newest = store.get_conversation(&session, 1).await.unwrap();
        assert_eq!(newest.messages[0].content, "m1");
    }
}
