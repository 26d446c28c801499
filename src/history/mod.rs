mod memory;
mod redis;
use async_trait::async_trait;
use log::info;
use crate::cli::Args;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use crate::models::chat::{ ChatMessage, Conversation };

pub use self::memory::MemoryHistoryStore;
pub use self::redis::RedisHistoryStore;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("redis history error: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("history entry (de)serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported history store type: {0}")]
    UnsupportedType(String),
}

/// Per-session conversation storage.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Appends `turns` to the session as one unit.
    async fn append_turns(
        &self,
        conversation_id: &str,
        turns: &[ChatMessage]
    ) -> Result<(), HistoryError>;

    /// Returns the newest `limit` turns, oldest first.
    async fn get_conversation(
        &self,
        conversation_id: &str,
        limit: usize
    ) -> Result<Conversation, HistoryError>;
}

#[derive(Debug, Clone, Copy)]
pub struct HistoryLimits {
    pub max_turns: usize,
    pub ttl: Duration,
    pub max_sessions: usize,
}

impl HistoryLimits {
    pub fn from_args(args: &Args) -> Self {
        Self {
            max_turns: args.history_max_turns,
            ttl: Duration::from_secs(args.history_ttl_secs),
            max_sessions: args.history_max_sessions,
        }
    }
}

pub fn create_history_store(args: &Args) -> Result<Arc<dyn HistoryStore>, HistoryError> {
    let limits = HistoryLimits::from_args(args);
    match args.history_type.to_lowercase().as_str() {
        "memory" => Ok(Arc::new(MemoryHistoryStore::new(limits))),
        "redis" => {
            let store = RedisHistoryStore::new(
                &args.history_host,
                &args.history_redis_prefix,
                limits
            )?;
            Ok(Arc::new(store))
        }
        other => Err(HistoryError::UnsupportedType(other.to_string())),
    }
}

pub fn initialize_history_store(args: &Args) -> Result<Arc<dyn HistoryStore>, HistoryError> {
    if args.history_type.eq_ignore_ascii_case("redis") {
        info!("Chat history will be stored in: redis at {}", args.history_host);
    } else {
        info!("Chat history will be stored in: {}", args.history_type);
    }
    info!(
        "History limits: {} turns per session, ttl {}s, {} sessions",
        args.history_max_turns,
        args.history_ttl_secs,
        args.history_max_sessions
    );
    create_history_store(args)
}
