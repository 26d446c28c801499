pub mod provider;

use async_trait::async_trait;
use log::warn;
use std::sync::Arc;
use std::time::Duration;
use super::{ LlmConfig, LlmError };
use crate::models::chat::ChatMessage;
use self::provider::ProviderChatClient;

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends `history` followed by `prompt` as a new user turn.
    ///
    /// `Ok(None)` means the provider answered without any text.
    async fn chat(
        &self,
        history: &[ChatMessage],
        prompt: &str
    ) -> Result<Option<String>, LlmError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_retries: 2,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Runs one chat call per attempt, each bounded by `policy.timeout`.
/// Transient failures are retried with doubling backoff up to
/// `policy.max_retries` times; other failures return immediately.
pub async fn chat_with_retry(
    client: &dyn ChatClient,
    history: &[ChatMessage],
    prompt: &str,
    policy: &RetryPolicy
) -> Result<Option<String>, LlmError> {
    let mut attempt = 0;
    let mut delay = policy.backoff;
    loop {
        let result = match tokio::time::timeout(policy.timeout, client.chat(history, prompt)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(format!("no response within {:?}", policy.timeout))),
        };

        match result {
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                warn!(
                    "Model call failed ({}), retry {}/{} in {:?}",
                    e,
                    attempt,
                    policy.max_retries,
                    delay
                );
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
            }
            other => {
                return other;
            }
        }
    }
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, LlmError> {
    let client = ProviderChatClient::from_config(config)?;
    Ok(Arc::new(client))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{ AtomicUsize, Ordering };

    /// Replays scripted results and records what it was asked.
    pub(crate) struct ScriptedChatClient {
        results: Mutex<VecDeque<Result<Option<String>, LlmError>>>,
        pub calls: AtomicUsize,
        pub seen_history: Mutex<Vec<Vec<ChatMessage>>>,
        pub seen_prompts: Mutex<Vec<String>>,
        pub delay: Option<Duration>,
    }

    impl ScriptedChatClient {
        pub(crate) fn new(results: Vec<Result<Option<String>, LlmError>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                calls: AtomicUsize::new(0),
                seen_history: Mutex::new(Vec::new()),
                seen_prompts: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedChatClient {
        async fn chat(
            &self,
            history: &[ChatMessage],
            prompt: &str
        ) -> Result<Option<String>, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_history.lock().unwrap().push(history.to_vec());
            self.seen_prompts.lock().unwrap().push(prompt.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Some("default recipe".into())))
        }

        fn get_model(&self) -> String {
            "scripted".into()
        }

        fn get_base_url(&self) -> Option<String> {
            None
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(200),
            max_retries,
            backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let client = ScriptedChatClient::new(
            vec![Err(LlmError::Provider("503".into())), Ok(Some("soup".into()))]
        );
        let result = chat_with_retry(&client, &[], "p", &fast_policy(2)).await;
        assert_eq!(result, Ok(Some("soup".into())));
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let client = ScriptedChatClient::new(
            vec![
                Err(LlmError::Provider("a".into())),
                Err(LlmError::Provider("b".into())),
                Err(LlmError::Provider("c".into())),
                Ok(Some("too late".into()))
            ]
        );
        let result = chat_with_retry(&client, &[], "p", &fast_policy(2)).await;
        assert_eq!(result, Err(LlmError::Provider("c".into())));
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn test_auth_errors_are_not_retried() {
        let client = ScriptedChatClient::new(vec![Err(LlmError::Auth("bad key".into()))]);
        let result = chat_with_retry(&client, &[], "p", &fast_policy(5)).await;
        assert!(matches!(result, Err(LlmError::Auth(_))));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let mut client = ScriptedChatClient::new(vec![Ok(Some("late".into()))]);
        client.delay = Some(Duration::from_millis(500));
        let policy = RetryPolicy {
            timeout: Duration::from_millis(20),
            max_retries: 0,
            backoff: Duration::from_millis(1),
        };
        let result = chat_with_retry(&client, &[], "p", &policy).await;
        assert_eq!(result, Err(LlmError::Timeout("no response within 20ms".into())));
    }
}
