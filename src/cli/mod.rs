use clap::Parser;
use std::time::Duration;
use crate::llm::chat::RetryPolicy;
use crate::mail::SmtpConfig;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Host address and port for the HTTP server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:5000")]
    pub server_addr: String,

    /// Requests accepted per second across all clients.
    #[arg(long, env = "RATE_LIMIT_PER_SECOND", default_value = "10")]
    pub rate_limit_per_second: u32,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,

    /// Path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for recipe generation (gemini, openai, anthropic, ollama, deepseek, xai, groq)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "gemini")]
    pub chat_llm_type: String,

    /// Base URL for the Chat LLM provider API
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let the backend decide
    pub chat_base_url: Option<String>,

    /// API Key for the Chat LLM provider. Falls back to GEMINI_API_TOKEN.
    #[arg(long, env = "CHAT_API_KEY", default_value = "", hide_env_values = true)]
    pub chat_api_key: String,

    /// Model name for recipe generation (e.g., gemini-1.5-flash, gpt-4o-mini)
    #[arg(long, env = "CHAT_MODEL")]
    pub chat_model: Option<String>,

    /// Seconds to wait for a single model call.
    #[arg(long, env = "LLM_TIMEOUT_SECS", default_value = "60")]
    pub llm_timeout_secs: u64,

    /// Extra attempts after a timeout or provider error. Auth and quota errors are never retried.
    #[arg(long, env = "LLM_MAX_RETRIES", default_value = "2")]
    pub llm_max_retries: u32,

    /// Delay before the first retry, doubled on each further retry.
    #[arg(long, env = "LLM_RETRY_BACKOFF_MS", default_value = "500")]
    pub llm_retry_backoff_ms: u64,

    // --- History Store Args ---
    /// History chat store type (memory, redis)
    #[arg(long, env = "HISTORY_TYPE", default_value = "memory")]
    pub history_type: String,

    /// History chat store host endpoint (e.g., redis://127.0.0.1:6379)
    #[arg(long, env = "HISTORY_HOST", default_value = "redis://127.0.0.1:6379")]
    pub history_host: String,

    /// Prefix for Redis history keys.
    #[arg(long, env = "HISTORY_REDIS_PREFIX", default_value = "recipe_history:")]
    pub history_redis_prefix: String,

    /// Turns kept per session; older turns are dropped first. 0 means unbounded.
    #[arg(long, env = "HISTORY_MAX_TURNS", default_value = "20")]
    pub history_max_turns: usize,

    /// Idle seconds before a session is forgotten. 0 means no expiry.
    #[arg(long, env = "HISTORY_TTL_SECS", default_value = "3600")]
    pub history_ttl_secs: u64,

    /// Sessions kept by the in-memory store before the least recent is dropped.
    #[arg(long, env = "HISTORY_MAX_SESSIONS", default_value = "1000")]
    pub history_max_sessions: usize,

    // --- SMTP Args ---
    #[arg(long, env = "SMTP_HOST", default_value = "smtp.gmail.com")]
    pub smtp_host: String,

    #[arg(long, env = "SMTP_PORT", default_value = "587")]
    pub smtp_port: u16,

    #[arg(long, env = "SMTP_USERNAME", default_value = "")]
    pub smtp_username: String,

    #[arg(long, env = "SMTP_PASSWORD", default_value = "", hide_env_values = true)]
    pub smtp_password: String,

    /// Sender address. Defaults to SMTP_USERNAME.
    #[arg(long, env = "SMTP_FROM")]
    pub smtp_from: Option<String>,

    #[arg(long, env = "SMTP_TIMEOUT_SECS", default_value = "30")]
    pub smtp_timeout_secs: u64,
}

impl Args {
    pub fn resolved_chat_api_key(&self) -> Option<String> {
        if !self.chat_api_key.trim().is_empty() {
            return Some(self.chat_api_key.clone());
        }
        std::env::var("GEMINI_API_TOKEN").ok().filter(|k| !k.trim().is_empty())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_secs(self.llm_timeout_secs),
            max_retries: self.llm_max_retries,
            backoff: Duration::from_millis(self.llm_retry_backoff_ms),
        }
    }

    pub fn smtp_config(&self) -> SmtpConfig {
        SmtpConfig {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
            from: self.smtp_from.clone(),
            timeout: Duration::from_secs(self.smtp_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["recipe-agent"]).unwrap();
        assert_eq!(args.smtp_port, 587);
        assert_eq!(args.smtp_host, "smtp.gmail.com");
        assert_eq!(args.history_type, "memory");
        assert_eq!(args.chat_llm_type, "gemini");
        let policy = args.retry_policy();
        assert_eq!(policy.timeout, Duration::from_secs(60));
        assert_eq!(policy.max_retries, 2);
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::try_parse_from([
            "recipe-agent",
            "--history-type",
            "redis",
            "--llm-max-retries",
            "0",
            "--smtp-from",
            "kitchen@example.com",
        ]).unwrap();
        assert_eq!(args.history_type, "redis");
        assert_eq!(args.retry_policy().max_retries, 0);
        assert_eq!(args.smtp_config().from.as_deref(), Some("kitchen@example.com"));
    }
}
