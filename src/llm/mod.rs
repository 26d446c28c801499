pub mod chat;
use rllm::builder::LLMBackend;
use serde::{ Deserialize, Serialize };
use std::str::FromStr;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmType {
    Ollama,
    OpenAI,
    Anthropic,
    Gemini,
    DeepSeek,
    XAI,
    Groq,
}

impl LlmType {
    pub fn backend(&self) -> LLMBackend {
        match self {
            LlmType::Ollama => LLMBackend::Ollama,
            LlmType::OpenAI => LLMBackend::OpenAI,
            LlmType::Anthropic => LLMBackend::Anthropic,
            LlmType::Gemini => LLMBackend::Google,
            LlmType::DeepSeek => LLMBackend::DeepSeek,
            LlmType::XAI => LLMBackend::XAI,
            LlmType::Groq => LLMBackend::Groq,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmType::Ollama => "llama3",
            LlmType::OpenAI => "gpt-4o-mini",
            LlmType::Anthropic => "claude-3-5-haiku-latest",
            LlmType::Gemini => "gemini-1.5-flash",
            LlmType::DeepSeek => "deepseek-chat",
            LlmType::XAI => "grok-2-latest",
            LlmType::Groq => "llama-3.1-8b-instant",
        }
    }

    /// Ollama runs locally and needs no key.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LlmType::Ollama)
    }
}

impl fmt::Display for LlmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LlmType::Ollama => "ollama",
            LlmType::OpenAI => "openai",
            LlmType::Anthropic => "anthropic",
            LlmType::Gemini => "gemini",
            LlmType::DeepSeek => "deepseek",
            LlmType::XAI => "xai",
            LlmType::Groq => "groq",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseLlmTypeError {
    message: String,
}

impl fmt::Display for ParseLlmTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseLlmTypeError {}
impl FromStr for LlmType {
    type Err = ParseLlmTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(LlmType::Ollama),
            "openai" => Ok(LlmType::OpenAI),
            "anthropic" => Ok(LlmType::Anthropic),
            "gemini" | "google" => Ok(LlmType::Gemini),
            "deepseek" => Ok(LlmType::DeepSeek),
            "xai" => Ok(LlmType::XAI),
            "groq" => Ok(LlmType::Groq),
            _ =>
                Err(ParseLlmTypeError {
                    message: format!("Invalid LLM type: '{}'", s),
                }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub llm_type: LlmType,
    pub api_key: Option<String>,
    pub completion_model: Option<String>,
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            llm_type: LlmType::Gemini,
            api_key: None,
            completion_model: None,
            base_url: None,
        }
    }
}

/// Failure kinds of a generation call. Only `Timeout` and `Provider` are
/// considered transient.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("model call timed out: {0}")]
    Timeout(String),
    #[error("provider rejected credentials: {0}")]
    Auth(String),
    #[error("provider quota or rate limit exceeded: {0}")]
    Quota(String),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("invalid LLM configuration: {0}")]
    Config(String),
}

impl LlmError {
    pub fn is_transient(&self) -> bool {
        matches!(self, LlmError::Timeout(_) | LlmError::Provider(_))
    }

    /// Sorts an opaque provider error message into a kind.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

        if has(&[
            "401",
            "403",
            "unauthorized",
            "unauthenticated",
            "authentication",
            "permission_denied",
            "permission denied",
            "invalid api key",
            "api key not valid",
            "api_key_invalid",
        ]) {
            LlmError::Auth(message)
        } else if has(&["429", "quota", "rate limit", "resource_exhausted", "too many requests"]) {
            LlmError::Quota(message)
        } else if has(&["timed out", "timeout", "deadline exceeded"]) {
            LlmError::Timeout(message)
        } else {
            LlmError::Provider(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_llm_type() {
        assert_eq!("Gemini".parse::<LlmType>(), Ok(LlmType::Gemini));
        assert_eq!("google".parse::<LlmType>(), Ok(LlmType::Gemini));
        assert_eq!(" openai ".parse::<LlmType>(), Ok(LlmType::OpenAI));
        assert!("palm".parse::<LlmType>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for t in [LlmType::Ollama, LlmType::Gemini, LlmType::XAI, LlmType::Groq] {
            assert_eq!(t.to_string().parse::<LlmType>(), Ok(t));
        }
    }

    #[test]
    fn test_classify_provider_errors() {
        assert!(matches!(LlmError::classify("HTTP 401 Unauthorized"), LlmError::Auth(_)));
        assert!(matches!(LlmError::classify("API key not valid"), LlmError::Auth(_)));
        assert!(matches!(LlmError::classify("429 RESOURCE_EXHAUSTED"), LlmError::Quota(_)));
        assert_eq!(
            LlmError::classify("request timed out after 30s"),
            LlmError::Timeout("request timed out after 30s".into())
        );
        assert!(matches!(LlmError::classify("connection reset"), LlmError::Provider(_)));
    }

    #[test]
    fn test_classify_ignores_auth_lookalikes() {
        assert!(matches!(LlmError::classify("unknown author field in response"), LlmError::Provider(_)));
        assert!(matches!(LlmError::classify("certificate authority rejected"), LlmError::Provider(_)));
        assert!(matches!(LlmError::classify("UNAUTHENTICATED: bad token"), LlmError::Auth(_)));
    }

    #[test]
    fn test_transient_kinds() {
        assert!(LlmError::Provider("x".into()).is_transient());
        assert!(LlmError::Timeout("1s".into()).is_transient());
        assert!(!LlmError::Auth("x".into()).is_transient());
        assert!(!LlmError::Quota("x".into()).is_transient());
        assert!(!LlmError::Config("x".into()).is_transient());
    }
}
