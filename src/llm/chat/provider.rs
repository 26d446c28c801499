use async_trait::async_trait;
use log::info;
use rllm::builder::LLMBuilder;
use rllm::chat::{ ChatMessage as RllmMessage, ChatRole as RllmRole, MessageType };
use rllm::LLMProvider;

use super::ChatClient;
use crate::llm::{ LlmConfig, LlmError, LlmType };
use crate::models::chat::{ ChatMessage, ChatRole };

/// Chat client backed by an `rllm` provider. One type covers every backend
/// `LlmType` knows about.
pub struct ProviderChatClient {
    llm: Box<dyn LLMProvider>,
    llm_type: LlmType,
    model: String,
    base_url: Option<String>,
}

impl ProviderChatClient {
    pub fn new(
        llm_type: LlmType,
        api_key: Option<String>,
        model: Option<String>,
        base_url: Option<String>
    ) -> Result<Self, LlmError> {
        let chat_model = model.unwrap_or_else(|| llm_type.default_model().to_string());

        let mut builder = LLMBuilder::new()
            .backend(llm_type.backend())
            .model(&chat_model)
            .stream(false);

        match api_key {
            Some(key) => {
                builder = builder.api_key(key);
            }
            None if llm_type.requires_api_key() => {
                return Err(
                    LlmError::Config(format!("API key is required for the {} backend", llm_type))
                );
            }
            None => {}
        }
        if let Some(url) = &base_url {
            builder = builder.base_url(url);
        }

        let llm = builder.build().map_err(|e| LlmError::Config(e.to_string()))?;

        Ok(Self {
            llm,
            llm_type,
            model: chat_model,
            base_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key.clone().filter(|k| !k.trim().is_empty());
        Self::new(config.llm_type, api_key, config.completion_model.clone(), config.base_url.clone())
    }
}

pub(crate) fn to_provider_messages(history: &[ChatMessage], prompt: &str) -> Vec<RllmMessage> {
    history
        .iter()
        .map(|msg| RllmMessage {
            role: match msg.role {
                ChatRole::User => RllmRole::User,
                ChatRole::Model => RllmRole::Assistant,
            },
            content: msg.content.clone(),
            message_type: MessageType::Text,
        })
        .chain(
            std::iter::once(RllmMessage {
                role: RllmRole::User,
                content: prompt.to_string(),
                message_type: MessageType::Text,
            })
        )
        .collect()
}

#[async_trait]
impl ChatClient for ProviderChatClient {
    async fn chat(
        &self,
        history: &[ChatMessage],
        prompt: &str
    ) -> Result<Option<String>, LlmError> {
        let messages = to_provider_messages(history, prompt);
        info!(
            "ProviderChatClient::chat() → backend={} model={} base_url={:?} turns={}",
            self.llm_type,
            self.model,
            self.base_url,
            messages.len()
        );
        let resp = self.llm.chat(&messages).await.map_err(|e| LlmError::classify(e.to_string()))?;
        Ok(resp.text().map(|s| s.to_string()).filter(|s| !s.is_empty()))
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        self.base_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_roles_map_to_provider_roles() {
        let history = vec![ChatMessage::user("first"), ChatMessage::model("reply")];
        let messages = to_provider_messages(&history, "second");
        assert_eq!(messages.len(), 3);
        assert!(matches!(messages[0].role, RllmRole::User));
        assert!(matches!(messages[1].role, RllmRole::Assistant));
        assert!(matches!(messages[2].role, RllmRole::User));
        assert_eq!(messages[2].content, "second");
    }

    #[test]
    fn test_missing_key_is_a_config_error() {
        let config = LlmConfig {
            llm_type: LlmType::Gemini,
            api_key: Some("   ".into()),
            ..Default::default()
        };
        assert!(matches!(ProviderChatClient::from_config(&config), Err(LlmError::Config(_))));
    }
}
