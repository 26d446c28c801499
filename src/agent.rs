use crate::cli::Args;
use crate::history::{ initialize_history_store, HistoryError, HistoryStore };
use crate::llm::{ LlmConfig, LlmError, LlmType };
use crate::llm::chat::{ chat_with_retry, new_client as new_chat_client, ChatClient, RetryPolicy };
use crate::mail::{ build_mailer, format_recipes_email, MailError, Mailer, EMAIL_SUBJECT };
use crate::models::chat::ChatMessage;
use crate::models::recipe::{ EmailRequest, RecipeRequest, RecipeResponse };
use crate::recipe::{ build_recipe_prompt, chat_message_for, sanitize_recipe, NO_RECIPE_SENTINEL };

use log::{ info, warn, error };
use std::error::Error;
use std::sync::Arc;
use thiserror::Error as ThisError;
use uuid::Uuid;

const MAX_SESSION_ID_LEN: usize = 128;

#[derive(Debug, ThisError)]
pub enum AgentError {
    #[error("email and recipes are required")]
    MissingEmailFields,
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Mail(#[from] MailError),
}

#[derive(Clone)]
pub struct RecipeAgent {
    chat_client: Arc<dyn ChatClient>,
    history_store: Arc<dyn HistoryStore>,
    mailer: Arc<dyn Mailer>,
    retry_policy: RetryPolicy,
    history_limit: usize,
}

impl RecipeAgent {
    pub fn new(
        chat_client: Arc<dyn ChatClient>,
        history_store: Arc<dyn HistoryStore>,
        mailer: Arc<dyn Mailer>,
        retry_policy: RetryPolicy,
        history_limit: usize
    ) -> Self {
        Self {
            chat_client,
            history_store,
            mailer,
            retry_policy,
            history_limit: if history_limit == 0 { usize::MAX } else { history_limit },
        }
    }

    pub fn from_args(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let llm_type: LlmType = args.chat_llm_type.parse()?;
        let chat_config = LlmConfig {
            llm_type,
            api_key: args.resolved_chat_api_key(),
            completion_model: args.chat_model.clone(),
            base_url: args.chat_base_url.clone(),
        };
        let chat_client = new_chat_client(&chat_config)?;
        info!(
            "Chat client configured: Type={}, Model={}, BaseURL={:?}",
            llm_type,
            chat_client.get_model(),
            chat_client.get_base_url().as_deref().unwrap_or("backend default")
        );

        let history_store = initialize_history_store(args)?;
        let mailer = build_mailer(&args.smtp_config());

        Ok(Self::new(
            chat_client,
            history_store,
            mailer,
            args.retry_policy(),
            args.history_max_turns
        ))
    }

    /// Picks the caller's session id (body first, then header) or mints one.
    pub fn resolve_session_id(body: Option<&str>, header: Option<&str>) -> String {
        body.into_iter()
            .chain(header)
            .map(str::trim)
            .find(|id| !id.is_empty() && id.len() <= MAX_SESSION_ID_LEN)
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    async fn load_history(&self, session_id: &str) -> Vec<ChatMessage> {
        match self.history_store.get_conversation(session_id, self.history_limit).await {
            Ok(conversation) => conversation.messages,
            Err(e) => {
                warn!("Could not load history for session {}: {}. Continuing without it.", session_id, e);
                Vec::new()
            }
        }
    }

    async fn commit_turns(&self, session_id: &str, turns: [ChatMessage; 2]) {
        let result: Result<(), HistoryError> = self.history_store.append_turns(session_id, &turns).await;
        if let Err(e) = result {
            error!("Failed to store turns for session {}: {}", session_id, e);
        }
    }

    /// Generates a recipe within the caller's session.
    ///
    /// History is only written after the model answered, so a failed call
    /// leaves the session untouched.
    pub async fn generate_recipe(
        &self,
        request: &RecipeRequest,
        header_session_id: Option<&str>
    ) -> Result<RecipeResponse, AgentError> {
        let body_session_id = request.session_id_text();
        let session_id = Self::resolve_session_id(body_session_id.as_deref(), header_session_id);
        let prompt = build_recipe_prompt(request);
        let history = self.load_history(&session_id).await;
        info!("Generating recipe for session {} with {} prior turns", session_id, history.len());

        let raw = chat_with_retry(
            self.chat_client.as_ref(),
            &history,
            &prompt,
            &self.retry_policy
        ).await.map_err(|e| {
            error!("Error calling chat model for session {}: {}", session_id, e);
            e
        })?;

        let recipe = sanitize_recipe(raw.as_deref().unwrap_or(NO_RECIPE_SENTINEL));
        let chat_message = chat_message_for(&recipe).to_string();

        self.commit_turns(&session_id, [ChatMessage::user(prompt), ChatMessage::model(recipe.clone())]).await;

        Ok(RecipeResponse {
            chat_message,
            recipe,
            session_id,
        })
    }

    pub async fn send_recipes(&self, request: &EmailRequest) -> Result<(), AgentError> {
        let email = request.email.as_deref().map(str::trim).unwrap_or_default();
        let recipes = request.recipes.as_deref().unwrap_or_default();
        if email.is_empty() || recipes.is_empty() {
            return Err(AgentError::MissingEmailFields);
        }

        let body = format_recipes_email(recipes);
        self.mailer.send(email, EMAIL_SUBJECT, &body).await.map_err(|e| {
            error!("Error sending email to {}: {}", email, e);
            e
        })?;
        info!("Sent {} recipes to {}", recipes.len(), email);
        Ok(())
    }
}
