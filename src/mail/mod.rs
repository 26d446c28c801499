mod smtp;

use async_trait::async_trait;
use log::warn;
use std::sync::Arc;
use thiserror::Error;

pub use self::smtp::{ SmtpConfig, SmtpMailer };

pub const EMAIL_SUBJECT: &str = "Your Saved Recipes";
pub const EMAIL_DISCLAIMER: &str =
    "Disclaimer: these recipes were generated by AI. Check ingredients for allergens \
and make sure all food is cooked to a safe temperature before serving.";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid email address '{0}'")]
    InvalidAddress(String),
    #[error("failed to build email: {0}")]
    Build(String),
    #[error("smtp transport error: {0}")]
    Transport(String),
    #[error("smtp configuration error: {0}")]
    Config(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// Stands in for the SMTP mailer when it cannot be configured; every send
/// fails with the configuration problem.
pub struct UnconfiguredMailer {
    reason: String,
}

impl UnconfiguredMailer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait]
impl Mailer for UnconfiguredMailer {
    async fn send(&self, _recipient: &str, _subject: &str, _body: &str) -> Result<(), MailError> {
        Err(MailError::Config(self.reason.clone()))
    }
}

/// SMTP mailer when the relay settings are usable, otherwise an
/// `UnconfiguredMailer`. Recipe generation never depends on mail settings.
pub fn build_mailer(config: &SmtpConfig) -> Arc<dyn Mailer> {
    match SmtpMailer::new(config) {
        Ok(mailer) => Arc::new(mailer),
        Err(e) => {
            warn!("Email delivery disabled: {}. /send_recipes will fail until SMTP is configured.", e);
            Arc::new(UnconfiguredMailer::new(e.to_string()))
        }
    }
}

/// Renders saved recipes as a numbered plain-text list followed by the
/// disclaimer.
pub fn format_recipes_email(recipes: &[String]) -> String {
    let mut body = String::from("Here are your saved recipes:\n\n");
    for (i, recipe) in recipes.iter().enumerate() {
        body.push_str(&format!("Recipe {}:\n{}\n\n", i + 1, recipe.trim()));
    }
    body.push_str(EMAIL_DISCLAIMER);
    body
}
