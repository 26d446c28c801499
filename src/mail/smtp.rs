use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{ AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor };
use log::info;
use std::time::Duration;

use super::{ MailError, Mailer };

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: Option<String>,
    pub timeout: Duration,
}

/// Sends mail through an SMTP relay, upgrading the connection with STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let sender = config
            .from
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .unwrap_or(&config.username);
        if sender.trim().is_empty() {
            return Err(MailError::Config("SMTP_USERNAME or SMTP_FROM must be set".into()));
        }
        let from: Mailbox = sender
            .parse()
            .map_err(|_| MailError::InvalidAddress(sender.to_string()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailError::Config(e.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(config.username.clone(), config.password.clone()))
            .timeout(Some(config.timeout))
            .build();

        info!("SMTP mailer configured: host={} port={} from={}", config.host, config.port, from);
        Ok(Self { transport, from })
    }
}

pub(crate) fn build_message(
    from: &Mailbox,
    recipient: &str,
    subject: &str,
    body: &str
) -> Result<Message, MailError> {
    let to: Mailbox = recipient
        .trim()
        .parse()
        .map_err(|_| MailError::InvalidAddress(recipient.to_string()))?;
    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| MailError::Build(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let message = build_message(&self.from, recipient, subject, body)?;
        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| MailError::Transport(e.to_string()))
    }
}
