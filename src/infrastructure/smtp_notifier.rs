use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;

use crate::application::{AppError, AppResult, Notification, Notifier};

#[derive(Clone, Debug, Deserialize)]
pub struct SmtpSettings {
    pub server: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: String,
}

fn default_port() -> u16 {
    587
}

/// Plain-text mail over a STARTTLS relay.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    pub fn new(settings: &SmtpSettings) -> AppResult<Self> {
        let from = parse_mailbox(&settings.from)?;
        let to = parse_mailbox(&settings.to)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.server)
            .map_err(|e| AppError::Config(format!("smtp relay {}: {e}", settings.server)))?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from,
            to,
        })
    }
}

fn parse_mailbox(raw: &str) -> AppResult<Mailbox> {
    raw.parse::<Mailbox>()
        .map_err(|e| AppError::Config(format!("invalid mail address {raw:?}: {e}")))
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, message: &Notification) -> AppResult<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| AppError::Notifier(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| AppError::Notifier(e.to_string()))?;

        tracing::info!(subject = %message.subject, "mail sent");
        Ok(())
    }
}
