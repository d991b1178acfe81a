use async_trait::async_trait;
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::AppConfig;

/// An outbound mail message
#[derive(Debug, Clone)]
pub struct MailMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}

/// Mailer errors
#[derive(Debug, Error)]
pub enum MailerError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Trait for mail delivery. Callers treat delivery as best-effort: failures
/// are logged, never propagated into the workflow that triggered the send.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), MailerError>;
}

/// SMTP-relay mailer
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self, MailerError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)?;

        if let (Some(username), Some(password)) = (username, password) {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailerError> {
        let email = Message::builder()
            .from(message.from.parse()?)
            .to(message.to.parse()?)
            .subject(&message.subject)
            .header(ContentType::TEXT_HTML)
            .body(message.body)?;

        self.transport.send(email).await?;
        Ok(())
    }
}

/// Fallback mailer used when no SMTP relay is configured; messages are
/// emitted to the log instead of being delivered.
pub struct TracingMailer;

#[async_trait]
impl Mailer for TracingMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailerError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "SMTP not configured; mail logged instead of sent"
        );
        Ok(())
    }
}

/// Build a mailer from configuration: SMTP when a relay host is set,
/// otherwise the tracing fallback.
pub fn mailer_from_config(cfg: &AppConfig) -> Result<Arc<dyn Mailer>, MailerError> {
    match &cfg.smtp_host {
        Some(host) => {
            let mailer =
                SmtpMailer::new(host, cfg.smtp_username.clone(), cfg.smtp_password.clone())?;
            Ok(Arc::new(mailer))
        }
        None => Ok(Arc::new(TracingMailer)),
    }
}

/// Builds the password recovery message for a user
pub fn forgot_password_message(
    from: &str,
    to: &str,
    username: &str,
    reset_link: &str,
) -> MailMessage {
    MailMessage {
        to: to.to_string(),
        from: from.to_string(),
        subject: "Roleplay: password recovery".to_string(),
        body: format!(
            "<p>Hello {username},</p>\
             <p>Someone requested a password reset for your Roleplay account.</p>\
             <p><a href=\"{reset_link}\">Reset your password</a></p>\
             <p>If this wasn't you, ignore this message.</p>"
        ),
    }
}
