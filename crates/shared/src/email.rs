//! Outbound notifications.
//!
//! Uses `lettre` for SMTP transport. Delivery is retried a fixed number of
//! times with no backoff; the caller decides what a final failure means.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;

use crate::config::EmailConfig;
use crate::error::AppError;

/// Email service errors.
#[derive(Debug, Clone, Error)]
pub enum EmailError {
    /// Failed to build email message.
    #[error("Failed to build email: {0}")]
    BuildError(String),
    /// Failed to send email.
    #[error("Failed to send email: {0}")]
    SendError(String),
    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

impl From<EmailError> for AppError {
    fn from(err: EmailError) -> Self {
        Self::Upstream(err.to_string())
    }
}

/// Accepts a recipient list, subject and body and reports success or failure.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one message to every recipient.
    async fn notify(&self, recipients: &[String], subject: &str, body: &str)
    -> Result<(), EmailError>;
}

/// Calls the notifier up to `max_attempts` times, returning the last error.
///
/// # Errors
///
/// Returns the final `EmailError` once every attempt has failed.
pub async fn deliver_with_retry(
    notifier: &dyn Notifier,
    recipients: &[String],
    subject: &str,
    body: &str,
    max_attempts: u32,
) -> Result<(), EmailError> {
    let attempts = max_attempts.max(1);
    let mut last_err = None;
    for attempt in 1..=attempts {
        match notifier.notify(recipients, subject, body).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::warn!(attempt, max_attempts = attempts, error = %e, "Notification attempt failed");
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| EmailError::SendError("no delivery attempt made".into())))
}

/// SMTP-backed notifier.
#[derive(Clone)]
pub struct SmtpNotifier {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl std::fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpNotifier")
            .field("from", &self.from.to_string())
            .finish_non_exhaustive()
    }
}

impl SmtpNotifier {
    /// Creates a notifier from SMTP settings.
    ///
    /// Without a username the connection is unauthenticated plain SMTP, which
    /// suits a local mail catcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the sender address or relay host is invalid.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_email)
            .parse()
            .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?;

        let transport = if config.smtp_username.is_empty() {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
                .port(config.smtp_port)
                .build()
        } else {
            let creds = Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            );
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
                .map_err(|e| EmailError::SendError(e.to_string()))?
                .port(config.smtp_port)
                .credentials(creds)
                .build()
        };

        Ok(Self { from, transport })
    }

    fn build_message(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<Message, EmailError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);
        for recipient in recipients {
            let to: Mailbox = recipient
                .parse()
                .map_err(|e| EmailError::InvalidAddress(format!("{recipient}: {e}")))?;
            builder = builder.to(to);
        }
        builder
            .body(body.to_string())
            .map_err(|e| EmailError::BuildError(e.to_string()))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        let email = self.build_message(recipients, subject, body)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| EmailError::SendError(e.to_string()))?;
        Ok(())
    }
}
