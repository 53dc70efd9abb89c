//! Outbound mail delivery.
//!
//! SMTP via lettre when configured; without SMTP settings the mailer logs
//! the message instead of sending it (development mode).

use async_trait::async_trait;
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpConfig;
use crate::errors::{AppError, AppResult};

#[cfg(test)]
use mockall::automock;

/// Mail delivery trait for dependency injection.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a single HTML message. A failure here must surface to the
    /// caller; registration rolls back its pending token on error.
    async fn send(&self, to: &str, subject: &str, html_body: String) -> AppResult<()>;
}

/// SMTP-backed mailer. `transport == None` means log-only mode.
pub struct SmtpMailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> AppResult<Self> {
        let transport = match &config.host {
            Some(host) => {
                let mut builder =
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                        .map_err(|e| AppError::Mail(format!("SMTP relay setup failed: {}", e)))?
                        .port(config.port);

                if let (Some(user), Some(pass)) = (&config.user, &config.pass) {
                    builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
                }

                Some(builder.build())
            }
            None => {
                tracing::warn!("SMTP_HOST not set, outbound mail will be logged only");
                None
            }
        };

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: String) -> AppResult<()> {
        let Some(transport) = &self.transport else {
            tracing::info!(to, subject, "mail (log-only): {}", html_body);
            return Ok(());
        };

        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| AppError::Mail(format!("Invalid sender address: {}", e)))?,
            )
            .to(to
                .parse()
                .map_err(|e| AppError::Mail(format!("Invalid recipient address: {}", e)))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body)
            .map_err(|e| AppError::Mail(format!("Failed to build message: {}", e)))?;

        transport
            .send(message)
            .await
            .map_err(|e| AppError::Mail(format!("SMTP delivery failed: {}", e)))?;

        tracing::debug!(to, subject, "mail sent");
        Ok(())
    }
}
