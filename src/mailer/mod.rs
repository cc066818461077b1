//! Outbound mail as a capability boundary
//! (`Mailer.send(message)`). `RegistrationSaga`
//! and the schedule-send operation depend on `Arc<dyn Mailer>`, never on a
//! concrete transport, so tests run against `LoggingMailer` without talking
//! to a real SMTP server.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::collections::HashMap;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct MailMessage {
    pub template: String,
    pub to_name: String,
    pub to_email: String,
    pub vars: HashMap<String, String>,
    /// Sandbox sends are logged, never actually dispatched — used by the
    /// resend-invitation path when rate-limited to avoid mail-bombing an
    /// address.
    pub sandbox: bool,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), AppError>;
}

/// SMTP transport via `lettre`, used when `config.is_production()`.
pub struct LettreMailer {
    transport: SmtpTransport,
    from_email: String,
}

impl LettreMailer {
    pub fn new(smtp_host: &str, from_email: &str, credentials: Option<(String, String)>) -> Self {
        let mut builder = SmtpTransport::relay(smtp_host)
            .unwrap_or_else(|_| SmtpTransport::builder_dangerous(smtp_host));
        if let Some((user, pass)) = credentials {
            builder = builder.credentials(Credentials::new(user, pass));
        }
        Self {
            transport: builder.build(),
            from_email: from_email.to_string(),
        }
    }

    fn render(message: &MailMessage) -> String {
        let mut body = format!("template: {}\n\n", message.template);
        for (key, value) in &message.vars {
            body.push_str(&format!("{key}: {value}\n"));
        }
        body
    }
}

#[async_trait]
impl Mailer for LettreMailer {
    async fn send(&self, message: MailMessage) -> Result<(), AppError> {
        if message.sandbox {
            log::info!(
                "sandboxed mail to {} ({}), not dispatched",
                message.to_email,
                message.template
            );
            return Ok(());
        }

        let body = Self::render(&message);
        let email = Message::builder()
            .from(self.from_email.parse().map_err(|e| {
                AppError::Internal(anyhow::anyhow!("invalid from address: {e}"))
            })?)
            .to(format!("{} <{}>", message.to_name, message.to_email)
                .parse()
                .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid to address: {e}")))?)
            .subject(format!("RESA: {}", message.template))
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

        self.transport
            .send(&email)
            .map_err(|_| AppError::EmailSendFailed)?;

        Ok(())
    }
}

/// Development/test stand-in that logs the rendered message instead of
/// dispatching real mail.
#[derive(Default)]
pub struct LoggingMailer;

#[async_trait]
impl Mailer for LoggingMailer {
    async fn send(&self, message: MailMessage) -> Result<(), AppError> {
        log::info!(
            "mail[{}] to {} <{}> vars={:?} sandbox={}",
            message.template,
            message.to_name,
            message.to_email,
            message.vars,
            message.sandbox
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn logging_mailer_always_succeeds() {
        let mailer = LoggingMailer;
        let message = MailMessage {
            template: "activation".to_string(),
            to_name: "Ada".to_string(),
            to_email: "ada@example.com".to_string(),
            vars: HashMap::new(),
            sandbox: false,
        };
        assert!(mailer.send(message).await.is_ok());
    }
}
