//! SMTP notifier using lettre's async transport.

use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::EmailConfig;
use crate::error::{AppError, AppResult};
use crate::services::notifications::{DeliveryOutcome, EmailMessage, Notifier};

/// Permanent replies meaning the mailbox does not exist or is not accepted.
const RECIPIENT_REJECTED_CODES: &[&str] = &["550", "551", "553"];

/// SMTP notifier
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpNotifier {
    /// Builds the transport from the `[email]` section.
    ///
    /// No connection is opened until the first send.
    pub fn new(config: &EmailConfig) -> AppResult<Self> {
        let sender: Mailbox = config.sender.parse().map_err(|e| AppError::Configuration {
            key: "email.sender".to_string(),
            source: anyhow::anyhow!("invalid sender mailbox: {}", e),
        })?;

        let mut builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host).map_err(
                |e| AppError::Configuration {
                    key: "email.smtp_host".to_string(),
                    source: anyhow::Error::from(e),
                },
            )?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
        };

        builder = builder.port(config.smtp_port);
        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            sender,
        })
    }

    fn build_message(&self, to: Mailbox, message: &EmailMessage) -> Result<Message, String> {
        Message::builder()
            .from(self.sender.clone())
            .to(to)
            .subject(&message.subject)
            .header(ContentType::TEXT_HTML)
            .body(message.html_body.clone())
            .map_err(|e| e.to_string())
    }
}

/// Maps an SMTP failure to a delivery outcome.
fn classify_smtp_error(error: &lettre::transport::smtp::Error) -> DeliveryOutcome {
    let code = error.status().map(|c| c.to_string());
    match code {
        Some(code) if error.is_permanent() && RECIPIENT_REJECTED_CODES.contains(&code.as_str()) => {
            DeliveryOutcome::InvalidRecipient(error.to_string())
        }
        _ => DeliveryOutcome::Failed(error.to_string()),
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, message: &EmailMessage) -> DeliveryOutcome {
        let to: Mailbox = match message.to.parse() {
            Ok(to) => to,
            Err(e) => return DeliveryOutcome::InvalidRecipient(format!("{}: {}", message.to, e)),
        };

        let email = match self.build_message(to, message) {
            Ok(email) => email,
            Err(reason) => return DeliveryOutcome::Failed(reason),
        };

        match self.transport.send(email).await {
            Ok(_) => {
                tracing::debug!(
                    to = %message.to,
                    subject = %message.subject,
                    "Email sent via SMTP"
                );
                DeliveryOutcome::Delivered
            }
            Err(e) => {
                let outcome = classify_smtp_error(&e);
                tracing::warn!(
                    to = %message.to,
                    error = %e,
                    outcome = ?outcome,
                    "SMTP send failed"
                );
                outcome
            }
        }
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
