//! Development notifier that writes messages to the log.

use async_trait::async_trait;

use crate::services::notifications::{DeliveryOutcome, EmailMessage, Notifier};

/// Logs every message at INFO and reports it delivered.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &EmailMessage) -> DeliveryOutcome {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.html_body,
            "Email (log transport)"
        );
        DeliveryOutcome::Delivered
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_notifier_always_delivers() {
        let outcome = LogNotifier
            .send(&EmailMessage {
                to: "anyone@example.com".to_string(),
                subject: "Subject".to_string(),
                html_body: "<p>Body</p>".to_string(),
            })
            .await;
        assert_eq!(outcome, DeliveryOutcome::Delivered);
    }
}
