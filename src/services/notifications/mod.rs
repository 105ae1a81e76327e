//! Outbound email with pluggable transports.
//!
//! The core trait `Notifier` is implemented by `SmtpNotifier` (lettre) and
//! `LogNotifier` (development). `templates` renders the account emails.

mod log_provider;
mod provider;
mod smtp_provider;

pub mod templates;

pub use log_provider::LogNotifier;
#[cfg(test)]
pub use provider::MockNotifier;
pub use provider::{DeliveryOutcome, EmailMessage, Notifier};
pub use smtp_provider::SmtpNotifier;

use std::sync::Arc;

use crate::config::{EmailConfig, EmailTransport};
use crate::error::AppResult;

/// Builds the notifier selected by `email.transport`.
pub fn build_notifier(config: &EmailConfig) -> AppResult<Arc<dyn Notifier>> {
    Ok(match config.transport {
        EmailTransport::Smtp => Arc::new(SmtpNotifier::new(config)?),
        EmailTransport::Log => Arc::new(LogNotifier),
    })
}
