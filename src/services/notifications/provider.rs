//! Core notifier trait and types.
//!
//! This module provides the abstraction over outbound email, allowing the
//! SMTP transport to be swapped for a logging one in development and for a
//! mock in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// An HTML email to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Result of a send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// The recipient address is malformed or the mail server says it does not exist
    InvalidRecipient(String),
    /// Any other failure, with a human-readable reason
    Failed(String),
}

/// Trait for outbound email transports.
///
/// Uses `async_trait` to support async methods with dynamic dispatch.
/// Sending never returns `Err`; every failure is folded into
/// `DeliveryOutcome` so callers decide how fatal it is.
///
/// # Example Implementation
/// ```ignore
/// #[async_trait]
/// impl Notifier for NullNotifier {
///     async fn send(&self, _message: &EmailMessage) -> DeliveryOutcome {
///         DeliveryOutcome::Delivered
///     }
///
///     fn name(&self) -> &'static str {
///         "null"
///     }
/// }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends one message
    async fn send(&self, message: &EmailMessage) -> DeliveryOutcome;

    /// Returns the transport name for logging
    fn name(&self) -> &'static str;
}
