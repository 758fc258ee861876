//! Notification channel seam
//!
//! Replies and agent notifications leave through a [`Notifier`]. The real
//! deployment plugs a WhatsApp gateway in here; this crate ships a console
//! implementation for the `chat` simulator.

use async_trait::async_trait;
use thiserror::Error;

/// Notification delivery failures.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery to {to} failed: {message}")]
    Delivery { to: String, message: String },
}

/// Outbound message channel, as seen by the dispatcher.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` to a phone number. No retries here; the gateway owns
    /// redelivery.
    async fn send_message(&self, to_phone: &str, text: &str) -> Result<(), NotifyError>;
}

/// Prints outbound messages to stdout. Used by `qualibot chat`.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send_message(&self, to_phone: &str, text: &str) -> Result<(), NotifyError> {
        println!("-> {to_phone}\n{text}\n");
        Ok(())
    }
}
