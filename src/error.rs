//! Error types for the qualification bot
//!
//! The router itself never surfaces an error: validation failures are
//! `Action::Invalid` descriptors and internal faults degrade to
//! `Action::Error` at its boundary. `BotError` is the dispatcher-level
//! taxonomy for collaborator and startup failures. Messages destined for
//! logs are sanitized: leads talk to us from their personal phones, so
//! phone numbers are PII here.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Main error type for bot operations.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("Record store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Calendar error: {0}")]
    Calendar(#[from] crate::scheduling::CalendarError),

    #[error("Notification error: {0}")]
    Notify(#[from] crate::notify::NotifyError),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl BotError {
    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Log-safe rendering of this error.
    pub fn sanitized(&self) -> String {
        sanitize_log_message(&self.to_string())
    }
}

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+?\d[\d\s-]{7,14}\d").expect("valid phone regex"));

static SECRET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(password|token|key|secret)[=:]\s*\S+").expect("valid secret regex")
});

/// Sanitize a message before it reaches the logs: redact phone numbers and
/// secret-shaped pairs, and truncate to 500 bytes.
pub fn sanitize_log_message(message: &str) -> String {
    let mut sanitized = SECRET_RE.replace_all(message, "${1}=***").to_string();
    sanitized = PHONE_RE.replace_all(&sanitized, "+***").to_string();

    if sanitized.len() > 500 {
        let truncate_suffix = "...[truncated]";
        let max_content_len = 500 - truncate_suffix.len();
        let mut cut = max_content_len;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized = format!("{}{}", &sanitized[..cut], truncate_suffix);
    }

    sanitized
}

/// Result type for bot operations.
pub type BotResult<T> = Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn test_store_error_wraps() {
        let error = BotError::from(StoreError::NotFound("lead 42".to_string()));
        assert_eq!(error.to_string(), "Record store error: lead 42 not found");
    }

    #[test]
    fn test_notify_error_wraps() {
        let error = BotError::from(crate::notify::NotifyError::Delivery {
            to: "+254700123456".to_string(),
            message: "channel closed".to_string(),
        });
        assert!(matches!(error, BotError::Notify(_)));
        assert!(error.to_string().contains("channel closed"));
    }

    #[test]
    fn test_internal_constructor() {
        let error = BotError::internal("unexpected state");
        assert!(matches!(error, BotError::Internal { .. }));
        assert_eq!(error.to_string(), "Internal error: unexpected state");
    }

    #[test]
    fn test_phone_numbers_redacted() {
        let sanitized = sanitize_log_message("failed to reach +254700123456 after send");
        assert!(!sanitized.contains("254700123456"));
        assert!(sanitized.contains("+***"));
    }

    #[test]
    fn test_phone_with_spacing_redacted() {
        let sanitized = sanitize_log_message("lead at 0700 123 456 not found");
        assert!(!sanitized.contains("123 456"));
    }

    #[test]
    fn test_secret_pairs_redacted() {
        let sanitized = sanitize_log_message("auth failed: token=abc456 password: hunter2");
        assert!(!sanitized.contains("abc456"));
        assert!(!sanitized.contains("hunter2"));
        assert!(sanitized.contains("token=***"));
        assert!(sanitized.contains("password=***"));
    }

    #[test]
    fn test_long_message_truncation() {
        let long_message = "x".repeat(600);
        let sanitized = sanitize_log_message(&long_message);

        assert!(sanitized.len() <= 500);
        assert!(sanitized.ends_with("...[truncated]"));
    }

    #[test]
    fn test_short_message_untouched() {
        assert_eq!(sanitize_log_message("nothing to hide"), "nothing to hide");
        assert_eq!(sanitize_log_message(""), "");
    }

    #[test]
    fn test_exactly_500_bytes_not_truncated() {
        let message = "y".repeat(500);
        let sanitized = sanitize_log_message(&message);
        assert_eq!(sanitized.len(), 500);
        assert!(!sanitized.contains("truncated"));
    }

    #[test]
    fn test_sanitized_error_rendering() {
        let error = BotError::from(crate::notify::NotifyError::Delivery {
            to: "+254711222333".to_string(),
            message: "gateway timeout".to_string(),
        });
        let sanitized = error.sanitized();
        assert!(!sanitized.contains("254711222333"));
        assert!(sanitized.starts_with("Notification error:"));
    }
}
