//! Payment Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Payment provider call failed or timed out
    #[error("Provider error: {0}")]
    Provider(String),

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    Signature(String),

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Entitlement storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PaymentError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, PaymentError::Provider(_) | PaymentError::Storage(_))
    }

    /// Get user-friendly message. Provider internals stay in the logs.
    pub fn user_message(&self) -> &str {
        match self {
            PaymentError::Provider(_) => "Payment processing failed. Please try again.",
            PaymentError::Config(_) => "Payments are not configured.",
            _ => "An error occurred processing your request.",
        }
    }
}
