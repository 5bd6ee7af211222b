//! Webhook error types.

use thiserror::Error;

/// Result type for webhook operations.
pub type WebhookResult<T> = Result<T, WebhookError>;

/// Error type for webhook operations.
///
/// Delivery failures are not errors: they are recorded on the
/// [`WebhookDelivery`](crate::WebhookDelivery) itself and retried. These
/// variants cover the store seam and malformed input.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Invalid payload.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Unknown webhook event name.
    #[error("unknown webhook event: {0}")]
    UnknownEvent(String),

    /// No webhook registered under the given id.
    #[error("webhook not found: {0}")]
    WebhookNotFound(String),

    /// Delivery store failure.
    #[error("store error: {0}")]
    Store(String),
}

impl From<serde_json::Error> for WebhookError {
    fn from(err: serde_json::Error) -> Self {
        WebhookError::InvalidPayload(err.to_string())
    }
}
