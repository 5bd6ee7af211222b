//! Webhook subscription records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::event::WebhookEvent;

/// Lifecycle state of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookStatus {
    /// Receiving deliveries.
    Active,
    /// Suspended by the owner.
    Paused,
    /// Disabled after a delivery exhausted its attempts.
    Failed,
}

/// A subscriber registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    /// Unique identifier.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Target URL.
    pub url: String,
    /// Events this webhook receives.
    pub events: HashSet<WebhookEvent>,
    /// Secret for signing payloads, shown to the owner once.
    pub secret: String,
    /// Lifecycle state.
    pub status: WebhookStatus,
    /// Failed attempts since the last success.
    pub failure_count: u32,
    /// Last time a delivery was attempted.
    pub last_triggered_at: Option<DateTime<Utc>>,
    /// Status code of the last attempt, if the subscriber responded.
    pub last_response_code: Option<u16>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Webhook {
    /// Creates an active webhook with no subscriptions.
    pub fn new(
        user_id: impl Into<String>,
        url: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            url: url.into(),
            events: HashSet::new(),
            secret: secret.into(),
            status: WebhookStatus::Active,
            failure_count: 0,
            last_triggered_at: None,
            last_response_code: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Subscribes to the given events.
    pub fn events(mut self, events: impl IntoIterator<Item = WebhookEvent>) -> Self {
        self.events = events.into_iter().collect();
        self
    }

    /// Starts the webhook paused.
    pub fn paused(mut self) -> Self {
        self.status = WebhookStatus::Paused;
        self
    }

    /// Checks whether a delivery should be queued for an event.
    pub fn should_receive(&self, event: WebhookEvent) -> bool {
        self.status == WebhookStatus::Active && self.events.contains(&event)
    }

    /// Records the outcome of one delivery attempt.
    pub fn record_delivery(&mut self, response_code: Option<u16>, success: bool) {
        let now = Utc::now();
        self.last_triggered_at = Some(now);
        self.last_response_code = response_code;
        self.updated_at = now;

        if success {
            self.failure_count = 0;
        } else {
            self.failure_count += 1;
        }
    }

    /// Disables the webhook after a delivery exhausted its attempts.
    pub fn mark_failed(&mut self) {
        self.status = WebhookStatus::Failed;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_receive_requires_active_and_subscribed() {
        let webhook = Webhook::new("u1", "https://example.com/hook", "secret")
            .events([WebhookEvent::PrSet, WebhookEvent::ResultAdded]);

        assert!(webhook.should_receive(WebhookEvent::PrSet));
        assert!(webhook.should_receive(WebhookEvent::ResultAdded));
        assert!(!webhook.should_receive(WebhookEvent::WorkoutCreated));

        let paused = webhook.clone().paused();
        assert!(!paused.should_receive(WebhookEvent::PrSet));

        let mut failed = webhook;
        failed.mark_failed();
        assert!(!failed.should_receive(WebhookEvent::PrSet));
    }

    #[test]
    fn test_record_delivery_bookkeeping() {
        let mut webhook =
            Webhook::new("u1", "https://example.com/hook", "secret").events([WebhookEvent::PrSet]);

        webhook.record_delivery(Some(500), false);
        webhook.record_delivery(None, false);
        assert_eq!(webhook.failure_count, 2);
        assert_eq!(webhook.last_response_code, None);
        assert!(webhook.last_triggered_at.is_some());

        webhook.record_delivery(Some(200), true);
        assert_eq!(webhook.failure_count, 0);
        assert_eq!(webhook.last_response_code, Some(200));
    }
}
