//! Delivery records and the HTTP delivery engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::endpoint::Webhook;
use crate::event::WebhookEvent;
use crate::retry::RetryStrategy;
#[cfg(feature = "http-client")]
use crate::signature::WebhookSigner;

/// Stored length cap for a subscriber's response body, in characters.
const RESPONSE_BODY_LIMIT: usize = 1000;

/// Delivery lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Queued, no attempt made yet.
    Pending,
    /// Delivered. Terminal.
    Success,
    /// Last attempt failed. Terminal once no retry is scheduled.
    Failed,
}

/// One webhook + event + payload delivery, mutated in place per attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDelivery {
    /// Unique identifier, also sent as `X-TrackVerse-Delivery`.
    pub id: String,
    /// The subscription this delivery belongs to.
    pub webhook_id: String,
    /// The event being delivered.
    pub event: WebhookEvent,
    /// The event data serialized into the body.
    pub payload: Value,
    /// Status code of the last attempt, if the subscriber responded.
    pub response_code: Option<u16>,
    /// Response body of the last attempt, truncated.
    pub response_body: Option<String>,
    /// Wall-clock duration of the last attempt in milliseconds.
    pub duration_ms: u64,
    /// Lifecycle status.
    pub status: DeliveryStatus,
    /// Attempts made so far.
    pub attempts: u32,
    /// When the next attempt is due, while any remain.
    pub next_retry_at: Option<DateTime<Utc>>,
    /// Creation timestamp, also sent in the body as `createdAt`.
    pub created_at: DateTime<Utc>,
}

impl WebhookDelivery {
    /// Queues a new pending delivery for a webhook.
    pub fn new(webhook: &Webhook, event: WebhookEvent, payload: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            webhook_id: webhook.id.clone(),
            event,
            payload,
            response_code: None,
            response_body: None,
            duration_ms: 0,
            status: DeliveryStatus::Pending,
            attempts: 0,
            next_retry_at: None,
            created_at: Utc::now(),
        }
    }

    /// Records a successful attempt. Success is terminal.
    pub fn record_success(&mut self, code: u16, body: Option<String>, duration_ms: u64) {
        self.attempts += 1;
        self.status = DeliveryStatus::Success;
        self.response_code = Some(code);
        self.response_body = body.map(truncate_body);
        self.duration_ms = duration_ms;
        self.next_retry_at = None;
    }

    /// Records a failed attempt, scheduling the next one if the budget
    /// allows.
    pub fn record_failure(
        &mut self,
        code: Option<u16>,
        body: Option<String>,
        duration_ms: u64,
        retry_in: Option<Duration>,
    ) {
        self.attempts += 1;
        self.status = DeliveryStatus::Failed;
        self.response_code = code;
        self.response_body = body.map(truncate_body);
        self.duration_ms = duration_ms;
        self.next_retry_at =
            retry_in.map(|delay| Utc::now() + chrono::Duration::from_std(delay).unwrap_or_default());
    }

    /// True once no further attempt will be made.
    pub fn is_terminal(&self) -> bool {
        match self.status {
            DeliveryStatus::Success => true,
            DeliveryStatus::Failed => self.next_retry_at.is_none(),
            DeliveryStatus::Pending => false,
        }
    }

    /// The JSON body sent to the subscriber.
    pub fn body(&self) -> Value {
        serde_json::json!({
            "id": self.id,
            "event": self.event.as_str(),
            "data": self.payload,
            "createdAt": self.created_at.to_rfc3339(),
        })
    }
}

fn truncate_body(body: String) -> String {
    match body.char_indices().nth(RESPONSE_BODY_LIMIT) {
        Some((idx, _)) => body[..idx].to_string(),
        None => body,
    }
}

/// Result of a test ping against a subscriber URL.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookTestResult {
    /// Whether the subscriber answered with a 2xx.
    pub success: bool,
    /// Status code, if the subscriber responded at all.
    pub status_code: Option<u16>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// What went wrong, when it did.
    pub error: Option<String>,
}

/// Signs and posts deliveries to subscriber URLs.
pub struct DeliveryEngine<R: RetryStrategy> {
    retry: R,
    delivery_timeout: Duration,
    test_timeout: Duration,
    #[cfg(feature = "http-client")]
    client: reqwest::Client,
}

impl<R: RetryStrategy> DeliveryEngine<R> {
    /// Creates an engine with the default 30 s delivery and 10 s test
    /// timeouts.
    pub fn new(retry: R) -> Self {
        Self::with_timeouts(retry, Duration::from_secs(30), Duration::from_secs(10))
    }

    /// Creates an engine with explicit timeouts.
    pub fn with_timeouts(retry: R, delivery_timeout: Duration, test_timeout: Duration) -> Self {
        Self {
            retry,
            delivery_timeout,
            test_timeout,
            #[cfg(feature = "http-client")]
            client: reqwest::Client::new(),
        }
    }

    /// Gets the retry strategy.
    pub fn retry_strategy(&self) -> &R {
        &self.retry
    }

    /// Performs one delivery attempt, updating the record in place.
    ///
    /// Transport errors and non-2xx responses both land in the failed
    /// state; the only trace of the difference is an absent response code.
    #[cfg(feature = "http-client")]
    pub async fn attempt(&self, delivery: &mut WebhookDelivery, webhook: &Webhook) {
        let start = std::time::Instant::now();
        let body = delivery.body().to_string();
        let signature = WebhookSigner::new(&webhook.secret).sign(body.as_bytes());

        let response = self
            .client
            .post(&webhook.url)
            .header("Content-Type", "application/json")
            .header("X-TrackVerse-Signature", signature)
            .header("X-TrackVerse-Event", delivery.event.as_str())
            .header("X-TrackVerse-Delivery", &delivery.id)
            .timeout(self.delivery_timeout)
            .body(body)
            .send()
            .await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match response {
            Ok(resp) => {
                let code = resp.status().as_u16();
                let body = resp.text().await.ok();

                if (200..300).contains(&code) {
                    delivery.record_success(code, body, duration_ms);
                } else {
                    let retry_in = self.retry.next_delay(delivery.attempts + 1);
                    delivery.record_failure(Some(code), body, duration_ms, retry_in);
                }
            }
            Err(err) => {
                let retry_in = self.retry.next_delay(delivery.attempts + 1);
                delivery.record_failure(None, None, duration_ms, retry_in);
                tracing::debug!(delivery = %delivery.id, error = %err, "webhook request failed");
            }
        }

        tracing::debug!(
            delivery = %delivery.id,
            webhook = %webhook.id,
            status = ?delivery.status,
            code = ?delivery.response_code,
            attempt = delivery.attempts,
            duration_ms,
            "delivery attempt finished"
        );
    }

    /// Sends a synthetic `test` event to validate a subscriber URL,
    /// independent of the delivery path. Nothing is recorded.
    #[cfg(feature = "http-client")]
    pub async fn ping(&self, webhook: &Webhook) -> WebhookTestResult {
        let body = serde_json::json!({
            "id": uuid::Uuid::new_v4().to_string(),
            "event": "test",
            "data": { "message": "TrackVerse webhook test" },
            "createdAt": Utc::now().to_rfc3339(),
        })
        .to_string();
        let signature = WebhookSigner::new(&webhook.secret).sign(body.as_bytes());

        let start = std::time::Instant::now();
        let response = self
            .client
            .post(&webhook.url)
            .header("Content-Type", "application/json")
            .header("X-TrackVerse-Signature", signature)
            .header("X-TrackVerse-Event", "test")
            .timeout(self.test_timeout)
            .body(body)
            .send()
            .await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match response {
            Ok(resp) => {
                let code = resp.status().as_u16();
                let success = (200..300).contains(&code);
                WebhookTestResult {
                    success,
                    status_code: Some(code),
                    duration_ms,
                    error: if success {
                        None
                    } else {
                        Some(format!("HTTP {code}"))
                    },
                }
            }
            Err(err) => WebhookTestResult {
                success: false,
                status_code: None,
                duration_ms,
                error: Some(err.to_string()),
            },
        }
    }
}
