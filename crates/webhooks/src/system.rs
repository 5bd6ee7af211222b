//! Webhook system - registration, fan-out, and the retry driver.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::delivery::DeliveryEngine;
use crate::endpoint::Webhook;
use crate::retry::{ExponentialBackoff, RetryStrategy};
use crate::store::{DeliveryStore, InMemoryDeliveryStore};

#[cfg(feature = "http-client")]
use crate::delivery::{DeliveryStatus, WebhookDelivery, WebhookTestResult};
#[cfg(feature = "http-client")]
use crate::error::{WebhookError, WebhookResult};
#[cfg(feature = "http-client")]
use crate::event::DomainEvent;

/// Deliveries re-attempted per retry sweep.
#[cfg(feature = "http-client")]
const RETRY_BATCH: usize = 50;

/// Webhook system configuration.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Total attempt budget per delivery.
    pub max_attempts: u32,
    /// Delivery request timeout in milliseconds.
    pub delivery_timeout_ms: u64,
    /// Test ping timeout in milliseconds.
    pub test_timeout_ms: u64,
    /// Retry sweep interval in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delivery_timeout_ms: 30_000,
            test_timeout_ms: 10_000,
            poll_interval_ms: 1000,
        }
    }
}

impl WebhookConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the attempt budget.
    pub fn max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    /// Sets the delivery timeout.
    pub fn delivery_timeout_ms(mut self, ms: u64) -> Self {
        self.delivery_timeout_ms = ms;
        self
    }

    /// Sets the test ping timeout.
    pub fn test_timeout_ms(mut self, ms: u64) -> Self {
        self.test_timeout_ms = ms;
        self
    }

    /// Sets the retry sweep interval.
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }
}

/// The main webhook system.
///
/// Fans domain events out to matching subscriptions, fires deliveries
/// without blocking the triggering call, and drives the retry schedule.
/// Shared state lives behind `Arc` so spawned delivery tasks outlive the
/// triggering call.
pub struct WebhookSystem<S: DeliveryStore = InMemoryDeliveryStore, R: RetryStrategy = ExponentialBackoff>
{
    config: WebhookConfig,
    webhooks: Arc<RwLock<Vec<Webhook>>>,
    store: Arc<S>,
    engine: Arc<DeliveryEngine<R>>,
}

impl WebhookSystem<InMemoryDeliveryStore, ExponentialBackoff> {
    /// Creates a system with the in-memory store and default backoff.
    pub fn new() -> Self {
        Self::with_config(WebhookConfig::default())
    }

    /// Creates a system with custom configuration.
    pub fn with_config(config: WebhookConfig) -> Self {
        let retry = ExponentialBackoff::new().max_attempts(config.max_attempts);
        Self::with_store_and_retry(config, InMemoryDeliveryStore::new(), retry)
    }
}

impl Default for WebhookSystem<InMemoryDeliveryStore, ExponentialBackoff> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: DeliveryStore + 'static, R: RetryStrategy + 'static> WebhookSystem<S, R> {
    /// Creates a system with a custom store and retry strategy.
    pub fn with_store_and_retry(config: WebhookConfig, store: S, retry: R) -> Self {
        let engine = DeliveryEngine::with_timeouts(
            retry,
            std::time::Duration::from_millis(config.delivery_timeout_ms),
            std::time::Duration::from_millis(config.test_timeout_ms),
        );

        Self {
            config,
            webhooks: Arc::new(RwLock::new(Vec::new())),
            store: Arc::new(store),
            engine: Arc::new(engine),
        }
    }

    /// Registers a webhook.
    pub async fn register(&self, webhook: Webhook) {
        let mut webhooks = self.webhooks.write().await;
        webhooks.push(webhook);
    }

    /// Unregisters a webhook by id.
    pub async fn unregister(&self, id: &str) -> Option<Webhook> {
        let mut webhooks = self.webhooks.write().await;
        let idx = webhooks.iter().position(|w| w.id == id)?;
        Some(webhooks.remove(idx))
    }

    /// Gets a webhook by id.
    pub async fn get(&self, id: &str) -> Option<Webhook> {
        let webhooks = self.webhooks.read().await;
        webhooks.iter().find(|w| w.id == id).cloned()
    }

    /// Gets all registered webhooks.
    pub async fn webhooks(&self) -> Vec<Webhook> {
        let webhooks = self.webhooks.read().await;
        webhooks.clone()
    }

    /// Gets the delivery store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Gets the delivery engine.
    pub fn engine(&self) -> &DeliveryEngine<R> {
        &self.engine
    }

    /// Gets the configuration.
    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    /// Fans an event out to every active, subscribed webhook.
    ///
    /// Each match is queued as a pending delivery and processed on its own
    /// task; the call returns the number queued without waiting for any
    /// delivery to finish. Processing errors are logged, never propagated.
    #[cfg(feature = "http-client")]
    pub async fn trigger(&self, event: &DomainEvent) -> usize {
        let kind = event.kind();
        let data = event.data();

        let matching: Vec<Webhook> = {
            let webhooks = self.webhooks.read().await;
            webhooks
                .iter()
                .filter(|w| w.should_receive(kind))
                .cloned()
                .collect()
        };

        let mut queued = 0;
        for webhook in matching {
            let delivery = WebhookDelivery::new(&webhook, kind, data.clone());
            if let Err(err) = self.store.save(&delivery).await {
                tracing::error!(webhook = %webhook.id, error = %err, "failed to queue webhook delivery");
                continue;
            }
            queued += 1;

            let engine = Arc::clone(&self.engine);
            let store = Arc::clone(&self.store);
            let registry = Arc::clone(&self.webhooks);
            tokio::spawn(async move {
                if let Err(err) = Self::process(&engine, &store, &registry, delivery, &webhook).await
                {
                    tracing::error!(webhook = %webhook.id, error = %err, "webhook delivery processing failed");
                }
            });
        }

        queued
    }

    /// Re-attempts every failed delivery whose retry time has come.
    ///
    /// One pass; callers poll it, or spawn [`Self::spawn_worker`] to do so.
    /// Returns the number of deliveries attempted.
    #[cfg(feature = "http-client")]
    pub async fn run_due_retries(&self) -> WebhookResult<usize> {
        Self::sweep_due_retries(&self.engine, &self.store, &self.webhooks).await
    }

    /// Spawns the retry driver: a single task sweeping due retries every
    /// poll interval. One sweeper keeps attempts on a delivery sequential.
    #[cfg(feature = "http-client")]
    pub fn spawn_worker(&self) -> tokio::task::JoinHandle<()> {
        let engine = Arc::clone(&self.engine);
        let store = Arc::clone(&self.store);
        let registry = Arc::clone(&self.webhooks);
        let poll_interval = std::time::Duration::from_millis(self.config.poll_interval_ms);

        tokio::spawn(async move {
            let mut tick = tokio::time::interval(poll_interval);
            loop {
                tick.tick().await;
                if let Err(err) = Self::sweep_due_retries(&engine, &store, &registry).await {
                    tracing::error!(error = %err, "retry sweep failed");
                }
            }
        })
    }

    /// Sends a synthetic test event to a registered webhook's URL.
    #[cfg(feature = "http-client")]
    pub async fn test_endpoint(&self, webhook_id: &str) -> WebhookResult<WebhookTestResult> {
        let webhook = self
            .get(webhook_id)
            .await
            .ok_or_else(|| WebhookError::WebhookNotFound(webhook_id.to_string()))?;
        Ok(self.engine.ping(&webhook).await)
    }

    /// One pass over the failed deliveries whose retry time has come.
    #[cfg(feature = "http-client")]
    async fn sweep_due_retries(
        engine: &Arc<DeliveryEngine<R>>,
        store: &Arc<S>,
        registry: &Arc<RwLock<Vec<Webhook>>>,
    ) -> WebhookResult<usize> {
        let due = store.due_retries(chrono::Utc::now(), RETRY_BATCH).await?;

        let mut attempted = 0;
        for delivery in due {
            let webhook = {
                let webhooks = registry.read().await;
                webhooks.iter().find(|w| w.id == delivery.webhook_id).cloned()
            };
            let Some(webhook) = webhook else {
                tracing::warn!(delivery = %delivery.id, "dropping retry for unregistered webhook");
                continue;
            };
            Self::process(engine, store, registry, delivery, &webhook).await?;
            attempted += 1;
        }

        Ok(attempted)
    }

    /// Performs one attempt and writes back the delivery and webhook
    /// bookkeeping.
    #[cfg(feature = "http-client")]
    async fn process(
        engine: &DeliveryEngine<R>,
        store: &S,
        registry: &RwLock<Vec<Webhook>>,
        mut delivery: WebhookDelivery,
        webhook: &Webhook,
    ) -> WebhookResult<()> {
        engine.attempt(&mut delivery, webhook).await;
        store.update(&delivery).await?;
        Self::note_attempt(registry, &delivery).await;
        Ok(())
    }

    /// Updates the owning webhook after an attempt.
    #[cfg(feature = "http-client")]
    async fn note_attempt(registry: &RwLock<Vec<Webhook>>, delivery: &WebhookDelivery) {
        let success = delivery.status == DeliveryStatus::Success;
        let terminal_failure = !success && delivery.is_terminal();

        let mut webhooks = registry.write().await;
        if let Some(webhook) = webhooks.iter_mut().find(|w| w.id == delivery.webhook_id) {
            webhook.record_delivery(delivery.response_code, success);
            if terminal_failure {
                webhook.mark_failed();
                tracing::warn!(
                    webhook = %webhook.id,
                    delivery = %delivery.id,
                    "webhook disabled after exhausting delivery attempts"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::WebhookEvent;

    #[tokio::test]
    async fn test_register_and_get() {
        let system = WebhookSystem::new();

        let webhook = Webhook::new("u1", "https://example.com/hook", "secret")
            .events([WebhookEvent::PrSet]);
        let id = webhook.id.clone();
        system.register(webhook).await;

        assert_eq!(system.webhooks().await.len(), 1);
        assert!(system.get(&id).await.is_some());
        assert!(system.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_unregister() {
        let system = WebhookSystem::new();

        let webhook = Webhook::new("u1", "https://example.com/hook", "secret");
        let id = webhook.id.clone();
        system.register(webhook).await;

        let removed = system.unregister(&id).await;
        assert!(removed.is_some());
        assert!(system.webhooks().await.is_empty());
        assert!(system.unregister(&id).await.is_none());
    }

    #[cfg(feature = "http-client")]
    #[tokio::test]
    async fn test_test_endpoint_unknown_id() {
        let system = WebhookSystem::new();
        let result = system.test_endpoint("missing").await;
        assert!(matches!(result, Err(WebhookError::WebhookNotFound(_))));
    }
}
