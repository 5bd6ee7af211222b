//! Delivery store seam.
//!
//! Delivery records live behind this trait so the in-memory default can be
//! swapped for an external store without touching the delivery path. The
//! in-memory store keeps records for the process lifetime; a restart loses
//! pending and failed state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::delivery::{DeliveryStatus, WebhookDelivery};
use crate::error::WebhookResult;

/// Where delivery records live between attempts.
#[async_trait]
pub trait DeliveryStore: Send + Sync {
    /// Saves a new delivery record.
    async fn save(&self, delivery: &WebhookDelivery) -> WebhookResult<()>;

    /// Gets a delivery by id.
    async fn get(&self, id: &str) -> WebhookResult<Option<WebhookDelivery>>;

    /// Writes back a mutated delivery record.
    async fn update(&self, delivery: &WebhookDelivery) -> WebhookResult<()>;

    /// Failed deliveries whose retry time has come.
    async fn due_retries(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> WebhookResult<Vec<WebhookDelivery>>;

    /// Recent deliveries for one webhook, newest first.
    async fn for_webhook(
        &self,
        webhook_id: &str,
        limit: usize,
    ) -> WebhookResult<Vec<WebhookDelivery>>;

    /// Number of stored deliveries.
    async fn len(&self) -> WebhookResult<usize>;

    /// Checks if the store is empty.
    async fn is_empty(&self) -> WebhookResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Drops every stored delivery.
    async fn clear(&self) -> WebhookResult<()>;
}

/// In-memory delivery store.
pub struct InMemoryDeliveryStore {
    deliveries: RwLock<HashMap<String, WebhookDelivery>>,
}

impl InMemoryDeliveryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            deliveries: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a shared store.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for InMemoryDeliveryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryStore for InMemoryDeliveryStore {
    async fn save(&self, delivery: &WebhookDelivery) -> WebhookResult<()> {
        let mut deliveries = self.deliveries.write().await;
        deliveries.insert(delivery.id.clone(), delivery.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> WebhookResult<Option<WebhookDelivery>> {
        let deliveries = self.deliveries.read().await;
        Ok(deliveries.get(id).cloned())
    }

    async fn update(&self, delivery: &WebhookDelivery) -> WebhookResult<()> {
        let mut deliveries = self.deliveries.write().await;
        deliveries.insert(delivery.id.clone(), delivery.clone());
        Ok(())
    }

    async fn due_retries(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> WebhookResult<Vec<WebhookDelivery>> {
        let deliveries = self.deliveries.read().await;
        Ok(deliveries
            .values()
            .filter(|d| {
                d.status == DeliveryStatus::Failed
                    && d.next_retry_at.map(|at| at <= now).unwrap_or(false)
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn for_webhook(
        &self,
        webhook_id: &str,
        limit: usize,
    ) -> WebhookResult<Vec<WebhookDelivery>> {
        let deliveries = self.deliveries.read().await;
        let mut matching: Vec<WebhookDelivery> = deliveries
            .values()
            .filter(|d| d.webhook_id == webhook_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn len(&self) -> WebhookResult<usize> {
        let deliveries = self.deliveries.read().await;
        Ok(deliveries.len())
    }

    async fn clear(&self) -> WebhookResult<()> {
        let mut deliveries = self.deliveries.write().await;
        deliveries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::Webhook;
    use crate::event::WebhookEvent;
    use chrono::Duration;

    fn delivery_for(webhook: &Webhook) -> WebhookDelivery {
        WebhookDelivery::new(webhook, WebhookEvent::PrSet, serde_json::json!({}))
    }

    #[tokio::test]
    async fn test_save_get_update() {
        let store = InMemoryDeliveryStore::new();
        let webhook = Webhook::new("u1", "https://example.com", "secret");
        let mut delivery = delivery_for(&webhook);

        store.save(&delivery).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 1);

        delivery.record_success(200, None, 5);
        store.update(&delivery).await.unwrap();

        let stored = store.get(&delivery.id).await.unwrap().unwrap();
        assert_eq!(stored.status, DeliveryStatus::Success);
        assert_eq!(stored.attempts, 1);
    }

    #[tokio::test]
    async fn test_due_retries_selection() {
        let store = InMemoryDeliveryStore::new();
        let webhook = Webhook::new("u1", "https://example.com", "secret");
        let now = Utc::now();

        // Due: failed with a past retry time.
        let mut due = delivery_for(&webhook);
        due.record_failure(Some(500), None, 5, Some(std::time::Duration::from_secs(0)));
        store.save(&due).await.unwrap();

        // Not due: retry time in the future.
        let mut later = delivery_for(&webhook);
        later.record_failure(Some(500), None, 5, Some(std::time::Duration::from_secs(600)));
        store.save(&later).await.unwrap();

        // Not due: terminal failure, no retry scheduled.
        let mut terminal = delivery_for(&webhook);
        terminal.record_failure(Some(500), None, 5, None);
        store.save(&terminal).await.unwrap();

        // Not due: pending, handled by the trigger path.
        store.save(&delivery_for(&webhook)).await.unwrap();

        let found = store
            .due_retries(now + Duration::seconds(1), 10)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, due.id);
    }

    #[tokio::test]
    async fn test_for_webhook_newest_first() {
        let store = InMemoryDeliveryStore::new();
        let webhook = Webhook::new("u1", "https://example.com", "secret");
        let other = Webhook::new("u2", "https://example.org", "secret");

        let mut first = delivery_for(&webhook);
        first.created_at = Utc::now() - Duration::minutes(2);
        let second = delivery_for(&webhook);

        store.save(&first).await.unwrap();
        store.save(&second).await.unwrap();
        store.save(&delivery_for(&other)).await.unwrap();

        let found = store.for_webhook(&webhook.id, 10).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, second.id);

        let capped = store.for_webhook(&webhook.id, 1).await.unwrap();
        assert_eq!(capped.len(), 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let store = InMemoryDeliveryStore::new();
        let webhook = Webhook::new("u1", "https://example.com", "secret");
        store.save(&delivery_for(&webhook)).await.unwrap();

        store.clear().await.unwrap();
        assert!(store.is_empty().await.unwrap());
    }
}
