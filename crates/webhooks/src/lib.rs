//! # TrackVerse Webhooks
//!
//! Webhook fan-out for TrackVerse providing:
//! - Subscription management per user and event
//! - Signed HTTP delivery with HMAC-SHA256
//! - Bounded exponential backoff with a polling retry driver
//! - Pluggable delivery stores
//!
//! ## Example
//!
//! ```rust,ignore
//! use trackverse_webhooks::{DomainEvent, PrPayload, Webhook, WebhookEvent, WebhookSystem};
//!
//! let system = WebhookSystem::new();
//!
//! // Register a subscription
//! let webhook = Webhook::new("user-1", "https://example.com/hooks", "whsec_...")
//!     .events([WebhookEvent::PrSet]);
//! system.register(webhook).await;
//! system.spawn_worker();
//!
//! // Fan out an event; the call does not wait for deliveries
//! let event = DomainEvent::PrSet(PrPayload::new(
//!     "user-1", "100m", 10.15, Some(10.32), "2026-01-04", None,
//! ));
//! let queued = system.trigger(&event).await;
//! ```
//!
//! Delivery state is in-memory by default and is lost on restart; the
//! [`DeliveryStore`] trait is the seam for swapping in a durable backend.

mod delivery;
mod endpoint;
mod error;
mod event;
mod retry;
mod signature;
mod store;
mod system;

pub use delivery::{DeliveryEngine, DeliveryStatus, WebhookDelivery, WebhookTestResult};
pub use endpoint::{Webhook, WebhookStatus};
pub use error::{WebhookError, WebhookResult};
pub use event::{
    DomainEvent, PrDetails, PrPayload, RankingDetails, RankingPayload, ResultDetails,
    ResultPayload, WebhookEvent, WorkoutDetails, WorkoutPayload,
};
pub use retry::{ExponentialBackoff, RetryStrategy};
pub use signature::WebhookSigner;
pub use store::{DeliveryStore, InMemoryDeliveryStore};
pub use system::{WebhookConfig, WebhookSystem};
