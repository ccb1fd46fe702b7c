// Event Bus Port (publish/consume over a durable message queue)

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Default number of unacknowledged deliveries a consumer may hold at once
pub const DEFAULT_PREFETCH: usize = 5;

/// Broker-assigned tag identifying one delivery of a message
pub type DeliveryTag = u64;

/// A message handed to a subscriber. Must be settled via
/// [`EventBus::acknowledge`] or [`EventBus::reject`] unless the subscription
/// was opened with `auto_ack`.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub queue: String,
    pub tag: DeliveryTag,
    /// How many times this message was redelivered after a requeue
    pub redelivered: u32,
    pub payload: Value,
}

#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Persistent delivery; `None` means the default (persistent)
    pub persistent: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct SubscribeOptions {
    /// Settle deliveries automatically once the handler returns `Ok`
    pub auto_ack: bool,
}

/// Callback invoked for each delivery on a subscribed queue.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, delivery: Delivery) -> Result<()>;
}

/// Connection to a durable message queue.
///
/// `init` is idempotent (a second call on a live connection is a no-op) and
/// every other operation fails with an uninitialized-bus error after `close`.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Establish the connection. Returns `Ok(true)` whether freshly connected
    /// or already connected.
    async fn init(&self, url: &str) -> Result<bool>;

    /// Ensure the durable queue exists (idempotent), serialize `payload` and
    /// send it. Persistent by default.
    async fn publish(&self, queue: &str, payload: Value, options: PublishOptions) -> Result<bool>;

    /// Ensure the queue exists and start delivering messages to `handler`,
    /// holding at most `limit` unacknowledged deliveries in flight. A handler
    /// error results in an explicit reject-and-requeue; no delivery is
    /// dropped silently.
    async fn subscribe(
        &self,
        queue: &str,
        handler: Arc<dyn EventHandler>,
        limit: usize,
        options: SubscribeOptions,
    ) -> Result<()>;

    /// Mark a delivery as processed.
    async fn acknowledge(&self, delivery: &Delivery) -> Result<()>;

    /// Mark a delivery as failed; with `requeue` it is returned to the queue
    /// for redelivery.
    async fn reject(&self, delivery: &Delivery, requeue: bool) -> Result<()>;

    /// Release the connection. Later operations fail until `init` runs again.
    async fn close(&self) -> Result<()>;
}

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Event bus that records published messages and settles everything
    /// successfully. For asserting on the publish side in unit tests.
    #[derive(Default)]
    pub struct RecordingEventBus {
        published: Mutex<Vec<(String, Value)>>,
    }

    impl RecordingEventBus {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn published(&self) -> Vec<(String, Value)> {
            self.published.lock().expect("lock poisoned").clone()
        }
    }

    #[async_trait]
    impl EventBus for RecordingEventBus {
        async fn init(&self, _url: &str) -> Result<bool> {
            Ok(true)
        }

        async fn publish(
            &self,
            queue: &str,
            payload: Value,
            _options: PublishOptions,
        ) -> Result<bool> {
            self.published
                .lock()
                .expect("lock poisoned")
                .push((queue.to_string(), payload));
            Ok(true)
        }

        async fn subscribe(
            &self,
            _queue: &str,
            _handler: Arc<dyn EventHandler>,
            _limit: usize,
            _options: SubscribeOptions,
        ) -> Result<()> {
            Ok(())
        }

        async fn acknowledge(&self, _delivery: &Delivery) -> Result<()> {
            Ok(())
        }

        async fn reject(&self, _delivery: &Delivery, _requeue: bool) -> Result<()> {
            Ok(())
        }

        async fn close(&self) -> Result<()> {
            Ok(())
        }
    }
}
