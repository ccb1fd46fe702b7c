// Memory Event Bus
//
// A process-local broker connection with the semantics the service relies on:
// idempotent init, durable queue assertion, persistent publish, prefetch-
// bounded consumption, explicit ack/reject with requeue, and bounded
// redelivery into a dead-letter queue.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use taskbox_core::error::{AppError, Result};
use taskbox_core::port::event_bus::DeliveryTag;
use taskbox_core::port::{Delivery, EventBus, EventHandler, PublishOptions, SubscribeOptions};
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Redeliveries a message gets before it is routed to the dead-letter queue
/// instead of being requeued again
pub const MAX_REDELIVERIES: u32 = 5;

const DEAD_SUFFIX: &str = ".dead";

struct StoredMessage {
    payload: Value,
    redelivered: u32,
    persistent: bool,
}

struct QueueState {
    messages: VecDeque<StoredMessage>,
    notify: Arc<Notify>,
}

impl Default for QueueState {
    fn default() -> Self {
        Self {
            messages: VecDeque::new(),
            notify: Arc::new(Notify::new()),
        }
    }
}

struct Unacked {
    queue: String,
    payload: Value,
    redelivered: u32,
    // Held until the delivery is settled; dropping it frees a prefetch slot
    _permit: OwnedSemaphorePermit,
}

/// Live broker connection state. Dropped wholesale on `close`.
struct Connection {
    queues: Mutex<HashMap<String, QueueState>>,
    unacked: Mutex<HashMap<DeliveryTag, Unacked>>,
    next_tag: AtomicU64,
    consumers: Mutex<Vec<JoinHandle<()>>>,
}

impl Connection {
    fn new() -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
            unacked: Mutex::new(HashMap::new()),
            next_tag: AtomicU64::new(1),
            consumers: Mutex::new(Vec::new()),
        }
    }

    /// Durable-queue assertion: creating an existing queue is a no-op.
    fn assert_queue(&self, name: &str) -> Arc<Notify> {
        let mut queues = self.queues.lock().expect("lock poisoned");
        queues.entry(name.to_string()).or_default().notify.clone()
    }

    fn push(&self, name: &str, message: StoredMessage) {
        debug!(
            queue = %name,
            persistent = message.persistent,
            redelivered = message.redelivered,
            "message enqueued"
        );
        let notify = {
            let mut queues = self.queues.lock().expect("lock poisoned");
            let state = queues.entry(name.to_string()).or_default();
            state.messages.push_back(message);
            state.notify.clone()
        };
        notify.notify_one();
    }

    fn pop(&self, name: &str) -> Option<StoredMessage> {
        let mut queues = self.queues.lock().expect("lock poisoned");
        queues.get_mut(name)?.messages.pop_front()
    }

    /// Remove a delivery from the unacked set, releasing its prefetch slot.
    fn settle(&self, tag: DeliveryTag) -> bool {
        self.unacked
            .lock()
            .expect("lock poisoned")
            .remove(&tag)
            .is_some()
    }

    fn reject_tag(&self, tag: DeliveryTag, requeue: bool) {
        let Some(entry) = self.unacked.lock().expect("lock poisoned").remove(&tag) else {
            debug!(tag, "reject for unknown delivery tag ignored");
            return;
        };

        if requeue && entry.redelivered < MAX_REDELIVERIES {
            self.push(
                &entry.queue,
                StoredMessage {
                    payload: entry.payload,
                    redelivered: entry.redelivered + 1,
                    persistent: true,
                },
            );
        } else {
            let dead_queue = format!("{}{}", entry.queue, DEAD_SUFFIX);
            warn!(
                queue = %entry.queue,
                dead_queue = %dead_queue,
                redelivered = entry.redelivered,
                "routing message to dead-letter queue"
            );
            self.push(
                &dead_queue,
                StoredMessage {
                    payload: entry.payload,
                    redelivered: 0,
                    persistent: true,
                },
            );
        }
    }
}

pub struct MemoryEventBus {
    connection: Mutex<Option<Arc<Connection>>>,
}

impl MemoryEventBus {
    pub fn new() -> Self {
        Self {
            connection: Mutex::new(None),
        }
    }

    fn connection(&self) -> Result<Arc<Connection>> {
        self.connection
            .lock()
            .expect("lock poisoned")
            .clone()
            .ok_or_else(|| AppError::Internal("You need to initialize the event bus".to_string()))
    }
}

impl Default for MemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for MemoryEventBus {
    async fn init(&self, url: &str) -> Result<bool> {
        let mut connection = self.connection.lock().expect("lock poisoned");
        if connection.is_some() {
            // Guard against carelessly opening a second connection
            return Ok(true);
        }
        info!(url = %url, "event bus connected");
        *connection = Some(Arc::new(Connection::new()));
        Ok(true)
    }

    async fn publish(&self, queue: &str, payload: Value, options: PublishOptions) -> Result<bool> {
        let connection = self.connection()?;
        connection.assert_queue(queue);

        let persistent = options.persistent.unwrap_or(true);
        connection.push(
            queue,
            StoredMessage {
                payload,
                redelivered: 0,
                persistent,
            },
        );
        Ok(true)
    }

    async fn subscribe(
        &self,
        queue: &str,
        handler: Arc<dyn EventHandler>,
        limit: usize,
        options: SubscribeOptions,
    ) -> Result<()> {
        let connection = self.connection()?;
        let notify = connection.assert_queue(queue);
        let semaphore = Arc::new(Semaphore::new(limit.max(1)));
        let queue = queue.to_string();
        let auto_ack = options.auto_ack;

        let consumer_connection = Arc::clone(&connection);
        let consumer = tokio::spawn(async move {
            loop {
                // A permit = one in-flight unacknowledged delivery
                let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                    break;
                };

                let message = loop {
                    match consumer_connection.pop(&queue) {
                        Some(message) => break message,
                        None => notify.notified().await,
                    }
                };

                let tag = consumer_connection.next_tag.fetch_add(1, Ordering::SeqCst);
                let delivery = Delivery {
                    queue: queue.clone(),
                    tag,
                    redelivered: message.redelivered,
                    payload: message.payload.clone(),
                };
                consumer_connection
                    .unacked
                    .lock()
                    .expect("lock poisoned")
                    .insert(
                        tag,
                        Unacked {
                            queue: queue.clone(),
                            payload: message.payload,
                            redelivered: message.redelivered,
                            _permit: permit,
                        },
                    );

                let handler = Arc::clone(&handler);
                let settle_connection = Arc::clone(&consumer_connection);
                tokio::spawn(async move {
                    // Spawn once more so a panicking handler cannot take the
                    // consumer down; the JoinHandle reports the panic instead.
                    let handler_delivery = delivery.clone();
                    let outcome =
                        tokio::spawn(async move { handler.handle(handler_delivery).await }).await;

                    match outcome {
                        Ok(Ok(())) => {
                            if auto_ack {
                                settle_connection.settle(tag);
                            }
                        }
                        Ok(Err(err)) => {
                            warn!(
                                queue = %delivery.queue,
                                tag,
                                error = %err,
                                "handler failed, rejecting delivery for requeue"
                            );
                            settle_connection.reject_tag(tag, true);
                        }
                        Err(join_err) => {
                            error!(
                                queue = %delivery.queue,
                                tag,
                                error = ?join_err,
                                "handler panicked, rejecting delivery for requeue"
                            );
                            settle_connection.reject_tag(tag, true);
                        }
                    }
                });
            }
        });

        connection
            .consumers
            .lock()
            .expect("lock poisoned")
            .push(consumer);
        Ok(())
    }

    async fn acknowledge(&self, delivery: &Delivery) -> Result<()> {
        let connection = self.connection()?;
        if !connection.settle(delivery.tag) {
            debug!(tag = delivery.tag, "acknowledge for unknown delivery tag ignored");
        }
        Ok(())
    }

    async fn reject(&self, delivery: &Delivery, requeue: bool) -> Result<()> {
        let connection = self.connection()?;
        connection.reject_tag(delivery.tag, requeue);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let connection = self
            .connection
            .lock()
            .expect("lock poisoned")
            .take()
            .ok_or_else(|| {
                AppError::Internal("You need to initialize the event bus".to_string())
            })?;

        for consumer in connection
            .consumers
            .lock()
            .expect("lock poisoned")
            .drain(..)
        {
            consumer.abort();
        }
        info!("event bus closed");
        Ok(())
    }
}
