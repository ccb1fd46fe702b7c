//! Background Event Consumers

use std::sync::Arc;

use async_trait::async_trait;
use taskbox_core::error::Result;
use taskbox_core::port::{Delivery, EventBus, EventHandler};
use tracing::info;

/// Consumes task lifecycle events and writes them to the audit log stream.
pub struct TaskEventLogger {
    bus: Arc<dyn EventBus>,
}

impl TaskEventLogger {
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl EventHandler for TaskEventLogger {
    async fn handle(&self, delivery: Delivery) -> Result<()> {
        let event = delivery.payload["event"].as_str().unwrap_or("unknown");
        let task_id = delivery.payload["task"]["id"].as_str().unwrap_or("-");
        info!(
            target: "audit",
            queue = %delivery.queue,
            event = %event,
            task_id = %task_id,
            "task event received"
        );
        self.bus.acknowledge(&delivery).await
    }
}
