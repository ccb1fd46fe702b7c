// Taskbox Infrastructure - Queue Adapter
// Implements: EventBus over an in-process broker with durable-queue semantics

mod event_bus;

pub use event_bus::{MemoryEventBus, MAX_REDELIVERIES};
