//! Application State
//!
//! Long-lived handles built once at startup and injected into the router.

use std::sync::Arc;

use taskbox_core::application::{Authenticator, TaskService};
use taskbox_core::port::StoreHealth;

#[derive(Clone)]
pub struct AppState {
    pub tasks: Arc<TaskService>,
    pub authenticator: Arc<Authenticator>,
    pub store_health: Arc<dyn StoreHealth>,
    pub service_name: String,
}

impl AppState {
    pub fn new(
        tasks: Arc<TaskService>,
        authenticator: Arc<Authenticator>,
        store_health: Arc<dyn StoreHealth>,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            tasks,
            authenticator,
            store_health,
            service_name: service_name.into(),
        }
    }
}
