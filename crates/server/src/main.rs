//! Taskbox - Main Entry Point
//! Composition root: config, store, event bus, HTTP server.

mod config;
mod events;

use std::sync::Arc;

use anyhow::Result;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use taskbox_api_http::{create_router, AppState};
use taskbox_core::application::task::{TaskService, TASK_EVENTS_QUEUE};
use taskbox_core::application::Authenticator;
use taskbox_core::domain::Task;
use taskbox_core::port::event_bus::DEFAULT_PREFETCH;
use taskbox_core::port::id_provider::UuidProvider;
use taskbox_core::port::time_provider::SystemTimeProvider;
use taskbox_core::port::{DocumentRepository, EventBus, SubscribeOptions, UserDirectory};
use taskbox_core::token::TokenCodec;
use taskbox_infra_http::HttpUserDirectory;
use taskbox_infra_queue::MemoryEventBus;
use taskbox_infra_sqlite::{create_pool, run_migrations, SqliteDocumentRepository, SqliteStoreHealth};

use crate::config::Config;
use crate::events::TaskEventLogger;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging (json format for production)
    let log_format = std::env::var("TASKBOX_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("taskbox=info,tower_http=info"))
        .expect("Failed to create env filter");

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("Taskbox v{} starting...", VERSION);

    // 2. Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("configuration: {e}"))?;

    // 3. Connect the document store
    info!(database_url = %config.database_url, "Connecting document store...");
    let pool = create_pool(&config.database_url, config.production)
        .await
        .map_err(|e| anyhow::anyhow!("store connection failed: {e}"))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("migration failed: {e}"))?;
    info!("Document store connected");

    // 4. Connect the event bus (idempotent init)
    let bus: Arc<dyn EventBus> = Arc::new(MemoryEventBus::new());
    bus.init(&config.queue_url)
        .await
        .map_err(|e| anyhow::anyhow!("event bus init failed: {e}"))?;
    info!("Event bus connected");

    // 5. Wire dependencies
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);

    let tasks: Arc<dyn DocumentRepository<Task>> = Arc::new(SqliteDocumentRepository::new(
        pool.clone(),
        id_provider,
        time_provider.clone(),
    ));

    let users: Arc<dyn UserDirectory> = Arc::new(
        HttpUserDirectory::new(&config.users_url)
            .map_err(|e| anyhow::anyhow!("user directory: {e}"))?,
    );

    let codec = TokenCodec::new(&config.secret_key);
    let authenticator = Arc::new(Authenticator::new(codec, users));
    let task_service = Arc::new(TaskService::new(tasks, bus.clone()));
    let store_health = Arc::new(SqliteStoreHealth::new(pool.clone()));

    // 6. Start the background event consumer
    bus.subscribe(
        TASK_EVENTS_QUEUE,
        Arc::new(TaskEventLogger::new(bus.clone())),
        DEFAULT_PREFETCH,
        SubscribeOptions::default(),
    )
    .await
    .map_err(|e| anyhow::anyhow!("event consumer failed: {e}"))?;

    // 7. Start the HTTP server
    let state = AppState::new(
        task_service,
        authenticator,
        store_health,
        config.service_name.clone(),
    );
    let router = create_router(state, &config.api_version);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(
        service = %config.service_name,
        port = config.port,
        "{} listening",
        config.service_name
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 8. Teardown
    info!("Shutdown signal received. Exiting gracefully...");
    if let Err(e) = bus.close().await {
        tracing::warn!(error = %e, "event bus close failed");
    }
    pool.close().await;
    info!("Shutdown complete.");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
        () = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}
