// Shared harness: the real router over an in-memory store and broker

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use taskbox_api_http::{create_router, AppState};
use taskbox_core::application::{Authenticator, TaskService};
use taskbox_core::domain::{Identity, Task};
use taskbox_core::port::id_provider::UuidProvider;
use taskbox_core::port::time_provider::SystemTimeProvider;
use taskbox_core::port::user_directory::mocks::StaticUserDirectory;
use taskbox_core::port::{DocumentRepository, EventBus};
use taskbox_core::token::{TokenCodec, Ttl};
use taskbox_infra_queue::MemoryEventBus;
use taskbox_infra_sqlite::{
    create_pool, run_migrations, SqliteDocumentRepository, SqliteStoreHealth,
};

pub const SECRET: &str = "integration-test-secret";
pub const API_PREFIX: &str = "/api/v1";

pub struct TestApp {
    pub router: Router,
    pub bus: Arc<MemoryEventBus>,
    pub tasks: Arc<dyn DocumentRepository<Task>>,
}

/// Boot the whole stack the way the server binary wires it, with the listed
/// user ids known to the directory.
pub async fn spawn_app(known_users: &[&str]) -> TestApp {
    let pool = create_pool("sqlite::memory:", false).await.expect("pool");
    run_migrations(&pool).await.expect("migrations");

    let bus = Arc::new(MemoryEventBus::new());
    bus.init("memory://integration").await.expect("bus init");

    let tasks: Arc<dyn DocumentRepository<Task>> = Arc::new(SqliteDocumentRepository::new(
        pool.clone(),
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
    ));

    let users = Arc::new(StaticUserDirectory::with_users(known_users.iter().copied()));
    let authenticator = Arc::new(Authenticator::new(TokenCodec::new(SECRET), users));
    let service = Arc::new(TaskService::new(tasks.clone(), bus.clone()));
    let store_health = Arc::new(SqliteStoreHealth::new(pool));

    let state = AppState::new(service, authenticator, store_health, "taskbox");
    TestApp {
        router: create_router(state, API_PREFIX),
        bus,
        tasks,
    }
}

pub fn bearer(user_id: &str) -> String {
    let token = TokenCodec::new(SECRET)
        .seal(&Identity::new(user_id), Ttl::seconds(3600))
        .expect("seal");
    format!("Bearer {token}")
}

/// Send one request through the router and decode the JSON response.
pub async fn request(
    router: &Router,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
}

pub async fn create_task_as(router: &Router, token: &str, description: &str) -> Value {
    let (status, body) = request(
        router,
        Method::POST,
        &format!("{API_PREFIX}/tasks/"),
        Some(token),
        Some(serde_json::json!({ "description": description })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create failed: {body}");
    body["data"].clone()
}
