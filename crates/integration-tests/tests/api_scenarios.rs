// End-to-end API scenarios over the real router, store and broker

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{bearer, create_task_as, request, spawn_app, API_PREFIX, SECRET};
use taskbox_core::domain::Identity;
use taskbox_core::port::time_provider::mocks::FixedTimeProvider;
use taskbox_core::port::{DocumentRepository, Query};
use taskbox_core::token::{TokenCodec, Ttl};

fn tasks_path() -> String {
    format!("{API_PREFIX}/tasks/")
}

fn task_path(id: &str) -> String {
    format!("{API_PREFIX}/tasks/{id}")
}

#[tokio::test]
async fn test_scenario_a_create_task() {
    let app = spawn_app(&["u-1"]).await;

    let (status, body) = request(
        &app.router,
        Method::POST,
        &tasks_path(),
        Some(&bearer("u-1")),
        Some(json!({ "description": "buy milk" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("success"));
    assert_eq!(body["data"]["description"], json!("buy milk"));
    assert_eq!(body["data"]["state"], json!("todo"));
    assert_eq!(body["data"]["user_id"], json!("u-1"));
    assert!(body["data"]["id"].as_str().is_some());
}

#[tokio::test]
async fn test_scenario_b_foreign_task_is_unreachable() {
    let app = spawn_app(&["u-1", "u-2"]).await;
    let task = create_task_as(&app.router, &bearer("u-1"), "private").await;
    let id = task["id"].as_str().unwrap();

    let (status, body) = request(
        &app.router,
        Method::GET,
        &task_path(id),
        Some(&bearer("u-2")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], json!("AUTHORIZATION_ERROR"));

    // Mutations are rejected the same way and leave the task unchanged
    let (status, _) = request(
        &app.router,
        Method::PATCH,
        &task_path(id),
        Some(&bearer("u-2")),
        Some(json!({ "description": "hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = request(
        &app.router,
        Method::DELETE,
        &task_path(id),
        Some(&bearer("u-2")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = request(
        &app.router,
        Method::GET,
        &task_path(id),
        Some(&bearer("u-1")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["description"], json!("private"));
    assert_eq!(body["data"]["state"], json!("todo"));
}

#[tokio::test]
async fn test_scenario_c_done_task_rejects_description_edits() {
    let app = spawn_app(&["u-1"]).await;
    let token = bearer("u-1");
    let task = create_task_as(&app.router, &token, "buy milk").await;
    let id = task["id"].as_str().unwrap();

    let (status, body) = request(
        &app.router,
        Method::PATCH,
        &format!("{}/done", task_path(id)),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], json!("done"));

    let (status, body) = request(
        &app.router,
        Method::PATCH,
        &task_path(id),
        Some(&token),
        Some(json!({ "description": "too late" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], json!("CONFLICT"));

    let (_, body) = request(&app.router, Method::GET, &task_path(id), Some(&token), None).await;
    assert_eq!(body["data"]["description"], json!("buy milk"));

    // Marking done again is a no-op that still succeeds
    let (status, body) = request(
        &app.router,
        Method::PATCH,
        &format!("{}/done", task_path(id)),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], json!("done"));
}

#[tokio::test]
async fn test_scenario_d_unauthenticated_requests_never_touch_the_store() {
    let app = spawn_app(&["u-1"]).await;

    let expired = {
        let two_hours_ago = chrono_like_past_millis();
        let codec =
            TokenCodec::with_time_provider(SECRET, Arc::new(FixedTimeProvider::new(two_hours_ago)));
        let token = codec.seal(&Identity::new("u-1"), Ttl::seconds(60)).unwrap();
        format!("Bearer {token}")
    };
    let unknown_user = bearer("u-ghost");

    for token in [
        None,
        Some("Bearer"),
        Some("Basic dXNlcjpwdw=="),
        Some("Bearer not-a-token"),
        Some(expired.as_str()),
        Some(unknown_user.as_str()),
    ] {
        let (status, body) = request(
            &app.router,
            Method::POST,
            &tasks_path(),
            token,
            Some(json!({ "description": "sneaky" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "token: {token:?}");
        assert_eq!(body["error"]["code"], json!("AUTHENTICATION_ERROR"));
        // The rejection reason stays opaque
        assert_eq!(
            body["error"]["message"],
            json!("Your request could not be authenticated")
        );
    }

    // No repository write happened
    let stored = app.tasks.all(Query::new()).await.unwrap();
    assert!(stored.is_empty());
}

/// Epoch millis two hours in the past, without dragging chrono into the test
fn chrono_like_past_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_millis() as i64;
    now - 2 * 3600 * 1000
}

#[tokio::test]
async fn test_listing_is_owner_scoped_and_ordered() {
    let app = spawn_app(&["u-1", "u-2"]).await;
    let t1 = bearer("u-1");
    let t2 = bearer("u-2");

    // Millisecond timestamps are the sort key; space the creations out
    create_task_as(&app.router, &t1, "first").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    create_task_as(&app.router, &t2, "not yours").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    create_task_as(&app.router, &t1, "second").await;

    let (status, body) = request(&app.router, Method::GET, &tasks_path(), Some(&t1), None).await;
    assert_eq!(status, StatusCode::OK);

    let tasks = body["data"].as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert!(tasks.iter().all(|t| t["user_id"] == json!("u-1")));
    let descriptions: Vec<_> = tasks.iter().map(|t| t["description"].clone()).collect();
    assert_eq!(descriptions, vec![json!("first"), json!("second")]);
}

#[tokio::test]
async fn test_creation_ignores_client_supplied_owner() {
    let app = spawn_app(&["u-1"]).await;

    let (status, body) = request(
        &app.router,
        Method::POST,
        &tasks_path(),
        Some(&bearer("u-1")),
        Some(json!({ "description": "mine", "user_id": "u-attacker", "id": "forged" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user_id"], json!("u-1"));
    assert_ne!(body["data"]["id"], json!("forged"));
}

#[tokio::test]
async fn test_validation_failures_carry_a_field_map() {
    let app = spawn_app(&["u-1"]).await;
    let token = bearer("u-1");

    let (status, body) = request(
        &app.router,
        Method::POST,
        &tasks_path(),
        Some(&token),
        Some(json!({ "description": "   ", "state": "archived" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
    assert!(body["error"]["fields"]["description"].is_string());
    assert!(body["error"]["fields"]["state"].is_string());

    // Path ids are validated before the store is asked
    let (status, body) = request(
        &app.router,
        Method::GET,
        &task_path("not-a-uuid"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["fields"]["id"].is_string());
}

#[tokio::test]
async fn test_update_and_delete_round_trip() {
    let app = spawn_app(&["u-1"]).await;
    let token = bearer("u-1");
    let task = create_task_as(&app.router, &token, "draft").await;
    let id = task["id"].as_str().unwrap();

    let (status, body) = request(
        &app.router,
        Method::PATCH,
        &task_path(id),
        Some(&token),
        Some(json!({ "description": "final" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["description"], json!("final"));
    assert_eq!(body["data"]["state"], json!("todo"));

    let (status, body) = request(
        &app.router,
        Method::DELETE,
        &task_path(id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["description"], json!("final"));

    let (status, body) = request(&app.router, Method::GET, &task_path(id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn test_health_and_fallback_routes() {
    let app = spawn_app(&[]).await;

    let (status, body) = request(&app.router, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("success"));
    assert_eq!(body["data"]["message"], json!("Welcome to taskbox"));

    let (status, body) = request(&app.router, Method::GET, "/no/such/route", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], json!("error"));
    assert_eq!(body["error"]["code"], json!("NOT_FOUND"));
    assert_eq!(body["error"]["message"], json!("Not Found"));
}

#[tokio::test]
async fn test_malformed_json_body_is_a_validation_error() {
    let app = spawn_app(&["u-1"]).await;

    let (status, body) = request(
        &app.router,
        Method::POST,
        &tasks_path(),
        Some(&bearer("u-1")),
        // A JSON string is not the object the route expects
        Some(json!("not an object")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
    assert!(body["error"]["fields"]["body"].is_string());
}
