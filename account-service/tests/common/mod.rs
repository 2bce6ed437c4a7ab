//! Common test utilities for account-service integration tests.
#![allow(dead_code)]

use account_service::config::AccountConfig;
use account_service::services::{AccountRepository, InMemoryAccountRepository};
use account_service::startup::{build_router, AppState, Application};
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,account_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Router over a fresh in-memory store.
pub fn test_router() -> Router {
    init_tracing();
    let repository: Arc<dyn AccountRepository> = Arc::new(InMemoryAccountRepository::new());
    build_router(AppState::new(AccountConfig::in_memory(0), repository))
}

/// A valid account payload; `seed` keeps payloads distinct.
pub fn account_payload(seed: usize) -> Value {
    json!({
        "name": format!("Customer {}", seed),
        "email": format!("customer{}@example.com", seed),
        "address": format!("{} Market Street, Springfield", seed),
        "phone_number": format!("555-01{:02}", seed),
        "date_joined": "2024-02-29",
    })
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("Response body is not JSON")
}

/// A running server bound to an ephemeral port.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub repository: Arc<dyn AccountRepository>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        init_tracing();

        let app = Application::build(AccountConfig::in_memory(0))
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let repository = app.repository();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            repository,
        }
    }
}
