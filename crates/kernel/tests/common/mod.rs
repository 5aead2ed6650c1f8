#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Every test builds its own [`TestApp`] over a fresh in-memory store, so
//! tests never share state and run on the default `#[tokio::test]` runtime.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, header};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use bazaar_kernel::directory::DirectoryService;
use bazaar_kernel::{AppState, Config};
use bazaar_test_utils::MemoryStore;

/// Test application wrapper using the REAL kernel routes and state.
pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryStore>,
    pub state: AppState,
}

impl TestApp {
    /// Create a test application over an empty, fully provisioned store.
    pub fn new() -> Self {
        Self::with_config(Config::offline())
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state =
            AppState::with_store(config, store.clone()).expect("Failed to initialize AppState");

        // Same routes as main.rs
        let router = Router::new()
            .merge(bazaar_kernel::routes::router())
            .layer(tower_http::trace::TraceLayer::new_for_http())
            .with_state(state.clone());

        Self {
            router,
            store,
            state,
        }
    }

    /// Directory service backed by this app's store.
    pub fn directory(&self) -> Arc<DirectoryService> {
        self.state.directory().clone()
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> Response {
        self.request(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

pub async fn response_json(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap_or_else(|_| {
        let text = String::from_utf8_lossy(&body);
        panic!("Failed to parse JSON: {text}");
    })
}

pub async fn response_text(response: Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&body).to_string()
}
