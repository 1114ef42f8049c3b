// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use fitboost::config::Config;
use fitboost::db::{FirestoreDb, MemoryDb, Store};
use fitboost::middleware::auth::create_jwt;
use fitboost::routes::create_router;
use fitboost::services::accounts::SignupRequest;
use fitboost::services::Catalog;
use fitboost::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Test app over an in-memory store.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub db: Arc<MemoryDb>,
}

/// Create a test app backed by an empty in-memory store.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    let db = Arc::new(MemoryDb::new());
    let store: Arc<dyn Store> = db.clone();
    let state = Arc::new(AppState::new(Config::test_default(), store));

    TestApp {
        router: create_router(state.clone()),
        state,
        db,
    }
}

/// Create a test app with the bundled catalog loaded.
#[allow(dead_code)]
pub async fn create_seeded_app() -> TestApp {
    let app = create_test_app();
    let catalog = Catalog::load_from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/data/catalog.json"))
        .expect("Failed to load catalog");
    catalog.seed(app.db.as_ref()).await.expect("Failed to seed");
    app
}

/// Sign up a user directly through the service; returns (user_id, token).
#[allow(dead_code)]
pub async fn sign_up(state: &AppState, email: &str, name: &str) -> (String, String) {
    let profile = state
        .accounts
        .signup(SignupRequest {
            email: email.to_string(),
            password: "hunter22".to_string(),
            name: name.to_string(),
        })
        .await
        .expect("signup failed");
    let token = create_jwt(&profile.id, &state.config.jwt_signing_key).unwrap();
    (profile.id, token)
}

/// Build a request with a bearer token and optional JSON body.
#[allow(dead_code)]
pub fn authed_request(
    method: &str,
    uri: &str,
    token: &str,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Collect a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
