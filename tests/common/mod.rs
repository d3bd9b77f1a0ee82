// SPDX-License-Identifier: MIT

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use pantry_planner::config::Config;
use pantry_planner::db::Database;
use pantry_planner::middleware::auth::create_jwt;
use pantry_planner::models::{Grocery, Unit, User};
use pantry_planner::routes::create_router;
use pantry_planner::services::ImageStore;
use pantry_planner::AppState;

/// Create a test app backed by a fresh in-memory store.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = Database::new();
    let images = ImageStore::new(&config.image_dir);

    let state = Arc::new(AppState { config, db, images });
    (create_router(state.clone()), state)
}

/// Insert a user directly and mint a session token for them.
///
/// The stored password hash is a placeholder; these users authenticate via
/// JWT only. Registration and login flows have their own tests.
#[allow(dead_code)]
pub async fn seed_user(state: &Arc<AppState>, username: &str, permission_level: u8) -> (Uuid, String) {
    let mut user = User::new(username, "seeded-hash-not-verifiable");
    user.permission_level = permission_level;
    let id = user.id;

    let mut tx = state.db.begin_transaction().await;
    tx.insert_user(user).expect("seed user");
    tx.commit();

    let token = create_jwt(id, &state.config.jwt_signing_key).expect("mint test JWT");
    (id, token)
}

/// Insert a grocery directly, bypassing the multipart upload route.
#[allow(dead_code)]
pub async fn seed_grocery(
    state: &Arc<AppState>,
    name: &str,
    kcal_per_unit: f64,
    creator: Uuid,
) -> Uuid {
    let grocery = Grocery::new(name, Unit::Grams, kcal_per_unit, "seed.png", creator);
    let id = grocery.id;

    let mut tx = state.db.begin_transaction().await;
    tx.insert_grocery(grocery).expect("seed grocery");
    tx.commit();
    id
}

/// Fire a JSON request at the app; `token` adds a Bearer header.
#[allow(dead_code)]
pub async fn request(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert status and return the parsed body.
#[allow(dead_code)]
pub async fn expect_json(response: Response, status: StatusCode) -> serde_json::Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}
