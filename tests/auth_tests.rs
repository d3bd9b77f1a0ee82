// SPDX-License-Identifier: MIT

//! Registration, login, and route protection tests.

use axum::http::{header, StatusCode};
use serde_json::json;
use tower::ServiceExt;

mod common;

use common::{body_json, create_test_app, expect_json, request, seed_user};
use pantry_planner::models::PERMISSION_STANDARD;

#[tokio::test]
async fn register_then_login_sets_session_cookie() {
    let (app, _state) = create_test_app();

    let body = expect_json(
        request(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"username": "alice", "password": "correct-horse"})),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["request_status"], "success");
    assert_eq!(body["result"]["username"], "alice");
    assert!(body["result"].get("password_hash").is_none());

    let response = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "alice", "password": "correct-horse"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login should set a cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("pantry_token="));
    assert!(cookie.contains("HttpOnly"));

    // The cookie alone authenticates a protected route.
    let response = app
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .method("GET")
                .uri("/api/user")
                .header(header::COOKIE, cookie.split(';').next().unwrap())
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["result"]["username"], "alice");
}

#[tokio::test]
async fn wrong_password_and_unknown_user_answer_identically() {
    let (app, _state) = create_test_app();

    request(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"username": "bob", "password": "correct-horse"})),
    )
    .await;

    let wrong_password = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "bob", "password": "battery-staple"})),
    )
    .await;
    let unknown_user = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "nobody", "password": "battery-staple"})),
    )
    .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);

    let a = body_json(wrong_password).await;
    let b = body_json(unknown_user).await;
    assert_eq!(a, b);
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
    let (app, _state) = create_test_app();

    request(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"username": "carol", "password": "correct-horse"})),
    )
    .await;
    let body = expect_json(
        request(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"username": "carol", "password": "other-password"})),
        )
        .await,
        StatusCode::CONFLICT,
    )
    .await;
    assert_eq!(body["request_status"], "failed");
    assert_eq!(body["details"], "Username already taken");
}

#[tokio::test]
async fn short_password_is_rejected() {
    let (app, _state) = create_test_app();

    let response = request(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"username": "dave", "password": "short"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn protected_route_without_token_is_unauthorized() {
    let (app, _state) = create_test_app();

    let response = request(&app, "GET", "/api/user", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_bearer_token_is_unauthorized() {
    let (app, _state) = create_test_app();

    let response = request(&app, "GET", "/api/user", Some("not-a-jwt"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn public_listings_need_no_token() {
    let (app, _state) = create_test_app();

    for uri in ["/api/grocery", "/api/recipe", "/api/meal", "/health"] {
        let response = request(&app, "GET", uri, None, None).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {} should be public", uri);
    }
}

#[tokio::test]
async fn password_change_invalidates_the_old_credential() {
    let (app, _state) = create_test_app();

    request(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"username": "frank", "password": "correct-horse"})),
    )
    .await;

    let response = request(
        &app,
        "POST",
        "/api/auth/password",
        None,
        Some(json!({
            "username": "frank",
            "current_password": "correct-horse",
            "new_password": "battery-staple",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let old = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "frank", "password": "correct-horse"})),
    )
    .await;
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);

    let new = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "frank", "password": "battery-staple"})),
    )
    .await;
    assert_eq!(new.status(), StatusCode::OK);
}

#[tokio::test]
async fn bearer_token_authenticates_seeded_user() {
    let (app, state) = create_test_app();
    let (user_id, token) = seed_user(&state, "erin", PERMISSION_STANDARD).await;

    let body = expect_json(
        request(&app, "GET", "/api/user", Some(&token), None).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["result"]["id"], user_id.to_string());
}
