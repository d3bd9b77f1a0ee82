// SPDX-License-Identifier: MIT

//! Meal and meal-plan API tests.

use axum::http::StatusCode;
use serde_json::json;

mod common;

use common::{create_test_app, expect_json, request, seed_user};
use pantry_planner::models::PERMISSION_STANDARD;

async fn create_meal(app: &axum::Router, token: &str, name: &str) -> String {
    let body = expect_json(
        request(
            app,
            "POST",
            "/api/meal",
            Some(token),
            Some(json!({"name": name, "total_time_cook": 30, "total_kcal": 600.0})),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    body["result"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn plan_membership_is_per_user() {
    let (app, state) = create_test_app();
    let (_, alice_token) = seed_user(&state, "alice", PERMISSION_STANDARD).await;
    let (_, bob_token) = seed_user(&state, "bob", PERMISSION_STANDARD).await;
    let meal_id = create_meal(&app, &alice_token, "Curry").await;

    // Bob adds Alice's meal to his own plan; authorship does not matter.
    expect_json(
        request(
            &app,
            "POST",
            "/api/meal/user",
            Some(&bob_token),
            Some(json!({"meal": meal_id})),
        )
        .await,
        StatusCode::OK,
    )
    .await;

    let body = expect_json(
        request(&app, "GET", "/api/meal/user", Some(&bob_token), None).await,
        StatusCode::OK,
    )
    .await;
    let entries = body["result"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["meal"]["name"], "Curry");

    let body = expect_json(
        request(&app, "GET", "/api/meal/user", Some(&alice_token), None).await,
        StatusCode::OK,
    )
    .await;
    assert!(body["result"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn adding_the_same_meal_twice_is_a_conflict() {
    let (app, state) = create_test_app();
    let (_, token) = seed_user(&state, "carol", PERMISSION_STANDARD).await;
    let meal_id = create_meal(&app, &token, "Stew").await;

    let add = json!({"meal": meal_id});
    expect_json(
        request(&app, "POST", "/api/meal/user", Some(&token), Some(add.clone())).await,
        StatusCode::OK,
    )
    .await;
    let body = expect_json(
        request(&app, "POST", "/api/meal/user", Some(&token), Some(add)).await,
        StatusCode::CONFLICT,
    )
    .await;
    assert_eq!(body["details"], "Meal already added");
}

#[tokio::test]
async fn schedules_replace_and_validate() {
    let (app, state) = create_test_app();
    let (_, token) = seed_user(&state, "dave", PERMISSION_STANDARD).await;
    let meal_id = create_meal(&app, &token, "Lunch").await;

    request(&app, "POST", "/api/meal/user", Some(&token), Some(json!({"meal": meal_id}))).await;

    let uri = format!("/api/meal/user/{}/schedule", meal_id);
    let response = request(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({"schedules": [
            {"start": "2026-09-01T12:00:00Z", "end": "2026-09-01T13:00:00Z"},
        ]})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = expect_json(
        request(&app, "GET", "/api/meal/user", Some(&token), None).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["result"][0]["schedules"].as_array().unwrap().len(), 1);

    // An interval that ends before it starts is rejected.
    let response = request(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({"schedules": [
            {"start": "2026-09-01T13:00:00Z", "end": "2026-09-01T12:00:00Z"},
        ]})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn scheduling_an_unadded_meal_is_not_found() {
    let (app, state) = create_test_app();
    let (_, token) = seed_user(&state, "erin", PERMISSION_STANDARD).await;
    let meal_id = create_meal(&app, &token, "Supper").await;

    let body = expect_json(
        request(
            &app,
            "PUT",
            &format!("/api/meal/user/{}/schedule", meal_id),
            Some(&token),
            Some(json!({"schedules": []})),
        )
        .await,
        StatusCode::NOT_FOUND,
    )
    .await;
    assert_eq!(body["details"], "You didn't add this meal");
}

#[tokio::test]
async fn removing_a_meal_from_the_plan_is_not_idempotent() {
    let (app, state) = create_test_app();
    let (user_id, token) = seed_user(&state, "frank", PERMISSION_STANDARD).await;
    let meal_id = create_meal(&app, &token, "Snack").await;

    request(&app, "POST", "/api/meal/user", Some(&token), Some(json!({"meal": meal_id}))).await;

    let uri = format!("/api/meal/user/{}", meal_id);
    let response = request(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let user = state.db.get_user(user_id).await.unwrap();
    assert!(user.user_meal_maps.is_empty());

    let response = request(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn linking_recipes_into_a_meal_by_route() {
    let (app, state) = create_test_app();
    let (_, token) = seed_user(&state, "grace", PERMISSION_STANDARD).await;
    let meal_id = create_meal(&app, &token, "Feast").await;

    let body = expect_json(
        request(&app, "POST", "/api/recipe", Some(&token), Some(json!({"name": "Pie"}))).await,
        StatusCode::OK,
    )
    .await;
    let recipe_id = body["result"]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/meal/{}/recipe", meal_id);
    let response = request(
        &app,
        "POST",
        &uri,
        Some(&token),
        Some(json!({"recipes": [recipe_id]})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = expect_json(
        request(&app, "GET", &format!("/api/meal/{}", meal_id), None, None).await,
        StatusCode::OK,
    )
    .await;
    let recipes = body["result"]["recipes"].as_array().unwrap();
    assert_eq!(recipes.len(), 1);
    assert_eq!(recipes[0]["recipe"]["name"], "Pie");

    let response = request(
        &app,
        "DELETE",
        &uri,
        Some(&token),
        Some(json!({"recipes": [recipe_id]})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = expect_json(
        request(&app, "GET", &format!("/api/meal/{}", meal_id), None, None).await,
        StatusCode::OK,
    )
    .await;
    assert!(body["result"]["recipes"].as_array().unwrap().is_empty());
}
