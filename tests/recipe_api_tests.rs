// SPDX-License-Identifier: MIT

//! Recipe API tests: defaults, grocery links, and the denormalized view.

use axum::http::StatusCode;
use serde_json::json;

mod common;

use common::{create_test_app, expect_json, request, seed_grocery, seed_user};
use pantry_planner::models::PERMISSION_STANDARD;

#[tokio::test]
async fn sparse_create_fills_in_defaults() {
    let (app, state) = create_test_app();
    let (_, token) = seed_user(&state, "alice", PERMISSION_STANDARD).await;

    let body = expect_json(
        request(
            &app,
            "POST",
            "/api/recipe",
            Some(&token),
            Some(json!({"name": "Mystery"})),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    let result = &body["result"];
    assert_eq!(result["difficulty"], 5);
    assert_eq!(result["time_to_cook"], 60);
    assert_eq!(result["time_to_prepare"], 60);
    assert_eq!(result["recipe_in_text"], "You didn't upload this recipe detail");
}

#[tokio::test]
async fn create_with_unknown_grocery_stores_nothing() {
    let (app, state) = create_test_app();
    let (_, token) = seed_user(&state, "bob", PERMISSION_STANDARD).await;

    let body = expect_json(
        request(
            &app,
            "POST",
            "/api/recipe",
            Some(&token),
            Some(json!({
                "name": "Ghost Soup",
                "groceries": [{"id": "00000000-0000-0000-0000-000000000000", "amount": 1.0}],
            })),
        )
        .await,
        StatusCode::NOT_FOUND,
    )
    .await;
    assert_eq!(body["details"], "Some groceries are not found");
    assert!(state.db.list_recipes().await.is_empty());
}

#[tokio::test]
async fn recipe_view_inlines_groceries_and_creator() {
    let (app, state) = create_test_app();
    let (user_id, token) = seed_user(&state, "carol", PERMISSION_STANDARD).await;
    let grocery_id = seed_grocery(&state, "Flour", 350.0, user_id).await;

    let body = expect_json(
        request(
            &app,
            "POST",
            "/api/recipe",
            Some(&token),
            Some(json!({
                "name": "Bread",
                "groceries": [{"id": grocery_id, "amount": 500.0}],
            })),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    let recipe_id = body["result"]["id"].as_str().unwrap().to_string();

    let body = expect_json(
        request(&app, "GET", &format!("/api/recipe/{}", recipe_id), None, None).await,
        StatusCode::OK,
    )
    .await;
    let result = &body["result"];
    assert_eq!(result["creator_info"]["username"], "carol");
    let groceries = result["groceries"].as_array().unwrap();
    assert_eq!(groceries.len(), 1);
    assert_eq!(groceries[0]["amount"], 500.0);
    assert_eq!(groceries[0]["grocery"]["name"], "Flour");

    // The grocery points back at the recipe too.
    let body = expect_json(
        request(&app, "GET", &format!("/api/grocery/{}", grocery_id), None, None).await,
        StatusCode::OK,
    )
    .await;
    let recipes = body["result"]["recipes"].as_array().unwrap();
    assert_eq!(recipes.len(), 1);
    assert_eq!(recipes[0]["name"], "Bread");
}

#[tokio::test]
async fn re_adding_a_grocery_updates_the_amount() {
    let (app, state) = create_test_app();
    let (user_id, token) = seed_user(&state, "dave", PERMISSION_STANDARD).await;
    let grocery_id = seed_grocery(&state, "Sugar", 400.0, user_id).await;

    let body = expect_json(
        request(
            &app,
            "POST",
            "/api/recipe",
            Some(&token),
            Some(json!({
                "name": "Cake",
                "groceries": [{"id": grocery_id, "amount": 100.0}],
            })),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    let recipe_id = body["result"]["id"].as_str().unwrap().to_string();

    let body = expect_json(
        request(
            &app,
            "POST",
            &format!("/api/recipe/{}/grocery", recipe_id),
            Some(&token),
            Some(json!({"groceries": [{"id": grocery_id, "amount": 250.0}]})),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["result"][0]["amount"], 250.0);

    // Still one link row, no duplicates.
    let body = expect_json(
        request(&app, "GET", &format!("/api/recipe/{}", recipe_id), None, None).await,
        StatusCode::OK,
    )
    .await;
    let groceries = body["result"]["groceries"].as_array().unwrap();
    assert_eq!(groceries.len(), 1);
    assert_eq!(groceries[0]["amount"], 250.0);
}

#[tokio::test]
async fn unlinking_an_absent_grocery_is_not_found() {
    let (app, state) = create_test_app();
    let (user_id, token) = seed_user(&state, "erin", PERMISSION_STANDARD).await;
    let linked = seed_grocery(&state, "Butter", 700.0, user_id).await;
    let unlinked = seed_grocery(&state, "Jam", 250.0, user_id).await;

    let body = expect_json(
        request(
            &app,
            "POST",
            "/api/recipe",
            Some(&token),
            Some(json!({
                "name": "Toast",
                "groceries": [{"id": linked, "amount": 10.0}],
            })),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    let recipe_id = body["result"]["id"].as_str().unwrap().to_string();

    let response = request(
        &app,
        "DELETE",
        &format!("/api/recipe/{}/grocery", recipe_id),
        Some(&token),
        Some(json!({"groceries": [linked, unlinked]})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The partial match was not removed.
    let body = expect_json(
        request(&app, "GET", &format!("/api/recipe/{}", recipe_id), None, None).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["result"]["groceries"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn only_the_creator_may_modify_a_recipe() {
    let (app, state) = create_test_app();
    let (user_id, creator_token) = seed_user(&state, "frank", PERMISSION_STANDARD).await;
    let (_, other_token) = seed_user(&state, "grace", PERMISSION_STANDARD).await;
    let grocery_id = seed_grocery(&state, "Beans", 120.0, user_id).await;

    let body = expect_json(
        request(
            &app,
            "POST",
            "/api/recipe",
            Some(&creator_token),
            Some(json!({"name": "Chili"})),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    let recipe_id = body["result"]["id"].as_str().unwrap().to_string();

    let response = request(
        &app,
        "POST",
        &format!("/api/recipe/{}/grocery", recipe_id),
        Some(&other_token),
        Some(json!({"groceries": [{"id": grocery_id, "amount": 1.0}]})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = request(
        &app,
        "PUT",
        &format!("/api/recipe/{}", recipe_id),
        Some(&other_token),
        Some(json!({"name": "Stolen"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn own_recipe_listing_filters_by_creator() {
    let (app, state) = create_test_app();
    let (_, alice_token) = seed_user(&state, "alice", PERMISSION_STANDARD).await;
    let (_, bob_token) = seed_user(&state, "bob", PERMISSION_STANDARD).await;

    request(&app, "POST", "/api/recipe", Some(&alice_token), Some(json!({"name": "Hers"}))).await;
    request(&app, "POST", "/api/recipe", Some(&bob_token), Some(json!({"name": "His"}))).await;

    let body = expect_json(
        request(&app, "GET", "/api/recipe/user", Some(&alice_token), None).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["result"][0]["name"], "Hers");

    let body = expect_json(
        request(&app, "GET", "/api/recipe", None, None).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["total"], 2);
}
