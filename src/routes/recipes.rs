// SPDX-License-Identifier: MIT

//! Recipe routes.

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Recipe, RecipeGroceryMap};
use crate::routes::{success, success_result, Envelope, ResultBody};
use crate::services::links::{GroceryAmount, NewRecipe};
use crate::services::{cascade, links, query};
use crate::AppState;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/recipe", get(list_recipes))
        .route("/api/recipe/{id}", get(get_recipe))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/recipe/user", get(list_own_recipes))
        .route("/api/recipe", post(create_recipe))
        .route("/api/recipe/{id}", put(update_recipe))
        .route("/api/recipe/{id}", delete(delete_recipe))
        .route("/api/recipe/{id}/grocery", post(add_groceries))
        .route("/api/recipe/{id}/grocery", delete(remove_groceries))
}

async fn list_recipes(
    State(state): State<Arc<AppState>>,
    Query(raw): Query<query::RawListParams>,
) -> Result<Json<Envelope<query::Page<Recipe>>>> {
    let params = raw.validate()?;
    let page = query::apply(state.db.list_recipes().await, &query::recipe_fields(), &params)?;
    Ok(success(page))
}

/// Recipes created by the caller, with the same filters as the public list.
async fn list_own_recipes(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(raw): Query<query::RawListParams>,
) -> Result<Json<Envelope<query::Page<Recipe>>>> {
    let params = raw.validate()?;
    let mine: Vec<Recipe> = state
        .db
        .list_recipes()
        .await
        .into_iter()
        .filter(|r| r.creator == auth.user_id)
        .collect();
    let page = query::apply(mine, &query::recipe_fields(), &params)?;
    Ok(success(page))
}

async fn get_recipe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<ResultBody<query::RecipeView>>>> {
    let recipe = state
        .db
        .get_recipe(id)
        .await
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))?;
    Ok(success_result(query::recipe_with_groceries(&state.db, recipe).await))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRecipeRequest {
    #[validate(length(min = 1, max = 128, message = "must be 1 to 128 characters"))]
    pub name: String,
    #[validate(range(min = 0, max = 10, message = "must be between 0 and 10"))]
    pub difficulty: Option<u8>,
    pub time_to_cook: Option<u32>,
    pub time_to_prepare: Option<u32>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub kcal_per_serving: Option<f64>,
    pub recipe_in_text: Option<String>,
    #[serde(default)]
    pub groceries: Vec<GroceryAmount>,
}

async fn create_recipe(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateRecipeRequest>,
) -> Result<Json<Envelope<ResultBody<Recipe>>>> {
    req.validate()?;
    if req.groceries.iter().any(|g| g.amount <= 0.0) {
        return Err(AppError::Validation(
            "grocery amounts must be greater than zero".to_string(),
        ));
    }

    let recipe = links::create_recipe_with_groceries(
        &state.db,
        &auth,
        NewRecipe {
            name: req.name,
            difficulty: req.difficulty,
            time_to_cook: req.time_to_cook,
            time_to_prepare: req.time_to_prepare,
            kcal_per_serving: req.kcal_per_serving,
            recipe_in_text: req.recipe_in_text,
            groceries: req.groceries,
        },
    )
    .await?;
    Ok(success_result(recipe))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRecipeRequest {
    #[validate(length(min = 1, max = 128, message = "must be 1 to 128 characters"))]
    pub name: Option<String>,
    #[validate(range(min = 0, max = 10, message = "must be between 0 and 10"))]
    pub difficulty: Option<u8>,
    pub time_to_cook: Option<u32>,
    pub time_to_prepare: Option<u32>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub kcal_per_serving: Option<f64>,
    pub recipe_in_text: Option<String>,
}

async fn update_recipe(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRecipeRequest>,
) -> Result<Json<Envelope<ResultBody<Recipe>>>> {
    req.validate()?;

    let mut tx = state.db.begin_transaction().await;
    let mut recipe = tx
        .get_recipe(id)
        .cloned()
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))?;
    if !auth.can_act_on(recipe.creator) {
        return Err(AppError::PermissionDenied);
    }

    if let Some(name) = req.name {
        recipe.name = name;
    }
    if let Some(difficulty) = req.difficulty {
        recipe.difficulty = difficulty;
    }
    if let Some(t) = req.time_to_cook {
        recipe.time_to_cook = t;
    }
    if let Some(t) = req.time_to_prepare {
        recipe.time_to_prepare = t;
    }
    if let Some(kcal) = req.kcal_per_serving {
        recipe.kcal_per_serving = kcal;
    }
    if let Some(text) = req.recipe_in_text {
        recipe.recipe_in_text = text;
    }
    recipe.updated_at = Utc::now();

    tx.put_recipe(recipe.clone());
    tx.commit();

    tracing::info!(recipe = %id, "Recipe updated");
    Ok(success_result(recipe))
}

async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<ResultBody<&'static str>>>> {
    cascade::delete_recipe(&state.db, &auth, id).await?;
    Ok(success_result("deleted"))
}

#[derive(Debug, Deserialize)]
pub struct AddGroceriesRequest {
    pub groceries: Vec<GroceryAmount>,
}

async fn add_groceries(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddGroceriesRequest>,
) -> Result<Json<Envelope<ResultBody<Vec<RecipeGroceryMap>>>>> {
    if req.groceries.is_empty() {
        return Err(AppError::Validation("groceries must not be empty".to_string()));
    }
    if req.groceries.iter().any(|g| g.amount <= 0.0) {
        return Err(AppError::Validation(
            "grocery amounts must be greater than zero".to_string(),
        ));
    }
    let maps = links::add_groceries_to_recipe(&state.db, &auth, id, &req.groceries).await?;
    Ok(success_result(maps))
}

#[derive(Debug, Deserialize)]
pub struct RemoveGroceriesRequest {
    pub groceries: Vec<Uuid>,
}

async fn remove_groceries(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<RemoveGroceriesRequest>,
) -> Result<Json<Envelope<ResultBody<&'static str>>>> {
    if req.groceries.is_empty() {
        return Err(AppError::Validation("groceries must not be empty".to_string()));
    }
    links::remove_groceries_from_recipe(&state.db, &auth, id, &req.groceries).await?;
    Ok(success_result("removed"))
}
