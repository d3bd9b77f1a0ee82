// SPDX-License-Identifier: MIT

//! Meal and meal-plan routes.

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Meal, Schedule, UserMealMap};
use crate::routes::{success, success_result, Envelope, ResultBody};
use crate::services::links::NewMeal;
use crate::services::{cascade, links, query};
use crate::AppState;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/meal", get(list_meals))
        .route("/api/meal/{id}", get(get_meal))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/meal/user", get(get_plan))
        .route("/api/meal/user", post(add_to_plan))
        .route("/api/meal/user/{meal_id}", delete(remove_from_plan))
        .route("/api/meal/user/{meal_id}/schedule", put(set_schedule))
        .route("/api/meal", post(create_meal))
        .route("/api/meal/{id}", put(update_meal))
        .route("/api/meal/{id}", delete(delete_meal))
        .route("/api/meal/{id}/recipe", post(add_recipes))
        .route("/api/meal/{id}/recipe", delete(remove_recipes))
}

async fn list_meals(
    State(state): State<Arc<AppState>>,
    Query(raw): Query<query::RawListParams>,
) -> Result<Json<Envelope<query::Page<Meal>>>> {
    let params = raw.validate()?;
    let page = query::apply(state.db.list_meals().await, &query::meal_fields(), &params)?;
    Ok(success(page))
}

async fn get_meal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<ResultBody<query::MealView>>>> {
    let meal = state
        .db
        .get_meal(id)
        .await
        .ok_or_else(|| AppError::NotFound("Meal not found".to_string()))?;
    Ok(success_result(query::meal_with_recipes(&state.db, meal).await))
}

/// The caller's plan: every meal they added, with schedules inlined.
/// Unlike the recipe listing, membership comes from the plan links rather
/// than from authorship.
async fn get_plan(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Envelope<ResultBody<Vec<query::PlanEntry>>>>> {
    Ok(success_result(query::user_plan(&state.db, auth.user_id).await))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMealRequest {
    #[validate(length(min = 1, max = 128, message = "must be 1 to 128 characters"))]
    pub name: String,
    pub total_time_cook: u32,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub total_kcal: f64,
    #[serde(default)]
    pub recipes: Vec<Uuid>,
}

async fn create_meal(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateMealRequest>,
) -> Result<Json<Envelope<ResultBody<Meal>>>> {
    req.validate()?;
    let meal = links::create_meal_with_recipes(
        &state.db,
        &auth,
        NewMeal {
            name: req.name,
            total_time_cook: req.total_time_cook,
            total_kcal: req.total_kcal,
            recipes: req.recipes,
        },
    )
    .await?;
    Ok(success_result(meal))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMealRequest {
    #[validate(length(min = 1, max = 128, message = "must be 1 to 128 characters"))]
    pub name: Option<String>,
    pub total_time_cook: Option<u32>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub total_kcal: Option<f64>,
}

async fn update_meal(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMealRequest>,
) -> Result<Json<Envelope<ResultBody<Meal>>>> {
    req.validate()?;

    let mut tx = state.db.begin_transaction().await;
    let mut meal = tx
        .get_meal(id)
        .cloned()
        .ok_or_else(|| AppError::NotFound("Meal not found".to_string()))?;
    if !auth.can_act_on(meal.creator) {
        return Err(AppError::PermissionDenied);
    }

    if let Some(name) = req.name {
        meal.name = name;
    }
    if let Some(t) = req.total_time_cook {
        meal.total_time_cook = t;
    }
    if let Some(kcal) = req.total_kcal {
        meal.total_kcal = kcal;
    }

    tx.put_meal(meal.clone());
    tx.commit();

    tracing::info!(meal = %id, "Meal updated");
    Ok(success_result(meal))
}

async fn delete_meal(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<ResultBody<&'static str>>>> {
    cascade::delete_meal(&state.db, &auth, id).await?;
    Ok(success_result("deleted"))
}

#[derive(Debug, Deserialize)]
pub struct RecipesRequest {
    pub recipes: Vec<Uuid>,
}

async fn add_recipes(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<RecipesRequest>,
) -> Result<Json<Envelope<ResultBody<&'static str>>>> {
    if req.recipes.is_empty() {
        return Err(AppError::Validation("recipes must not be empty".to_string()));
    }
    links::add_recipes_to_meal(&state.db, &auth, id, &req.recipes).await?;
    Ok(success_result("added"))
}

async fn remove_recipes(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<RecipesRequest>,
) -> Result<Json<Envelope<ResultBody<&'static str>>>> {
    if req.recipes.is_empty() {
        return Err(AppError::Validation("recipes must not be empty".to_string()));
    }
    links::remove_recipes_from_meal(&state.db, &auth, id, &req.recipes).await?;
    Ok(success_result("removed"))
}

#[derive(Debug, Deserialize)]
pub struct AddToPlanRequest {
    pub meal: Uuid,
}

async fn add_to_plan(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<AddToPlanRequest>,
) -> Result<Json<Envelope<ResultBody<UserMealMap>>>> {
    let map = links::add_meal_to_user(&state.db, auth.user_id, req.meal).await?;
    Ok(success_result(map))
}

async fn remove_from_plan(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(meal_id): Path<Uuid>,
) -> Result<Json<Envelope<ResultBody<&'static str>>>> {
    links::remove_meal_from_user(&state.db, auth.user_id, meal_id).await?;
    Ok(success_result("removed"))
}

#[derive(Debug, Deserialize)]
pub struct SetScheduleRequest {
    pub schedules: Vec<Schedule>,
}

async fn set_schedule(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(meal_id): Path<Uuid>,
    Json(req): Json<SetScheduleRequest>,
) -> Result<Json<Envelope<ResultBody<&'static str>>>> {
    for schedule in &req.schedules {
        if schedule.end <= schedule.start {
            return Err(AppError::Validation(
                "schedule end must be after its start".to_string(),
            ));
        }
    }
    links::schedule_meal(&state.db, auth.user_id, meal_id, req.schedules).await?;
    Ok(success_result("scheduled"))
}
