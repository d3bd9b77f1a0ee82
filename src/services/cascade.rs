// SPDX-License-Identifier: MIT

//! Cascade deletion: removing a primary entity takes every join row that
//! references it along, and scrubs the back-reference sets on the far side
//! of each of those rows.
//!
//! Dependent rows are gathered by scanning the join collections, never by
//! trusting the entity's own back-reference set. A dangling far-side owner
//! is logged and skipped; it must not abort the cascade.

use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::PERMISSION_ADMIN;

/// Delete a grocery plus its wallet rows and recipe links.
///
/// Allowed for admins and for the grocery's creator.
pub async fn delete_grocery(db: &Database, auth: &AuthUser, grocery_id: Uuid) -> Result<String> {
    let mut tx = db.begin_transaction().await;

    let grocery = tx
        .get_grocery(grocery_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound("Grocery not found".to_string()))?;
    if !auth.can_act_on(grocery.creator) {
        return Err(AppError::PermissionDenied);
    }

    let wallet_rows = tx.user_grocery_maps_for_grocery(grocery_id);
    let recipe_rows = tx.recipe_grocery_maps_for_grocery(grocery_id);

    for map in &wallet_rows {
        if !tx.user_pull_grocery_link(map.user, map.id) {
            tracing::warn!(user = %map.user, map = %map.id, "dangling user reference during grocery cascade");
        }
        tx.delete_user_grocery_map(map.id);
    }
    for map in &recipe_rows {
        if !tx.recipe_pull_grocery_link(map.recipe, map.id) {
            tracing::warn!(recipe = %map.recipe, map = %map.id, "dangling recipe reference during grocery cascade");
        }
        tx.delete_recipe_grocery_map(map.id);
    }
    tx.delete_grocery(grocery_id);
    tx.commit();

    tracing::info!(
        grocery = %grocery_id,
        wallet_rows = wallet_rows.len(),
        recipe_rows = recipe_rows.len(),
        "Grocery deleted"
    );
    Ok(grocery.image_path)
}

/// Delete a recipe plus its grocery links and meal links.
///
/// Allowed for admins and for the recipe's creator.
pub async fn delete_recipe(db: &Database, auth: &AuthUser, recipe_id: Uuid) -> Result<()> {
    let mut tx = db.begin_transaction().await;

    let recipe = tx
        .get_recipe(recipe_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))?;
    if !auth.can_act_on(recipe.creator) {
        return Err(AppError::PermissionDenied);
    }

    let grocery_rows = tx.recipe_grocery_maps_for_recipe(recipe_id);
    let meal_rows = tx.meal_recipe_maps_for_recipe(recipe_id);

    for map in &grocery_rows {
        if !tx.grocery_pull_recipe_link(map.grocery, map.id) {
            tracing::warn!(grocery = %map.grocery, map = %map.id, "dangling grocery reference during recipe cascade");
        }
        tx.delete_recipe_grocery_map(map.id);
    }
    for map in &meal_rows {
        if !tx.meal_pull_recipe_link(map.meal, map.id) {
            tracing::warn!(meal = %map.meal, map = %map.id, "dangling meal reference during recipe cascade");
        }
        tx.delete_meal_recipe_map(map.id);
    }
    tx.delete_recipe(recipe_id);
    tx.commit();

    tracing::info!(
        recipe = %recipe_id,
        grocery_rows = grocery_rows.len(),
        meal_rows = meal_rows.len(),
        "Recipe deleted"
    );
    Ok(())
}

/// Delete a meal plus its recipe links and every user's plan rows for it.
///
/// Admin only. A meal may sit in many users' plans, so even its creator may
/// not pull it out from under them.
pub async fn delete_meal(db: &Database, auth: &AuthUser, meal_id: Uuid) -> Result<()> {
    let mut tx = db.begin_transaction().await;

    if tx.get_meal(meal_id).is_none() {
        return Err(AppError::NotFound("Meal not found".to_string()));
    }
    if !auth.has_privilege(PERMISSION_ADMIN) {
        return Err(AppError::PermissionDenied);
    }

    let recipe_rows = tx.meal_recipe_maps_for_meal(meal_id);
    let plan_rows = tx.user_meal_maps_for_meal(meal_id);

    for map in &recipe_rows {
        if !tx.recipe_pull_meal_link(map.recipe, map.id) {
            tracing::warn!(recipe = %map.recipe, map = %map.id, "dangling recipe reference during meal cascade");
        }
        tx.delete_meal_recipe_map(map.id);
    }
    for map in &plan_rows {
        if !tx.user_pull_meal_link(map.user, map.id) {
            tracing::warn!(user = %map.user, map = %map.id, "dangling user reference during meal cascade");
        }
        tx.delete_user_meal_map(map.id);
    }
    tx.delete_meal(meal_id);
    tx.commit();

    tracing::info!(
        meal = %meal_id,
        recipe_rows = recipe_rows.len(),
        plan_rows = plan_rows.len(),
        "Meal deleted"
    );
    Ok(())
}
