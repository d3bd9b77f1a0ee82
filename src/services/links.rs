// SPDX-License-Identifier: MIT

//! Relationship manager: creates and removes join rows while keeping the
//! back-reference sets on both sides in sync.
//!
//! Every mutation here runs inside one transaction: the join row write and
//! both back-reference updates become durable together or not at all.
//! Uniqueness policies are deliberately per-relationship:
//!
//! - user↔grocery: buying-list rows are unique per pair, wallet rows are not
//! - recipe↔grocery: unique per pair, re-adding updates the amount
//! - meal↔recipe: unique per pair, re-adding is an idempotent no-op
//! - user↔meal: unique per pair, re-adding is a conflict
//!
//! Removal is not idempotent anywhere: unlinking an absent row is NotFound.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    Meal, MealRecipeMap, Recipe, RecipeGroceryMap, Schedule, UserGroceryMap, UserMealMap,
};

/// A grocery id with the amount to link it with.
#[derive(Debug, Clone, Deserialize)]
pub struct GroceryAmount {
    pub id: Uuid,
    pub amount: f64,
}

/// Attributes for a new recipe; unset fields fall back to model defaults.
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub name: String,
    pub difficulty: Option<u8>,
    pub time_to_cook: Option<u32>,
    pub time_to_prepare: Option<u32>,
    pub kcal_per_serving: Option<f64>,
    pub recipe_in_text: Option<String>,
    pub groceries: Vec<GroceryAmount>,
}

/// Attributes for a new meal.
#[derive(Debug, Clone)]
pub struct NewMeal {
    pub name: String,
    pub total_time_cook: u32,
    pub total_kcal: f64,
    pub recipes: Vec<Uuid>,
}

// ─── User ↔ Grocery ──────────────────────────────────────────────

/// Add a grocery to the caller's wallet or buying list.
///
/// Buying-list rows are unique per (user, grocery); a second add is a
/// conflict. Plain wallet rows may repeat (separate batches with their own
/// expiry dates).
pub async fn add_grocery_to_wallet(
    db: &Database,
    user_id: Uuid,
    grocery_id: Uuid,
    amount: f64,
    expires_date: DateTime<Utc>,
    to_buying_list: bool,
) -> Result<UserGroceryMap> {
    let mut tx = db.begin_transaction().await;

    if tx.get_user(user_id).is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    if tx.get_grocery(grocery_id).is_none() {
        return Err(AppError::NotFound("Grocery not found".to_string()));
    }
    if to_buying_list && tx.buying_list_entry(user_id, grocery_id).is_some() {
        return Err(AppError::Conflict(
            "Grocery already in buying list".to_string(),
        ));
    }

    let map = UserGroceryMap::new(user_id, grocery_id, amount, expires_date, to_buying_list);
    tx.insert_user_grocery_map(map.clone());
    tx.user_add_grocery_link(user_id, map.id);
    tx.grocery_add_user_link(grocery_id, map.id);
    tx.commit();

    tracing::info!(
        user = %user_id,
        grocery = %grocery_id,
        map = %map.id,
        buying_list = to_buying_list,
        "Grocery linked to user"
    );
    Ok(map)
}

/// Remove a wallet row. The row must belong to the requesting user;
/// anything else (including a second removal) is NotFound.
pub async fn remove_grocery_from_wallet(
    db: &Database,
    user_id: Uuid,
    map_id: Uuid,
) -> Result<()> {
    let mut tx = db.begin_transaction().await;

    let map = match tx.get_user_grocery_map(map_id) {
        Some(m) if m.user == user_id => m.clone(),
        _ => {
            return Err(AppError::NotFound(
                "Grocery not found in your wallet".to_string(),
            ))
        }
    };

    if !tx.user_pull_grocery_link(map.user, map.id) {
        tracing::warn!(user = %map.user, map = %map.id, "dangling user reference while unlinking");
    }
    if !tx.grocery_pull_user_link(map.grocery, map.id) {
        tracing::warn!(grocery = %map.grocery, map = %map.id, "dangling grocery reference while unlinking");
    }
    tx.delete_user_grocery_map(map.id);
    tx.commit();

    tracing::info!(user = %user_id, map = %map_id, "Grocery unlinked from user");
    Ok(())
}

// ─── Recipe ↔ Grocery ────────────────────────────────────────────

/// Create a recipe together with its grocery links in one transaction.
pub async fn create_recipe_with_groceries(
    db: &Database,
    auth: &AuthUser,
    req: NewRecipe,
) -> Result<Recipe> {
    let mut tx = db.begin_transaction().await;

    // The payload may name a grocery twice; one row per pair, last amount
    // wins.
    let mut items: Vec<GroceryAmount> = Vec::with_capacity(req.groceries.len());
    for item in req.groceries {
        match items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => existing.amount = item.amount,
            None => items.push(item),
        }
    }

    for item in &items {
        if tx.get_grocery(item.id).is_none() {
            return Err(AppError::NotFound(
                "Some groceries are not found".to_string(),
            ));
        }
    }

    let mut recipe = Recipe::new(req.name, auth.user_id);
    if let Some(d) = req.difficulty {
        recipe.difficulty = d;
    }
    if let Some(t) = req.time_to_cook {
        recipe.time_to_cook = t;
    }
    if let Some(t) = req.time_to_prepare {
        recipe.time_to_prepare = t;
    }
    if let Some(k) = req.kcal_per_serving {
        recipe.kcal_per_serving = k;
    }
    if let Some(text) = req.recipe_in_text {
        recipe.recipe_in_text = text;
    }

    let mut maps = Vec::with_capacity(items.len());
    for item in &items {
        maps.push(RecipeGroceryMap::new(recipe.id, item.id, item.amount));
    }
    recipe.recipe_grocery_maps = maps.iter().map(|m| m.id).collect();

    tx.insert_recipe(recipe.clone());
    for map in maps {
        tx.grocery_add_recipe_link(map.grocery, map.id);
        tx.insert_recipe_grocery_map(map);
    }
    tx.commit();

    tracing::info!(
        recipe = %recipe.id,
        creator = %auth.user_id,
        groceries = recipe.recipe_grocery_maps.len(),
        "Recipe created"
    );
    Ok(recipe)
}

/// Link groceries into an existing recipe. Re-adding an already linked
/// grocery updates the stored amount instead of erroring.
pub async fn add_groceries_to_recipe(
    db: &Database,
    auth: &AuthUser,
    recipe_id: Uuid,
    items: &[GroceryAmount],
) -> Result<Vec<RecipeGroceryMap>> {
    let mut tx = db.begin_transaction().await;

    let recipe = tx
        .get_recipe(recipe_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))?;
    if !auth.can_act_on(recipe.creator) {
        return Err(AppError::PermissionDenied);
    }

    for item in items {
        if tx.get_grocery(item.id).is_none() {
            return Err(AppError::NotFound(
                "Some groceries are not found".to_string(),
            ));
        }
    }

    let mut maps = Vec::with_capacity(items.len());
    for item in items {
        let existing = tx.find_recipe_grocery_map(recipe_id, item.id).cloned();
        let map = match existing {
            Some(mut map) => {
                map.amount = item.amount;
                tx.put_recipe_grocery_map(map.clone());
                map
            }
            None => {
                let map = RecipeGroceryMap::new(recipe_id, item.id, item.amount);
                tx.insert_recipe_grocery_map(map.clone());
                map
            }
        };
        tx.recipe_add_grocery_link(recipe_id, map.id);
        tx.grocery_add_recipe_link(map.grocery, map.id);
        maps.push(map);
    }
    tx.commit();

    tracing::info!(recipe = %recipe_id, count = maps.len(), "Groceries linked to recipe");
    Ok(maps)
}

/// Unlink groceries from a recipe. Every named grocery must currently be
/// linked, otherwise the whole call is NotFound and nothing changes.
pub async fn remove_groceries_from_recipe(
    db: &Database,
    auth: &AuthUser,
    recipe_id: Uuid,
    grocery_ids: &[Uuid],
) -> Result<()> {
    let mut tx = db.begin_transaction().await;

    let recipe = tx
        .get_recipe(recipe_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))?;
    if !auth.can_act_on(recipe.creator) {
        return Err(AppError::PermissionDenied);
    }

    let mut maps = Vec::with_capacity(grocery_ids.len());
    for grocery_id in grocery_ids {
        match tx.find_recipe_grocery_map(recipe_id, *grocery_id) {
            Some(m) => maps.push(m.clone()),
            None => {
                return Err(AppError::NotFound(
                    "Some groceries are not found".to_string(),
                ))
            }
        }
    }

    for map in &maps {
        if !tx.grocery_pull_recipe_link(map.grocery, map.id) {
            tracing::warn!(grocery = %map.grocery, map = %map.id, "dangling grocery reference while unlinking");
        }
        tx.recipe_pull_grocery_link(recipe_id, map.id);
        tx.delete_recipe_grocery_map(map.id);
    }
    tx.commit();

    tracing::info!(recipe = %recipe_id, count = maps.len(), "Groceries unlinked from recipe");
    Ok(())
}

// ─── Meal ↔ Recipe ───────────────────────────────────────────────

/// Create a meal together with its recipe links in one transaction.
pub async fn create_meal_with_recipes(
    db: &Database,
    auth: &AuthUser,
    req: NewMeal,
) -> Result<Meal> {
    let mut tx = db.begin_transaction().await;

    for recipe_id in &req.recipes {
        if tx.get_recipe(*recipe_id).is_none() {
            return Err(AppError::NotFound("Some recipes are not found".to_string()));
        }
    }

    let mut meal = Meal::new(req.name, req.total_time_cook, req.total_kcal, auth.user_id);
    let maps: Vec<MealRecipeMap> = req
        .recipes
        .iter()
        .map(|recipe_id| MealRecipeMap::new(meal.id, *recipe_id))
        .collect();
    meal.meal_recipe_maps = maps.iter().map(|m| m.id).collect();

    tx.insert_meal(meal.clone());
    for map in maps {
        tx.recipe_add_meal_link(map.recipe, map.id);
        tx.insert_meal_recipe_map(map);
    }
    tx.commit();

    tracing::info!(
        meal = %meal.id,
        creator = %auth.user_id,
        recipes = meal.meal_recipe_maps.len(),
        "Meal created"
    );
    Ok(meal)
}

/// Link recipes into an existing meal. Re-adding an existing pair changes
/// nothing; the operation is idempotent.
pub async fn add_recipes_to_meal(
    db: &Database,
    auth: &AuthUser,
    meal_id: Uuid,
    recipe_ids: &[Uuid],
) -> Result<()> {
    let mut tx = db.begin_transaction().await;

    let meal = tx
        .get_meal(meal_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound("Meal not found".to_string()))?;
    if !auth.can_act_on(meal.creator) {
        return Err(AppError::PermissionDenied);
    }

    for recipe_id in recipe_ids {
        if tx.get_recipe(*recipe_id).is_none() {
            return Err(AppError::NotFound("Some recipes are not found".to_string()));
        }
    }

    for recipe_id in recipe_ids {
        let existing = tx.find_meal_recipe_map(meal_id, *recipe_id).cloned();
        let map = match existing {
            Some(map) => map,
            None => {
                let map = MealRecipeMap::new(meal_id, *recipe_id);
                tx.insert_meal_recipe_map(map.clone());
                map
            }
        };
        tx.meal_add_recipe_link(meal_id, map.id);
        tx.recipe_add_meal_link(*recipe_id, map.id);
    }
    tx.commit();

    tracing::info!(meal = %meal_id, count = recipe_ids.len(), "Recipes linked to meal");
    Ok(())
}

/// Unlink recipes from a meal; every named recipe must currently be linked.
pub async fn remove_recipes_from_meal(
    db: &Database,
    auth: &AuthUser,
    meal_id: Uuid,
    recipe_ids: &[Uuid],
) -> Result<()> {
    let mut tx = db.begin_transaction().await;

    let meal = tx
        .get_meal(meal_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound("Meal not found".to_string()))?;
    if !auth.can_act_on(meal.creator) {
        return Err(AppError::PermissionDenied);
    }

    let mut maps = Vec::with_capacity(recipe_ids.len());
    for recipe_id in recipe_ids {
        match tx.find_meal_recipe_map(meal_id, *recipe_id) {
            Some(m) => maps.push(m.clone()),
            None => {
                return Err(AppError::NotFound("Some recipes are not found".to_string()))
            }
        }
    }

    for map in &maps {
        if !tx.recipe_pull_meal_link(map.recipe, map.id) {
            tracing::warn!(recipe = %map.recipe, map = %map.id, "dangling recipe reference while unlinking");
        }
        tx.meal_pull_recipe_link(meal_id, map.id);
        tx.delete_meal_recipe_map(map.id);
    }
    tx.commit();

    tracing::info!(meal = %meal_id, count = maps.len(), "Recipes unlinked from meal");
    Ok(())
}

// ─── User ↔ Meal ─────────────────────────────────────────────────

/// Add a meal to the caller's plan. Each (user, meal) pair may exist once.
pub async fn add_meal_to_user(db: &Database, user_id: Uuid, meal_id: Uuid) -> Result<UserMealMap> {
    let mut tx = db.begin_transaction().await;

    if tx.get_user(user_id).is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    if tx.get_meal(meal_id).is_none() {
        return Err(AppError::NotFound("Meal not found".to_string()));
    }
    if tx.find_user_meal_map(user_id, meal_id).is_some() {
        return Err(AppError::Conflict("Meal already added".to_string()));
    }

    let map = UserMealMap::new(user_id, meal_id);
    tx.insert_user_meal_map(map.clone());
    tx.user_add_meal_link(user_id, map.id);
    tx.meal_add_user_link(meal_id, map.id);
    tx.commit();

    tracing::info!(user = %user_id, meal = %meal_id, map = %map.id, "Meal linked to user");
    Ok(map)
}

/// Remove a meal from the caller's plan.
pub async fn remove_meal_from_user(db: &Database, user_id: Uuid, meal_id: Uuid) -> Result<()> {
    let mut tx = db.begin_transaction().await;

    let map = tx
        .find_user_meal_map(user_id, meal_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound("You didn't add this meal".to_string()))?;

    if !tx.user_pull_meal_link(map.user, map.id) {
        tracing::warn!(user = %map.user, map = %map.id, "dangling user reference while unlinking");
    }
    if !tx.meal_pull_user_link(map.meal, map.id) {
        tracing::warn!(meal = %map.meal, map = %map.id, "dangling meal reference while unlinking");
    }
    tx.delete_user_meal_map(map.id);
    tx.commit();

    tracing::info!(user = %user_id, meal = %meal_id, "Meal unlinked from user");
    Ok(())
}

/// Replace the schedule list on the caller's link to a meal.
pub async fn schedule_meal(
    db: &Database,
    user_id: Uuid,
    meal_id: Uuid,
    schedules: Vec<Schedule>,
) -> Result<()> {
    let mut tx = db.begin_transaction().await;

    let mut map = tx
        .find_user_meal_map(user_id, meal_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound("You didn't add this meal".to_string()))?;

    map.schedules = schedules;
    tx.put_user_meal_map(map);
    tx.commit();

    tracing::info!(user = %user_id, meal = %meal_id, "Meal schedule updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Unit, User, PERMISSION_STANDARD};

    async fn seed_user(db: &Database, name: &str) -> Uuid {
        let user = User::new(name, "hash");
        let id = user.id;
        let mut tx = db.begin_transaction().await;
        tx.insert_user(user).unwrap();
        tx.commit();
        id
    }

    async fn seed_grocery(db: &Database, name: &str, creator: Uuid) -> Uuid {
        let grocery = crate::models::Grocery::new(name, Unit::Grams, 50.0, "img.png", creator);
        let id = grocery.id;
        let mut tx = db.begin_transaction().await;
        tx.insert_grocery(grocery).unwrap();
        tx.commit();
        id
    }

    fn auth(user_id: Uuid) -> AuthUser {
        AuthUser { user_id, permission_level: PERMISSION_STANDARD }
    }

    #[tokio::test]
    async fn wallet_link_is_symmetric() {
        let db = Database::new();
        let user_id = seed_user(&db, "alice").await;
        let grocery_id = seed_grocery(&db, "Milk", user_id).await;

        let map = add_grocery_to_wallet(&db, user_id, grocery_id, 2.0, Utc::now(), true)
            .await
            .unwrap();

        let user = db.get_user(user_id).await.unwrap();
        let grocery = db.get_grocery(grocery_id).await.unwrap();
        assert!(user.user_grocery_maps.contains(&map.id));
        assert!(grocery.user_grocery_maps.contains(&map.id));
    }

    #[tokio::test]
    async fn duplicate_buying_list_add_is_conflict() {
        let db = Database::new();
        let user_id = seed_user(&db, "bob").await;
        let grocery_id = seed_grocery(&db, "Eggs", user_id).await;

        add_grocery_to_wallet(&db, user_id, grocery_id, 2.0, Utc::now(), true)
            .await
            .unwrap();
        let err = add_grocery_to_wallet(&db, user_id, grocery_id, 1.0, Utc::now(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // Exactly one back-reference survived the rejected second add.
        let user = db.get_user(user_id).await.unwrap();
        assert_eq!(user.user_grocery_maps.len(), 1);
    }

    #[tokio::test]
    async fn wallet_rows_may_repeat_outside_buying_list() {
        let db = Database::new();
        let user_id = seed_user(&db, "carol").await;
        let grocery_id = seed_grocery(&db, "Flour", user_id).await;

        add_grocery_to_wallet(&db, user_id, grocery_id, 1.0, Utc::now(), false)
            .await
            .unwrap();
        add_grocery_to_wallet(&db, user_id, grocery_id, 3.0, Utc::now(), false)
            .await
            .unwrap();

        let user = db.get_user(user_id).await.unwrap();
        assert_eq!(user.user_grocery_maps.len(), 2);
    }

    #[tokio::test]
    async fn unlink_twice_is_not_found() {
        let db = Database::new();
        let user_id = seed_user(&db, "dave").await;
        let grocery_id = seed_grocery(&db, "Salt", user_id).await;

        let map = add_grocery_to_wallet(&db, user_id, grocery_id, 1.0, Utc::now(), false)
            .await
            .unwrap();
        remove_grocery_from_wallet(&db, user_id, map.id).await.unwrap();
        let err = remove_grocery_from_wallet(&db, user_id, map.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn meal_recipe_add_is_idempotent() {
        let db = Database::new();
        let user_id = seed_user(&db, "erin").await;
        let auth = auth(user_id);

        let recipe = create_recipe_with_groceries(
            &db,
            &auth,
            NewRecipe {
                name: "Toast".to_string(),
                difficulty: None,
                time_to_cook: None,
                time_to_prepare: None,
                kcal_per_serving: None,
                recipe_in_text: None,
                groceries: vec![],
            },
        )
        .await
        .unwrap();

        let meal = create_meal_with_recipes(
            &db,
            &auth,
            NewMeal {
                name: "Breakfast".to_string(),
                total_time_cook: 10,
                total_kcal: 350.0,
                recipes: vec![recipe.id],
            },
        )
        .await
        .unwrap();

        add_recipes_to_meal(&db, &auth, meal.id, &[recipe.id]).await.unwrap();

        let meal = db.get_meal(meal.id).await.unwrap();
        let recipe = db.get_recipe(recipe.id).await.unwrap();
        assert_eq!(meal.meal_recipe_maps.len(), 1);
        assert_eq!(recipe.meal_recipe_maps.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_groceries_in_create_payload_collapse_to_one_row() {
        let db = Database::new();
        let user_id = seed_user(&db, "henry").await;
        let auth = auth(user_id);
        let grocery_id = seed_grocery(&db, "Butter", user_id).await;

        let recipe = create_recipe_with_groceries(
            &db,
            &auth,
            NewRecipe {
                name: "Shortbread".to_string(),
                difficulty: None,
                time_to_cook: None,
                time_to_prepare: None,
                kcal_per_serving: None,
                recipe_in_text: None,
                groceries: vec![
                    GroceryAmount { id: grocery_id, amount: 100.0 },
                    GroceryAmount { id: grocery_id, amount: 250.0 },
                ],
            },
        )
        .await
        .unwrap();

        assert_eq!(recipe.recipe_grocery_maps.len(), 1);
        let rows = db.recipe_grocery_maps_for_recipe(recipe.id).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, 250.0);
        let grocery = db.get_grocery(grocery_id).await.unwrap();
        assert_eq!(grocery.recipe_grocery_maps.len(), 1);
    }

    #[tokio::test]
    async fn wallet_row_of_another_user_is_invisible() {
        let db = Database::new();
        let owner = seed_user(&db, "frank").await;
        let intruder = seed_user(&db, "grace").await;
        let grocery_id = seed_grocery(&db, "Rice", owner).await;

        let map = add_grocery_to_wallet(&db, owner, grocery_id, 1.0, Utc::now(), false)
            .await
            .unwrap();
        let err = remove_grocery_from_wallet(&db, intruder, map.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(db.get_user_grocery_map(map.id).await.is_some());
    }
}
