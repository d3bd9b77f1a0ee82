// SPDX-License-Identifier: MIT

//! Embedded entity store with snapshot transactions.
//!
//! Eight collections (four primary entities, four join kinds) live behind a
//! single `RwLock`. Plain reads take the read lock and clone documents out.
//! A [`Transaction`] takes the write lock for its whole lifetime and keeps a
//! snapshot of the pre-transaction state: `commit()` makes the staged writes
//! durable, dropping the handle on any other path restores the snapshot.
//!
//! Holding the write lock from begin to commit also makes in-transaction
//! uniqueness and existence checks authoritative: no concurrent writer can
//! slip a duplicate in between a check and the corresponding write.
//!
//! The store does not enforce cross-collection invariants itself; the
//! relationship and cascade services are responsible for keeping join rows
//! and back-reference sets in sync.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    Grocery, Meal, MealRecipeMap, Recipe, RecipeGroceryMap, User, UserGroceryMap, UserMealMap,
};

#[derive(Debug, Default, Clone)]
pub(crate) struct StoreState {
    users: BTreeMap<Uuid, User>,
    groceries: BTreeMap<Uuid, Grocery>,
    recipes: BTreeMap<Uuid, Recipe>,
    meals: BTreeMap<Uuid, Meal>,
    user_grocery_maps: BTreeMap<Uuid, UserGroceryMap>,
    recipe_grocery_maps: BTreeMap<Uuid, RecipeGroceryMap>,
    meal_recipe_maps: BTreeMap<Uuid, MealRecipeMap>,
    user_meal_maps: BTreeMap<Uuid, UserMealMap>,
}

/// Entity store client. Cheap to clone; all clones share the same state.
#[derive(Clone, Default)]
pub struct Database {
    state: Arc<RwLock<StoreState>>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Primary entity reads ────────────────────────────────────

    pub async fn get_user(&self, id: Uuid) -> Option<User> {
        self.state.read().await.users.get(&id).cloned()
    }

    pub async fn find_user_by_username(&self, username: &str) -> Option<User> {
        self.state
            .read()
            .await
            .users
            .values()
            .find(|u| u.username == username)
            .cloned()
    }

    pub async fn get_grocery(&self, id: Uuid) -> Option<Grocery> {
        self.state.read().await.groceries.get(&id).cloned()
    }

    pub async fn get_recipe(&self, id: Uuid) -> Option<Recipe> {
        self.state.read().await.recipes.get(&id).cloned()
    }

    pub async fn get_meal(&self, id: Uuid) -> Option<Meal> {
        self.state.read().await.meals.get(&id).cloned()
    }

    pub async fn list_groceries(&self) -> Vec<Grocery> {
        self.state.read().await.groceries.values().cloned().collect()
    }

    pub async fn list_recipes(&self) -> Vec<Recipe> {
        self.state.read().await.recipes.values().cloned().collect()
    }

    pub async fn list_meals(&self) -> Vec<Meal> {
        self.state.read().await.meals.values().cloned().collect()
    }

    // ─── Join row reads ──────────────────────────────────────────
    //
    // Scans go over the join collections themselves (the source of truth),
    // not over the derived back-reference sets.

    pub async fn get_user_grocery_map(&self, id: Uuid) -> Option<UserGroceryMap> {
        self.state.read().await.user_grocery_maps.get(&id).cloned()
    }

    pub async fn get_user_meal_map(&self, id: Uuid) -> Option<UserMealMap> {
        self.state.read().await.user_meal_maps.get(&id).cloned()
    }

    pub async fn user_grocery_maps_for_user(&self, user: Uuid) -> Vec<UserGroceryMap> {
        self.state
            .read()
            .await
            .user_grocery_maps
            .values()
            .filter(|m| m.user == user)
            .cloned()
            .collect()
    }

    pub async fn user_meal_maps_for_user(&self, user: Uuid) -> Vec<UserMealMap> {
        self.state
            .read()
            .await
            .user_meal_maps
            .values()
            .filter(|m| m.user == user)
            .cloned()
            .collect()
    }

    pub async fn find_user_meal_map(&self, user: Uuid, meal: Uuid) -> Option<UserMealMap> {
        self.state
            .read()
            .await
            .user_meal_maps
            .values()
            .find(|m| m.user == user && m.meal == meal)
            .cloned()
    }

    pub async fn recipe_grocery_maps_for_recipe(&self, recipe: Uuid) -> Vec<RecipeGroceryMap> {
        self.state
            .read()
            .await
            .recipe_grocery_maps
            .values()
            .filter(|m| m.recipe == recipe)
            .cloned()
            .collect()
    }

    pub async fn recipe_grocery_maps_for_grocery(&self, grocery: Uuid) -> Vec<RecipeGroceryMap> {
        self.state
            .read()
            .await
            .recipe_grocery_maps
            .values()
            .filter(|m| m.grocery == grocery)
            .cloned()
            .collect()
    }

    pub async fn meal_recipe_maps_for_meal(&self, meal: Uuid) -> Vec<MealRecipeMap> {
        self.state
            .read()
            .await
            .meal_recipe_maps
            .values()
            .filter(|m| m.meal == meal)
            .cloned()
            .collect()
    }

    // ─── Transactions ────────────────────────────────────────────

    /// Begin a transaction. The returned handle holds the store's write
    /// lock until it is committed or dropped.
    pub async fn begin_transaction(&self) -> Transaction {
        let guard = Arc::clone(&self.state).write_owned().await;
        let snapshot = guard.clone();
        Transaction { guard, snapshot, committed: false }
    }
}

/// A scoped transactional context. Every mutation goes through one of the
/// typed operations below; nothing becomes visible as durable until
/// [`Transaction::commit`] runs. Dropping the handle on any other exit path
/// rolls the store back to the snapshot taken at begin.
pub struct Transaction {
    guard: OwnedRwLockWriteGuard<StoreState>,
    snapshot: StoreState,
    committed: bool,
}

/// Append an id to a back-reference set with set-union semantics.
fn add_to_set(set: &mut Vec<Uuid>, id: Uuid) {
    if !set.contains(&id) {
        set.push(id);
    }
}

/// Remove an id from a back-reference set; absent ids are a no-op.
fn pull_from_set(set: &mut Vec<Uuid>, id: Uuid) {
    set.retain(|x| *x != id);
}

impl Transaction {
    /// Make all staged writes durable.
    pub fn commit(mut self) {
        self.committed = true;
    }

    // ─── Reads (see the staged state) ────────────────────────────

    pub fn get_user(&self, id: Uuid) -> Option<&User> {
        self.guard.users.get(&id)
    }

    pub fn get_grocery(&self, id: Uuid) -> Option<&Grocery> {
        self.guard.groceries.get(&id)
    }

    pub fn get_recipe(&self, id: Uuid) -> Option<&Recipe> {
        self.guard.recipes.get(&id)
    }

    pub fn get_meal(&self, id: Uuid) -> Option<&Meal> {
        self.guard.meals.get(&id)
    }

    pub fn get_user_grocery_map(&self, id: Uuid) -> Option<&UserGroceryMap> {
        self.guard.user_grocery_maps.get(&id)
    }

    pub fn buying_list_entry(&self, user: Uuid, grocery: Uuid) -> Option<&UserGroceryMap> {
        self.guard
            .user_grocery_maps
            .values()
            .find(|m| m.user == user && m.grocery == grocery && m.is_in_buying_list)
    }

    pub fn find_recipe_grocery_map(&self, recipe: Uuid, grocery: Uuid) -> Option<&RecipeGroceryMap> {
        self.guard
            .recipe_grocery_maps
            .values()
            .find(|m| m.recipe == recipe && m.grocery == grocery)
    }

    pub fn find_meal_recipe_map(&self, meal: Uuid, recipe: Uuid) -> Option<&MealRecipeMap> {
        self.guard
            .meal_recipe_maps
            .values()
            .find(|m| m.meal == meal && m.recipe == recipe)
    }

    pub fn find_user_meal_map(&self, user: Uuid, meal: Uuid) -> Option<&UserMealMap> {
        self.guard
            .user_meal_maps
            .values()
            .find(|m| m.user == user && m.meal == meal)
    }

    pub fn user_grocery_maps_for_grocery(&self, grocery: Uuid) -> Vec<UserGroceryMap> {
        self.guard
            .user_grocery_maps
            .values()
            .filter(|m| m.grocery == grocery)
            .cloned()
            .collect()
    }

    pub fn recipe_grocery_maps_for_grocery(&self, grocery: Uuid) -> Vec<RecipeGroceryMap> {
        self.guard
            .recipe_grocery_maps
            .values()
            .filter(|m| m.grocery == grocery)
            .cloned()
            .collect()
    }

    pub fn recipe_grocery_maps_for_recipe(&self, recipe: Uuid) -> Vec<RecipeGroceryMap> {
        self.guard
            .recipe_grocery_maps
            .values()
            .filter(|m| m.recipe == recipe)
            .cloned()
            .collect()
    }

    pub fn meal_recipe_maps_for_recipe(&self, recipe: Uuid) -> Vec<MealRecipeMap> {
        self.guard
            .meal_recipe_maps
            .values()
            .filter(|m| m.recipe == recipe)
            .cloned()
            .collect()
    }

    pub fn meal_recipe_maps_for_meal(&self, meal: Uuid) -> Vec<MealRecipeMap> {
        self.guard
            .meal_recipe_maps
            .values()
            .filter(|m| m.meal == meal)
            .cloned()
            .collect()
    }

    pub fn user_meal_maps_for_meal(&self, meal: Uuid) -> Vec<UserMealMap> {
        self.guard
            .user_meal_maps
            .values()
            .filter(|m| m.meal == meal)
            .cloned()
            .collect()
    }

    pub fn grocery_name_taken(&self, name: &str, exclude: Option<Uuid>) -> bool {
        self.guard
            .groceries
            .values()
            .any(|g| g.name == name && Some(g.id) != exclude)
    }

    // ─── Primary entity writes ───────────────────────────────────

    /// Insert a new user; the username must be unused.
    pub fn insert_user(&mut self, user: User) -> Result<(), AppError> {
        if self.guard.users.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }
        self.guard.users.insert(user.id, user);
        Ok(())
    }

    /// Insert a new grocery; the name must be globally unique.
    pub fn insert_grocery(&mut self, grocery: Grocery) -> Result<(), AppError> {
        if self.grocery_name_taken(&grocery.name, None) {
            return Err(AppError::Conflict("Grocery already exists".to_string()));
        }
        self.guard.groceries.insert(grocery.id, grocery);
        Ok(())
    }

    pub fn insert_recipe(&mut self, recipe: Recipe) {
        self.guard.recipes.insert(recipe.id, recipe);
    }

    pub fn insert_meal(&mut self, meal: Meal) {
        self.guard.meals.insert(meal.id, meal);
    }

    /// Upsert without uniqueness checks; used for field updates on a row
    /// that was just read inside this transaction.
    pub fn put_user(&mut self, user: User) {
        self.guard.users.insert(user.id, user);
    }

    pub fn put_grocery(&mut self, grocery: Grocery) {
        self.guard.groceries.insert(grocery.id, grocery);
    }

    pub fn put_recipe(&mut self, recipe: Recipe) {
        self.guard.recipes.insert(recipe.id, recipe);
    }

    pub fn put_meal(&mut self, meal: Meal) {
        self.guard.meals.insert(meal.id, meal);
    }

    pub fn delete_grocery(&mut self, id: Uuid) -> bool {
        self.guard.groceries.remove(&id).is_some()
    }

    pub fn delete_recipe(&mut self, id: Uuid) -> bool {
        self.guard.recipes.remove(&id).is_some()
    }

    pub fn delete_meal(&mut self, id: Uuid) -> bool {
        self.guard.meals.remove(&id).is_some()
    }

    // ─── Join row writes ─────────────────────────────────────────

    pub fn insert_user_grocery_map(&mut self, map: UserGroceryMap) {
        self.guard.user_grocery_maps.insert(map.id, map);
    }

    pub fn insert_recipe_grocery_map(&mut self, map: RecipeGroceryMap) {
        self.guard.recipe_grocery_maps.insert(map.id, map);
    }

    pub fn insert_meal_recipe_map(&mut self, map: MealRecipeMap) {
        self.guard.meal_recipe_maps.insert(map.id, map);
    }

    pub fn insert_user_meal_map(&mut self, map: UserMealMap) {
        self.guard.user_meal_maps.insert(map.id, map);
    }

    pub fn put_recipe_grocery_map(&mut self, map: RecipeGroceryMap) {
        self.guard.recipe_grocery_maps.insert(map.id, map);
    }

    pub fn put_user_meal_map(&mut self, map: UserMealMap) {
        self.guard.user_meal_maps.insert(map.id, map);
    }

    pub fn delete_user_grocery_map(&mut self, id: Uuid) -> bool {
        self.guard.user_grocery_maps.remove(&id).is_some()
    }

    pub fn delete_recipe_grocery_map(&mut self, id: Uuid) -> bool {
        self.guard.recipe_grocery_maps.remove(&id).is_some()
    }

    pub fn delete_meal_recipe_map(&mut self, id: Uuid) -> bool {
        self.guard.meal_recipe_maps.remove(&id).is_some()
    }

    pub fn delete_user_meal_map(&mut self, id: Uuid) -> bool {
        self.guard.user_meal_maps.remove(&id).is_some()
    }

    // ─── Back-reference maintenance ──────────────────────────────
    //
    // Each method returns whether the owning entity existed, so callers
    // can log and skip dangling references instead of failing mid-cascade.

    pub fn user_add_grocery_link(&mut self, user: Uuid, map_id: Uuid) -> bool {
        match self.guard.users.get_mut(&user) {
            Some(u) => {
                add_to_set(&mut u.user_grocery_maps, map_id);
                true
            }
            None => false,
        }
    }

    pub fn user_pull_grocery_link(&mut self, user: Uuid, map_id: Uuid) -> bool {
        match self.guard.users.get_mut(&user) {
            Some(u) => {
                pull_from_set(&mut u.user_grocery_maps, map_id);
                true
            }
            None => false,
        }
    }

    pub fn user_add_meal_link(&mut self, user: Uuid, map_id: Uuid) -> bool {
        match self.guard.users.get_mut(&user) {
            Some(u) => {
                add_to_set(&mut u.user_meal_maps, map_id);
                true
            }
            None => false,
        }
    }

    pub fn user_pull_meal_link(&mut self, user: Uuid, map_id: Uuid) -> bool {
        match self.guard.users.get_mut(&user) {
            Some(u) => {
                pull_from_set(&mut u.user_meal_maps, map_id);
                true
            }
            None => false,
        }
    }

    pub fn grocery_add_user_link(&mut self, grocery: Uuid, map_id: Uuid) -> bool {
        match self.guard.groceries.get_mut(&grocery) {
            Some(g) => {
                add_to_set(&mut g.user_grocery_maps, map_id);
                true
            }
            None => false,
        }
    }

    pub fn grocery_pull_user_link(&mut self, grocery: Uuid, map_id: Uuid) -> bool {
        match self.guard.groceries.get_mut(&grocery) {
            Some(g) => {
                pull_from_set(&mut g.user_grocery_maps, map_id);
                true
            }
            None => false,
        }
    }

    pub fn grocery_add_recipe_link(&mut self, grocery: Uuid, map_id: Uuid) -> bool {
        match self.guard.groceries.get_mut(&grocery) {
            Some(g) => {
                add_to_set(&mut g.recipe_grocery_maps, map_id);
                true
            }
            None => false,
        }
    }

    pub fn grocery_pull_recipe_link(&mut self, grocery: Uuid, map_id: Uuid) -> bool {
        match self.guard.groceries.get_mut(&grocery) {
            Some(g) => {
                pull_from_set(&mut g.recipe_grocery_maps, map_id);
                true
            }
            None => false,
        }
    }

    pub fn recipe_add_grocery_link(&mut self, recipe: Uuid, map_id: Uuid) -> bool {
        match self.guard.recipes.get_mut(&recipe) {
            Some(r) => {
                add_to_set(&mut r.recipe_grocery_maps, map_id);
                true
            }
            None => false,
        }
    }

    pub fn recipe_pull_grocery_link(&mut self, recipe: Uuid, map_id: Uuid) -> bool {
        match self.guard.recipes.get_mut(&recipe) {
            Some(r) => {
                pull_from_set(&mut r.recipe_grocery_maps, map_id);
                true
            }
            None => false,
        }
    }

    pub fn recipe_add_meal_link(&mut self, recipe: Uuid, map_id: Uuid) -> bool {
        match self.guard.recipes.get_mut(&recipe) {
            Some(r) => {
                add_to_set(&mut r.meal_recipe_maps, map_id);
                true
            }
            None => false,
        }
    }

    pub fn recipe_pull_meal_link(&mut self, recipe: Uuid, map_id: Uuid) -> bool {
        match self.guard.recipes.get_mut(&recipe) {
            Some(r) => {
                pull_from_set(&mut r.meal_recipe_maps, map_id);
                true
            }
            None => false,
        }
    }

    pub fn meal_add_recipe_link(&mut self, meal: Uuid, map_id: Uuid) -> bool {
        match self.guard.meals.get_mut(&meal) {
            Some(m) => {
                add_to_set(&mut m.meal_recipe_maps, map_id);
                true
            }
            None => false,
        }
    }

    pub fn meal_pull_recipe_link(&mut self, meal: Uuid, map_id: Uuid) -> bool {
        match self.guard.meals.get_mut(&meal) {
            Some(m) => {
                pull_from_set(&mut m.meal_recipe_maps, map_id);
                true
            }
            None => false,
        }
    }

    pub fn meal_add_user_link(&mut self, meal: Uuid, map_id: Uuid) -> bool {
        match self.guard.meals.get_mut(&meal) {
            Some(m) => {
                add_to_set(&mut m.user_meal_maps, map_id);
                true
            }
            None => false,
        }
    }

    pub fn meal_pull_user_link(&mut self, meal: Uuid, map_id: Uuid) -> bool {
        match self.guard.meals.get_mut(&meal) {
            Some(m) => {
                pull_from_set(&mut m.user_meal_maps, map_id);
                true
            }
            None => false,
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.committed {
            *self.guard = std::mem::take(&mut self.snapshot);
            tracing::debug!("transaction dropped without commit; store rolled back");
        }
    }
}
