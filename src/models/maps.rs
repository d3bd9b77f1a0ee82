// SPDX-License-Identifier: MIT

//! Join entities. Each row links two primary entities; its id appears in
//! the back-reference sets on both sides for as long as the row exists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A grocery in a user's wallet or buying list.
///
/// At most one row with `is_in_buying_list = true` may exist per
/// (user, grocery) pair; plain wallet rows are not unique, each one is a
/// separate batch with its own amount and expiry date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserGroceryMap {
    pub id: Uuid,
    pub user: Uuid,
    pub grocery: Uuid,
    /// Quantity in the grocery's unit
    pub amount: f64,
    pub expires_date: DateTime<Utc>,
    pub is_in_buying_list: bool,
}

/// Amount of a grocery consumed by a recipe. Unique per (recipe, grocery);
/// re-adding updates the amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeGroceryMap {
    pub id: Uuid,
    pub recipe: Uuid,
    pub grocery: Uuid,
    pub amount: f64,
}

/// Pure association between a meal and a recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealRecipeMap {
    pub id: Uuid,
    pub meal: Uuid,
    pub recipe: Uuid,
}

/// A scheduled interval for a user's meal; `end > start` always holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A meal added to a user's plan, with its schedule entries.
/// Unique per (user, meal).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMealMap {
    pub id: Uuid,
    pub user: Uuid,
    pub meal: Uuid,
    pub schedules: Vec<Schedule>,
}

impl UserGroceryMap {
    pub fn new(
        user: Uuid,
        grocery: Uuid,
        amount: f64,
        expires_date: DateTime<Utc>,
        is_in_buying_list: bool,
    ) -> Self {
        Self { id: Uuid::new_v4(), user, grocery, amount, expires_date, is_in_buying_list }
    }
}

impl RecipeGroceryMap {
    pub fn new(recipe: Uuid, grocery: Uuid, amount: f64) -> Self {
        Self { id: Uuid::new_v4(), recipe, grocery, amount }
    }
}

impl MealRecipeMap {
    pub fn new(meal: Uuid, recipe: Uuid) -> Self {
        Self { id: Uuid::new_v4(), meal, recipe }
    }
}

impl UserMealMap {
    pub fn new(user: Uuid, meal: Uuid) -> Self {
        Self { id: Uuid::new_v4(), user, meal, schedules: Vec::new() }
    }
}
