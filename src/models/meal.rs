// SPDX-License-Identifier: MIT

//! Meal model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A meal assembled from recipes and scheduled by users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meal {
    pub id: Uuid,
    pub name: String,
    /// Minutes
    pub total_time_cook: u32,
    pub total_kcal: f64,
    pub creator: Uuid,
    /// Ids of MealRecipeMap rows referencing this meal
    pub meal_recipe_maps: Vec<Uuid>,
    /// Ids of UserMealMap rows referencing this meal
    pub user_meal_maps: Vec<Uuid>,
}

impl Meal {
    pub fn new(
        name: impl Into<String>,
        total_time_cook: u32,
        total_kcal: f64,
        creator: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            total_time_cook,
            total_kcal,
            creator,
            meal_recipe_maps: Vec::new(),
            user_meal_maps: Vec::new(),
        }
    }
}
