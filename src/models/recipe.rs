// SPDX-License-Identifier: MIT

//! Recipe model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_DIFFICULTY: u8 = 5;
pub const DEFAULT_TIME_MINUTES: u32 = 60;
pub const DEFAULT_BODY: &str = "You didn't upload this recipe detail";

/// A recipe authored by a user. Names are not unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Uuid,
    pub name: String,
    /// 0 (trivial) to 10 (hard)
    pub difficulty: u8,
    /// Minutes
    pub time_to_cook: u32,
    /// Minutes
    pub time_to_prepare: u32,
    pub kcal_per_serving: f64,
    /// Free-text instructions
    pub recipe_in_text: String,
    pub creator: Uuid,
    /// Ids of RecipeGroceryMap rows referencing this recipe
    pub recipe_grocery_maps: Vec<Uuid>,
    /// Ids of MealRecipeMap rows referencing this recipe
    pub meal_recipe_maps: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    pub fn new(name: impl Into<String>, creator: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            difficulty: DEFAULT_DIFFICULTY,
            time_to_cook: DEFAULT_TIME_MINUTES,
            time_to_prepare: DEFAULT_TIME_MINUTES,
            kcal_per_serving: 0.0,
            recipe_in_text: DEFAULT_BODY.to_string(),
            creator,
            recipe_grocery_maps: Vec::new(),
            meal_recipe_maps: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
