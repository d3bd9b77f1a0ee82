// SPDX-License-Identifier: MIT

//! Grocery model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Measurement unit for a grocery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Kg,
    /// Uncounted dry goods (sugar, flour, meat)
    Grams,
    /// Liquids (milk, oil)
    Liter,
    Ml,
    /// Counted goods (eggs, tomatoes)
    Number,
    Unit,
}

impl std::str::FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kg" => Ok(Unit::Kg),
            "grams" => Ok(Unit::Grams),
            "liter" => Ok(Unit::Liter),
            "ml" => Ok(Unit::Ml),
            "number" => Ok(Unit::Number),
            "unit" => Ok(Unit::Unit),
            other => Err(format!("unknown unit '{}'", other)),
        }
    }
}

/// A grocery item. Name is globally unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grocery {
    pub id: Uuid,
    pub name: String,
    pub unit: Unit,
    /// Calories per unit, always > 0
    pub kcal_per_unit: f64,
    /// Opaque reference handed out by the image store
    pub image_path: String,
    pub creator: Uuid,
    /// Ids of UserGroceryMap rows referencing this grocery
    pub user_grocery_maps: Vec<Uuid>,
    /// Ids of RecipeGroceryMap rows referencing this grocery
    pub recipe_grocery_maps: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Grocery {
    pub fn new(
        name: impl Into<String>,
        unit: Unit,
        kcal_per_unit: f64,
        image_path: impl Into<String>,
        creator: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            unit,
            kcal_per_unit,
            image_path: image_path.into(),
            creator,
            user_grocery_maps: Vec::new(),
            recipe_grocery_maps: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
