// SPDX-License-Identifier: MIT

//! Domain models: primary entities and the join entities linking them.

pub mod grocery;
pub mod maps;
pub mod meal;
pub mod recipe;
pub mod user;

pub use grocery::{Grocery, Unit};
pub use maps::{MealRecipeMap, RecipeGroceryMap, Schedule, UserGroceryMap, UserMealMap};
pub use meal::Meal;
pub use recipe::Recipe;
pub use user::{Gender, User, UserInformation};
pub use user::{PERMISSION_ADMIN, PERMISSION_STANDARD, PERMISSION_TRUSTED};
