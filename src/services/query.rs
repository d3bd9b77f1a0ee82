// SPDX-License-Identifier: MIT

//! List parameter parsing, filtering, sorting, pagination, and the
//! denormalized read views.
//!
//! Query string values arrive as raw strings and are validated here rather
//! than at deserialization time, so a bad value yields a 400 with a message
//! instead of a generic rejection. Views join entities with their link rows
//! resolved inline; a dangling reference is logged and skipped, never an
//! error.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Grocery, Meal, Recipe, Schedule, User};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 5;

/// Query string as it arrives on list endpoints.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawListParams {
    pub name: Option<String>,
    pub min_kcal: Option<String>,
    pub max_kcal: Option<String>,
    pub min_time_cook: Option<String>,
    pub max_time_cook: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_name: Option<String>,
    pub sort_kcal: Option<String>,
    pub sort_time_cook: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Kcal,
    TimeCook,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Validated list parameters.
#[derive(Debug, Clone)]
pub struct ListParams {
    pub name: Option<String>,
    pub min_kcal: Option<f64>,
    pub max_kcal: Option<f64>,
    pub min_time_cook: Option<f64>,
    pub max_time_cook: Option<f64>,
    pub page: u64,
    pub limit: u64,
    pub sort: Option<(SortKey, SortDirection)>,
}

fn parse_number(field: &str, value: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| AppError::Validation(format!("{} must be a number", field)))
}

fn parse_positive(field: &str, value: &str) -> Result<u64> {
    value
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| AppError::Validation(format!("{} must be a positive integer", field)))
}

/// Accepts the direction spellings `asc`, `ascending`, `1` and `desc`,
/// `descending`, `-1`.
fn parse_direction(field: &str, value: &str) -> Result<SortDirection> {
    match value {
        "asc" | "ascending" | "1" => Ok(SortDirection::Ascending),
        "desc" | "descending" | "-1" => Ok(SortDirection::Descending),
        _ => Err(AppError::Validation(format!(
            "{} must be one of asc, ascending, 1, desc, descending, -1",
            field
        ))),
    }
}

impl RawListParams {
    pub fn validate(self) -> Result<ListParams> {
        let min_kcal = self
            .min_kcal
            .as_deref()
            .map(|v| parse_number("min_kcal", v))
            .transpose()?;
        let max_kcal = self
            .max_kcal
            .as_deref()
            .map(|v| parse_number("max_kcal", v))
            .transpose()?;
        let min_time_cook = self
            .min_time_cook
            .as_deref()
            .map(|v| parse_number("min_time_cook", v))
            .transpose()?;
        let max_time_cook = self
            .max_time_cook
            .as_deref()
            .map(|v| parse_number("max_time_cook", v))
            .transpose()?;

        let page = self
            .page
            .as_deref()
            .map(|v| parse_positive("page", v))
            .transpose()?
            .unwrap_or(DEFAULT_PAGE);
        let limit = self
            .limit
            .as_deref()
            .map(|v| parse_positive("limit", v))
            .transpose()?
            .unwrap_or(DEFAULT_LIMIT);

        let mut sort = None;
        let keys = [
            (SortKey::Name, "sort_name", self.sort_name.as_deref()),
            (SortKey::Kcal, "sort_kcal", self.sort_kcal.as_deref()),
            (SortKey::TimeCook, "sort_time_cook", self.sort_time_cook.as_deref()),
        ];
        for (key, field, value) in keys {
            if let Some(value) = value {
                if sort.is_some() {
                    return Err(AppError::Validation(
                        "at most one sort key may be given".to_string(),
                    ));
                }
                sort = Some((key, parse_direction(field, value)?));
            }
        }

        Ok(ListParams {
            name: self.name,
            min_kcal,
            max_kcal,
            min_time_cook,
            max_time_cook,
            page,
            limit,
            sort,
        })
    }
}

/// One page of results, with navigation hints and the unpaginated total.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub result: Vec<T>,
    #[serde(rename = "nextPage")]
    pub next_page: Option<u64>,
    #[serde(rename = "prevPage")]
    pub prev_page: Option<u64>,
    pub total: u64,
}

/// Field accessors so one filter/sort/paginate pipeline serves every entity
/// kind. `time_cook` is `None` for entities without a cook-time field;
/// asking to filter or sort on it there is a validation error.
pub struct ListFields<T> {
    pub name: fn(&T) -> &str,
    pub kcal: fn(&T) -> f64,
    pub time_cook: Option<fn(&T) -> f64>,
}

fn grocery_name(g: &Grocery) -> &str {
    &g.name
}
fn grocery_kcal(g: &Grocery) -> f64 {
    g.kcal_per_unit
}
fn recipe_name(r: &Recipe) -> &str {
    &r.name
}
fn recipe_kcal(r: &Recipe) -> f64 {
    r.kcal_per_serving
}
fn recipe_time_cook(r: &Recipe) -> f64 {
    r.time_to_cook as f64
}
fn meal_name(m: &Meal) -> &str {
    &m.name
}
fn meal_kcal(m: &Meal) -> f64 {
    m.total_kcal
}
fn meal_time_cook(m: &Meal) -> f64 {
    m.total_time_cook as f64
}

pub fn grocery_fields() -> ListFields<Grocery> {
    ListFields { name: grocery_name, kcal: grocery_kcal, time_cook: None }
}

pub fn recipe_fields() -> ListFields<Recipe> {
    ListFields { name: recipe_name, kcal: recipe_kcal, time_cook: Some(recipe_time_cook) }
}

pub fn meal_fields() -> ListFields<Meal> {
    ListFields { name: meal_name, kcal: meal_kcal, time_cook: Some(meal_time_cook) }
}

/// Filter, sort, and paginate a full collection snapshot.
pub fn apply<T>(mut items: Vec<T>, fields: &ListFields<T>, params: &ListParams) -> Result<Page<T>> {
    let wants_time = params.min_time_cook.is_some()
        || params.max_time_cook.is_some()
        || matches!(params.sort, Some((SortKey::TimeCook, _)));
    if wants_time && fields.time_cook.is_none() {
        return Err(AppError::Validation(
            "time_cook is not supported for this resource".to_string(),
        ));
    }

    if let Some(name) = &params.name {
        let needle = name.to_lowercase();
        items.retain(|item| (fields.name)(item).to_lowercase().contains(&needle));
    }
    if let Some(min) = params.min_kcal {
        items.retain(|item| (fields.kcal)(item) >= min);
    }
    if let Some(max) = params.max_kcal {
        items.retain(|item| (fields.kcal)(item) <= max);
    }
    if let Some(time_cook) = fields.time_cook {
        if let Some(min) = params.min_time_cook {
            items.retain(|item| time_cook(item) >= min);
        }
        if let Some(max) = params.max_time_cook {
            items.retain(|item| time_cook(item) <= max);
        }
    }

    if let Some((key, direction)) = params.sort {
        match key {
            SortKey::Name => items.sort_by(|a, b| (fields.name)(a).cmp((fields.name)(b))),
            SortKey::Kcal => items.sort_by(|a, b| {
                (fields.kcal)(a)
                    .partial_cmp(&(fields.kcal)(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
            SortKey::TimeCook => {
                // Checked above; entities without the field never get here.
                let time_cook = fields.time_cook.unwrap();
                items.sort_by(|a, b| {
                    time_cook(a)
                        .partial_cmp(&time_cook(b))
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            }
        }
        if direction == SortDirection::Descending {
            items.reverse();
        }
    }

    let total = items.len() as u64;
    let offset = params
        .page
        .checked_sub(1)
        .and_then(|p| p.checked_mul(params.limit))
        .ok_or_else(|| AppError::Validation("page is out of range".to_string()))?;
    let end_of_page = params
        .page
        .checked_mul(params.limit)
        .ok_or_else(|| AppError::Validation("page is out of range".to_string()))?;

    let result: Vec<T> = if offset >= total {
        items.truncate(0);
        items
    } else {
        items
            .into_iter()
            .skip(offset as usize)
            .take(params.limit as usize)
            .collect()
    };

    let next_page = if end_of_page < total { Some(params.page + 1) } else { None };
    let prev_page = if params.page > 1 { Some(params.page - 1) } else { None };

    Ok(Page { result, next_page, prev_page, total })
}

// ─── Denormalized views ──────────────────────────────────────────

/// Public projection of a user, embedded as `creator` in views.
#[derive(Debug, Clone, Serialize)]
pub struct CreatorView {
    pub id: Uuid,
    pub username: String,
}

impl From<User> for CreatorView {
    fn from(user: User) -> Self {
        Self { id: user.id, username: user.username }
    }
}

/// A grocery link inside a recipe view, with the grocery inlined.
#[derive(Debug, Serialize)]
pub struct RecipeGroceryView {
    pub id: Uuid,
    pub amount: f64,
    pub grocery: Grocery,
}

/// A recipe with its creator and grocery links resolved.
#[derive(Debug, Serialize)]
pub struct RecipeView {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub creator_info: Option<CreatorView>,
    pub groceries: Vec<RecipeGroceryView>,
}

/// A recipe link inside a meal view, with the recipe inlined.
#[derive(Debug, Serialize)]
pub struct MealRecipeView {
    pub id: Uuid,
    pub recipe: Recipe,
}

/// A meal with its creator and recipe links resolved.
#[derive(Debug, Serialize)]
pub struct MealView {
    #[serde(flatten)]
    pub meal: Meal,
    pub creator_info: Option<CreatorView>,
    pub recipes: Vec<MealRecipeView>,
}

/// A grocery with the recipes that consume it resolved.
#[derive(Debug, Serialize)]
pub struct GroceryView {
    #[serde(flatten)]
    pub grocery: Grocery,
    pub creator_info: Option<CreatorView>,
    pub recipes: Vec<Recipe>,
}

/// One wallet row with the grocery inlined.
#[derive(Debug, Serialize)]
pub struct WalletEntry {
    pub id: Uuid,
    pub amount: f64,
    pub expires_date: chrono::DateTime<chrono::Utc>,
    pub is_in_buying_list: bool,
    pub grocery: Grocery,
    /// `amount * kcal_per_unit`, precomputed for the client
    pub total_kcal: f64,
}

/// One plan row with the meal inlined.
#[derive(Debug, Serialize)]
pub struct PlanEntry {
    pub id: Uuid,
    pub schedules: Vec<Schedule>,
    pub meal: Meal,
}

async fn creator_view(db: &Database, creator: Uuid) -> Option<CreatorView> {
    let user = db.get_user(creator).await;
    if user.is_none() {
        tracing::warn!(user = %creator, "creator no longer exists; omitting from view");
    }
    user.map(CreatorView::from)
}

/// Resolve a recipe into a view with its groceries inlined.
pub async fn recipe_with_groceries(db: &Database, recipe: Recipe) -> RecipeView {
    let mut groceries = Vec::new();
    for map in db.recipe_grocery_maps_for_recipe(recipe.id).await {
        match db.get_grocery(map.grocery).await {
            Some(grocery) => {
                groceries.push(RecipeGroceryView { id: map.id, amount: map.amount, grocery })
            }
            None => {
                tracing::warn!(recipe = %recipe.id, grocery = %map.grocery, "dangling grocery reference in recipe view")
            }
        }
    }
    let creator_info = creator_view(db, recipe.creator).await;
    RecipeView { recipe, creator_info, groceries }
}

/// Resolve a meal into a view with its recipes inlined.
pub async fn meal_with_recipes(db: &Database, meal: Meal) -> MealView {
    let mut recipes = Vec::new();
    for map in db.meal_recipe_maps_for_meal(meal.id).await {
        match db.get_recipe(map.recipe).await {
            Some(recipe) => recipes.push(MealRecipeView { id: map.id, recipe }),
            None => {
                tracing::warn!(meal = %meal.id, recipe = %map.recipe, "dangling recipe reference in meal view")
            }
        }
    }
    let creator_info = creator_view(db, meal.creator).await;
    MealView { meal, creator_info, recipes }
}

/// Resolve a grocery into a view listing the recipes that use it.
pub async fn grocery_with_recipes(db: &Database, grocery: Grocery) -> GroceryView {
    let mut recipes = Vec::new();
    for map in db.recipe_grocery_maps_for_grocery(grocery.id).await {
        match db.get_recipe(map.recipe).await {
            Some(recipe) => recipes.push(recipe),
            None => {
                tracing::warn!(grocery = %grocery.id, recipe = %map.recipe, "dangling recipe reference in grocery view")
            }
        }
    }
    let creator_info = creator_view(db, grocery.creator).await;
    GroceryView { grocery, creator_info, recipes }
}

/// The caller's wallet, optionally restricted to buying-list rows.
pub async fn user_wallet(db: &Database, user_id: Uuid, buying_only: bool) -> Vec<WalletEntry> {
    let mut entries = Vec::new();
    for map in db.user_grocery_maps_for_user(user_id).await {
        if buying_only && !map.is_in_buying_list {
            continue;
        }
        match db.get_grocery(map.grocery).await {
            Some(grocery) => {
                let total_kcal = map.amount * grocery.kcal_per_unit;
                entries.push(WalletEntry {
                    id: map.id,
                    amount: map.amount,
                    expires_date: map.expires_date,
                    is_in_buying_list: map.is_in_buying_list,
                    grocery,
                    total_kcal,
                });
            }
            None => {
                tracing::warn!(user = %user_id, grocery = %map.grocery, "dangling grocery reference in wallet view")
            }
        }
    }
    entries
}

/// The caller's meal plan with schedules and meals inlined.
pub async fn user_plan(db: &Database, user_id: Uuid) -> Vec<PlanEntry> {
    let mut entries = Vec::new();
    for map in db.user_meal_maps_for_user(user_id).await {
        match db.get_meal(map.meal).await {
            Some(meal) => entries.push(PlanEntry { id: map.id, schedules: map.schedules, meal }),
            None => {
                tracing::warn!(user = %user_id, meal = %map.meal, "dangling meal reference in plan view")
            }
        }
    }
    entries
}
