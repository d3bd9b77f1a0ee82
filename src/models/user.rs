// SPDX-License-Identifier: MIT

//! User model: identity, profile, and back-reference sets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Permission levels are monotonic: a lower number is strictly more
/// privileged. Authorization checks compare `level <= required`, never
/// equality.
pub const PERMISSION_ADMIN: u8 = 0;
pub const PERMISSION_TRUSTED: u8 = 1;
pub const PERMISSION_STANDARD: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Profile data, mutated by the owner or an admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInformation {
    /// Height in cm
    pub height: f64,
    /// Weight in kg
    pub weight: f64,
    pub gender: Gender,
    pub date_of_birth: DateTime<Utc>,
    /// Daily calorie goal in kcal
    pub daily_kcal_goal: u32,
}

impl Default for UserInformation {
    fn default() -> Self {
        Self {
            height: 160.0,
            weight: 60.0,
            gender: Gender::Female,
            date_of_birth: Utc::now(),
            daily_kcal_goal: 2000,
        }
    }
}

/// A registered user. Never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Unique login name
    pub username: String,
    /// Opaque credential hash; never serialized into API responses
    /// (handlers project users through response DTOs).
    pub password_hash: String,
    pub permission_level: u8,
    pub information: UserInformation,
    /// Ids of the user's UserGroceryMap rows (derived index over the join
    /// table, maintained transactionally alongside it).
    pub user_grocery_maps: Vec<Uuid>,
    /// Ids of the user's UserMealMap rows
    pub user_meal_maps: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            password_hash: password_hash.into(),
            permission_level: PERMISSION_STANDARD,
            information: UserInformation::default(),
            user_grocery_maps: Vec::new(),
            user_meal_maps: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
