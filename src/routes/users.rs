// SPDX-License-Identifier: MIT

//! User profile routes.

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Gender, User, UserInformation, PERMISSION_ADMIN};
use crate::routes::{success_result, Envelope, ResultBody};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/user", get(get_own_profile))
        .route("/api/user/information", put(update_information))
        .route("/api/user/{id}", get(get_user_by_id))
}

/// User as exposed by the API; the credential hash never leaves the server.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub permission_level: u8,
    pub information: UserInformation,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            permission_level: user.permission_level,
            information: user.information,
            created_at: user.created_at,
        }
    }
}

async fn get_own_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Envelope<ResultBody<UserResponse>>>> {
    let user = state
        .db
        .get_user(auth.user_id)
        .await
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(success_result(UserResponse::from(user)))
}

/// Admins may look up any profile; everyone else only their own.
async fn get_user_by_id(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<ResultBody<UserResponse>>>> {
    if id != auth.user_id && !auth.has_privilege(PERMISSION_ADMIN) {
        return Err(AppError::PermissionDenied);
    }
    let user = state
        .db
        .get_user(id)
        .await
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(success_result(UserResponse::from(user)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateInformationRequest {
    #[validate(range(min = 50.0, max = 280.0, message = "must be between 50 and 280 cm"))]
    pub height: Option<f64>,
    #[validate(range(min = 20.0, max = 500.0, message = "must be between 20 and 500 kg"))]
    pub weight: Option<f64>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<DateTime<Utc>>,
    #[validate(range(min = 500, max = 20000, message = "must be between 500 and 20000 kcal"))]
    pub daily_kcal_goal: Option<u32>,
}

async fn update_information(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<UpdateInformationRequest>,
) -> Result<Json<Envelope<ResultBody<UserResponse>>>> {
    req.validate()?;

    let mut tx = state.db.begin_transaction().await;
    let mut user = tx
        .get_user(auth.user_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if let Some(height) = req.height {
        user.information.height = height;
    }
    if let Some(weight) = req.weight {
        user.information.weight = weight;
    }
    if let Some(gender) = req.gender {
        user.information.gender = gender;
    }
    if let Some(dob) = req.date_of_birth {
        user.information.date_of_birth = dob;
    }
    if let Some(goal) = req.daily_kcal_goal {
        user.information.daily_kcal_goal = goal;
    }
    user.updated_at = Utc::now();

    tx.put_user(user.clone());
    tx.commit();

    tracing::info!(user = %auth.user_id, "User information updated");
    Ok(success_result(UserResponse::from(user)))
}
