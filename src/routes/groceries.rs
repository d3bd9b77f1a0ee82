// SPDX-License-Identifier: MIT

//! Grocery catalog, wallet, and buying-list routes.

use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Grocery, Unit, UserGroceryMap, PERMISSION_TRUSTED};
use crate::routes::{success, success_result, Envelope, ResultBody};
use crate::services::{cascade, links, query};
use crate::AppState;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/grocery", get(list_groceries))
        .route("/api/grocery/{id}", get(get_grocery))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/grocery", post(create_grocery))
        .route("/api/grocery/{id}", put(update_grocery))
        .route("/api/grocery/{id}", delete(delete_grocery))
        .route("/api/grocery/user", get(get_wallet))
        .route("/api/grocery/user/buying_list", get(get_buying_list))
        .route("/api/grocery/user", post(add_to_wallet))
        .route("/api/grocery/user/{map_id}", delete(remove_from_wallet))
}

async fn list_groceries(
    State(state): State<Arc<AppState>>,
    Query(raw): Query<query::RawListParams>,
) -> Result<Json<Envelope<query::Page<Grocery>>>> {
    let params = raw.validate()?;
    let page = query::apply(state.db.list_groceries().await, &query::grocery_fields(), &params)?;
    Ok(success(page))
}

async fn get_grocery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<ResultBody<query::GroceryView>>>> {
    let grocery = state
        .db
        .get_grocery(id)
        .await
        .ok_or_else(|| AppError::NotFound("Grocery not found".to_string()))?;
    Ok(success_result(query::grocery_with_recipes(&state.db, grocery).await))
}

/// Create a grocery from a multipart form carrying the image file plus the
/// `name`, `unit`, and `kcal_per_unit` fields. Trusted users and up only.
async fn create_grocery(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<Envelope<ResultBody<Grocery>>>> {
    if !auth.has_privilege(PERMISSION_TRUSTED) {
        return Err(AppError::PermissionDenied);
    }

    let mut name = None;
    let mut unit = None;
    let mut kcal_per_unit = None;
    let mut image: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed form data: {}", e)))?
    {
        match field.name() {
            Some("name") => {
                name = Some(field.text().await.map_err(bad_field)?);
            }
            Some("unit") => {
                let raw = field.text().await.map_err(bad_field)?;
                unit = Some(Unit::from_str(&raw).map_err(AppError::Validation)?);
            }
            Some("kcal_per_unit") => {
                let raw = field.text().await.map_err(bad_field)?;
                kcal_per_unit = Some(
                    raw.parse::<f64>()
                        .map_err(|_| AppError::Validation("kcal_per_unit must be a number".to_string()))?,
                );
            }
            Some("image") => {
                let file_name = field
                    .file_name()
                    .map(|n| n.to_string())
                    .ok_or_else(|| AppError::Validation("Image file name is missing".to_string()))?;
                let bytes = field.bytes().await.map_err(bad_field)?;
                image = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let name = name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::Validation("name is required".to_string()))?;
    let unit = unit.ok_or_else(|| AppError::Validation("unit is required".to_string()))?;
    let kcal_per_unit = kcal_per_unit
        .filter(|k| *k > 0.0)
        .ok_or_else(|| AppError::Validation("kcal_per_unit must be greater than zero".to_string()))?;
    let (file_name, bytes) =
        image.ok_or_else(|| AppError::Validation("image is required".to_string()))?;

    // The file lands on disk before the store write; undo it if that fails.
    let image_path = state.images.save(&file_name, &bytes).await?;

    let grocery = Grocery::new(name, unit, kcal_per_unit, image_path.clone(), auth.user_id);
    let mut tx = state.db.begin_transaction().await;
    match tx.insert_grocery(grocery.clone()) {
        Ok(()) => tx.commit(),
        Err(e) => {
            drop(tx);
            state.images.remove(&image_path).await;
            return Err(e);
        }
    }

    tracing::info!(grocery = %grocery.id, name = %grocery.name, "Grocery created");
    Ok(success_result(grocery))
}

fn bad_field(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Malformed form field: {}", e))
}

#[derive(Debug, Deserialize)]
pub struct UpdateGroceryRequest {
    pub name: Option<String>,
    pub unit: Option<Unit>,
    pub kcal_per_unit: Option<f64>,
}

async fn update_grocery(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateGroceryRequest>,
) -> Result<Json<Envelope<ResultBody<Grocery>>>> {
    let mut tx = state.db.begin_transaction().await;
    let mut grocery = tx
        .get_grocery(id)
        .cloned()
        .ok_or_else(|| AppError::NotFound("Grocery not found".to_string()))?;
    if !auth.can_act_on(grocery.creator) {
        return Err(AppError::PermissionDenied);
    }

    if let Some(name) = req.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".to_string()));
        }
        if tx.grocery_name_taken(&name, Some(id)) {
            return Err(AppError::Conflict("Grocery already exists".to_string()));
        }
        grocery.name = name;
    }
    if let Some(unit) = req.unit {
        grocery.unit = unit;
    }
    if let Some(kcal) = req.kcal_per_unit {
        if kcal <= 0.0 {
            return Err(AppError::Validation(
                "kcal_per_unit must be greater than zero".to_string(),
            ));
        }
        grocery.kcal_per_unit = kcal;
    }
    grocery.updated_at = Utc::now();

    tx.put_grocery(grocery.clone());
    tx.commit();

    tracing::info!(grocery = %id, "Grocery updated");
    Ok(success_result(grocery))
}

async fn delete_grocery(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<ResultBody<&'static str>>>> {
    let image_path = cascade::delete_grocery(&state.db, &auth, id).await?;
    state.images.remove(&image_path).await;
    Ok(success_result("deleted"))
}

async fn get_wallet(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Envelope<ResultBody<Vec<query::WalletEntry>>>>> {
    Ok(success_result(query::user_wallet(&state.db, auth.user_id, false).await))
}

async fn get_buying_list(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Envelope<ResultBody<Vec<query::WalletEntry>>>>> {
    Ok(success_result(query::user_wallet(&state.db, auth.user_id, true).await))
}

#[derive(Debug, Deserialize)]
pub struct AddToWalletRequest {
    pub grocery: Uuid,
    pub amount: f64,
    pub expires_date: DateTime<Utc>,
    #[serde(default)]
    pub is_in_buying_list: bool,
}

async fn add_to_wallet(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<AddToWalletRequest>,
) -> Result<Json<Envelope<ResultBody<UserGroceryMap>>>> {
    if req.amount <= 0.0 {
        return Err(AppError::Validation("amount must be greater than zero".to_string()));
    }
    let map = links::add_grocery_to_wallet(
        &state.db,
        auth.user_id,
        req.grocery,
        req.amount,
        req.expires_date,
        req.is_in_buying_list,
    )
    .await?;
    Ok(success_result(map))
}

async fn remove_from_wallet(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(map_id): Path<Uuid>,
) -> Result<Json<Envelope<ResultBody<&'static str>>>> {
    links::remove_grocery_from_wallet(&state.db, auth.user_id, map_id).await?;
    Ok(success_result("removed"))
}
