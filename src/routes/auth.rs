// SPDX-License-Identifier: MIT

//! Registration, login, and logout.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE};
use crate::models::User;
use crate::routes::users::UserResponse;
use crate::routes::{success_result, Envelope, ResultBody};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", get(logout))
        .route("/api/auth/password", post(change_password))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 32, message = "must be 3 to 32 characters"))]
    pub username: String,
    #[validate(length(min = 8, max = 128, message = "must be 8 to 128 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<Envelope<ResultBody<UserResponse>>>> {
    req.validate()?;

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))?
        .to_string();

    let user = User::new(req.username, password_hash);

    let mut tx = state.db.begin_transaction().await;
    tx.insert_user(user.clone())?;
    tx.commit();

    tracing::info!(user = %user.id, username = %user.username, "User registered");
    Ok(success_result(UserResponse::from(user)))
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<Envelope<ResultBody<UserResponse>>>)> {
    // A wrong username and a wrong password answer identically.
    let user = state
        .db
        .find_user_by_username(&req.username)
        .await
        .ok_or(AppError::Unauthorized)?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Stored hash unreadable: {}", e)))?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::Unauthorized)?;

    let token = create_jwt(user.id, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    tracing::info!(user = %user.id, "User logged in");
    Ok((jar.add(cookie), success_result(UserResponse::from(user))))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub username: String,
    pub current_password: String,
    #[validate(length(min = 8, max = 128, message = "must be 8 to 128 characters"))]
    pub new_password: String,
}

/// Re-hash and store a new password after verifying the current one.
/// Takes explicit credentials rather than a session so a leaked cookie
/// cannot rotate the password on its own.
async fn change_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<Envelope<ResultBody<&'static str>>>> {
    req.validate()?;

    let user = state
        .db
        .find_user_by_username(&req.username)
        .await
        .ok_or(AppError::Unauthorized)?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Stored hash unreadable: {}", e)))?;
    Argon2::default()
        .verify_password(req.current_password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::Unauthorized)?;

    let salt = SaltString::generate(&mut OsRng);
    let new_hash = Argon2::default()
        .hash_password(req.new_password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))?
        .to_string();

    let mut tx = state.db.begin_transaction().await;
    let mut user = tx
        .get_user(user.id)
        .cloned()
        .ok_or(AppError::Unauthorized)?;
    user.password_hash = new_hash;
    user.updated_at = chrono::Utc::now();
    tx.put_user(user);
    tx.commit();

    tracing::info!(username = %req.username, "Password changed");
    Ok(success_result("password changed"))
}

async fn logout(jar: CookieJar) -> (CookieJar, Json<Envelope<ResultBody<&'static str>>>) {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .build();
    (jar.remove(cookie), success_result("logged out"))
}
