// SPDX-License-Identifier: MIT

//! JWT authentication middleware.

use crate::models::PERMISSION_ADMIN;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "pantry_token";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated identity extracted from a JWT and re-resolved against the
/// store. The core trusts this identity completely.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub permission_level: u8,
}

impl AuthUser {
    /// True when the caller's level is at least as privileged as
    /// `required` (lower is more privileged).
    pub fn has_privilege(&self, required: u8) -> bool {
        self.permission_level <= required
    }

    /// Admins may act on anything; everyone else only on what they created.
    pub fn can_act_on(&self, creator: Uuid) -> bool {
        self.has_privilege(PERMISSION_ADMIN) || self.user_id == creator
    }
}

/// Middleware that requires valid JWT authentication.
///
/// The token owner is looked up in the store; a token for a user that no
/// longer exists is rejected.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // Try cookie first, then header
    let token = if let Some(cookie) = jar.get(SESSION_COOKIE) {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header {
            Some(h) if h.starts_with("Bearer ") => h[7..].to_string(),
            _ => return Err(StatusCode::UNAUTHORIZED),
        }
    };

    let key = DecodingKey::from_secret(&state.config.jwt_signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data =
        decode::<Claims>(&token, &key, &validation).map_err(|_| StatusCode::UNAUTHORIZED)?;

    let user_id: Uuid = token_data
        .claims
        .sub
        .parse()
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let user = state
        .db
        .get_user(user_id)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let auth_user = AuthUser {
        user_id: user.id,
        permission_level: user.permission_level,
    };
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Create a JWT for a user session (24h expiry).
pub fn create_jwt(user_id: Uuid, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + 24 * 60 * 60,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PERMISSION_STANDARD, PERMISSION_TRUSTED};

    #[test]
    fn privilege_comparison_is_monotonic() {
        let admin = AuthUser { user_id: Uuid::new_v4(), permission_level: PERMISSION_ADMIN };
        let standard = AuthUser { user_id: Uuid::new_v4(), permission_level: PERMISSION_STANDARD };

        // An admin clears every bar, including ones that "require" less.
        assert!(admin.has_privilege(PERMISSION_TRUSTED));
        assert!(admin.has_privilege(PERMISSION_STANDARD));
        assert!(!standard.has_privilege(PERMISSION_TRUSTED));
    }

    #[test]
    fn creator_may_act_on_own_entity() {
        let creator = Uuid::new_v4();
        let owner = AuthUser { user_id: creator, permission_level: PERMISSION_STANDARD };
        let other = AuthUser { user_id: Uuid::new_v4(), permission_level: PERMISSION_STANDARD };

        assert!(owner.can_act_on(creator));
        assert!(!other.can_act_on(creator));
    }
}
