use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AppError;
use crate::state::{AppState, AuthConfig};

/// Cookie set by the storefront after login.
pub const AUTH_COOKIE: &str = "authToken";

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    #[serde(alias = "userId")]
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}

/// Bearer header first, then the auth cookie.
fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

pub fn decode_claims(auth: &AuthConfig, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::AuthenticationError(format!("Invalid token: {}", e)))
}

fn require_claims(auth: &AuthConfig, headers: &HeaderMap) -> Result<Claims, AppError> {
    let token = token_from_headers(headers)
        .ok_or_else(|| AppError::AuthenticationError("Authentication required".to_string()))?;
    decode_claims(auth, &token)
}

/// Claims for endpoints open to guests. A bad token is treated as no token.
pub fn optional_claims(auth: &AuthConfig, headers: &HeaderMap) -> Option<Claims> {
    let token = token_from_headers(headers)?;
    match decode_claims(auth, &token) {
        Ok(claims) => Some(claims),
        Err(_) => {
            warn!("Ignoring invalid token on guest-capable request");
            None
        }
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Any signed-in user (admins included).
pub async fn user_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = require_claims(&state.auth, req.headers())?;
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = require_claims(&state.auth, req.headers())?;

    if claims.role != Role::Admin {
        return Err(AppError::AuthorizationError("Admin access required".to_string()));
    }

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
