use aeris_core::{Identity, Role};
use aeris_shared::User;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    RequestExt,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub exp: usize,
}

impl Claims {
    pub fn for_user(user: &User, ttl_seconds: u64, now: DateTime<Utc>) -> Self {
        let role = if user.is_admin { Role::Admin } else { Role::Customer };
        let expires = i64::try_from(ttl_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            sub: user.id.to_string(),
            email: user.email.expose().clone(),
            role: role.as_str().to_string(),
            exp: expires.timestamp().max(0) as usize,
        }
    }

    pub fn identity(&self) -> Result<Identity, AppError> {
        let user_id = Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::Unauthenticated("Invalid token subject".to_string()))?;
        let role = self.role.parse::<Role>()?;
        Ok(Identity { user_id, role })
    }
}

pub fn issue_token(claims: &Claims, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Anyhow(anyhow::anyhow!("Token encoding failed: {}", e)))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthenticated("Invalid or expired token".to_string()))
}

async fn authenticate(state: &AppState, req: &mut Request) -> Result<Identity, AppError> {
    let TypedHeader(Authorization(bearer)) = req
        .extract_parts::<TypedHeader<Authorization<Bearer>>>()
        .await
        .map_err(|_| AppError::Unauthenticated("Missing bearer token".to_string()))?;

    verify_token(bearer.token(), &state.auth.secret)?.identity()
}

// ============================================================================
// Customer Authentication Middleware
// ============================================================================

/// Any valid session. Injects the caller's `Identity`.
pub async fn customer_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = authenticate(&state, &mut req).await?;
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

// ============================================================================
// Admin Authentication Middleware
// ============================================================================

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = authenticate(&state, &mut req).await?;
    identity.require_admin()?;
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
