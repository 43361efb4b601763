use aeris_core::repository::UserRepository;
use aeris_core::{CoreError, CoreResult, Identity};
use aeris_shared::models::user::normalize_email;
use aeris_shared::User;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::middleware::auth::{issue_token, Claims};
use crate::password::{hash_password, verify_password};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;
const MIN_NAME_LEN: usize = 2;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(alias = "display_name")]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct RegisterResponse {
    message: &'static str,
    user: User,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    user: User,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Needs the customer auth layer.
pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/profile", get(profile))
}

fn validate_registration(req: &RegisterRequest) -> CoreResult<()> {
    let email = req.email.trim();
    let valid_email = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid_email {
        return Err(CoreError::ValidationError("a valid email is required".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CoreError::ValidationError(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if req.name.trim().chars().count() < MIN_NAME_LEN {
        return Err(CoreError::ValidationError(format!(
            "name must be at least {} characters",
            MIN_NAME_LEN
        )));
    }
    Ok(())
}

/// POST /api/register
async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    validate_registration(&req)?;

    let email = normalize_email(&req.email);
    let is_admin = state
        .auth
        .admin_emails
        .iter()
        .any(|admin| normalize_email(admin) == email);

    let password_hash = hash_password(req.password, state.auth.bcrypt_cost).await?;
    let user = User::new(email, password_hash, req.name.trim().to_string(), is_admin);
    state.users.insert_user(&user).await?;

    info!("User {} registered (admin: {})", user.id, user.is_admin);
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully",
            user,
        }),
    ))
}

/// POST /api/login
async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, AppError>,
) -> Result<Json<AuthResponse>, AppError> {
    let invalid = || CoreError::Unauthorized("Invalid credentials".to_string());

    let user = state
        .users
        .find_user_by_email(&req.email)
        .await?
        .ok_or_else(invalid)?;
    if !verify_password(req.password, user.password_hash.expose().clone()).await? {
        return Err(invalid().into());
    }

    let claims = Claims::for_user(&user, state.auth.expiration, state.clock.now());
    let token = issue_token(&claims, &state.auth.secret)?;

    info!("User {} logged in", user.id);
    Ok(Json(AuthResponse { token, user }))
}

/// GET /api/profile
async fn profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<User>, AppError> {
    let user = state
        .users
        .get_user(identity.user_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("user {}", identity.user_id)))?;
    Ok(Json(user))
}
