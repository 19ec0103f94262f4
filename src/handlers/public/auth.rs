// handlers/public/auth.rs - POST /api/auth/login, POST /api/auth/register

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::database::models::user::{LoginRequest, RegisterRequest};
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::auth_service::LoginResponse;
use crate::services::AuthService;
use crate::state::AppState;

/// POST /api/auth/login - exchange `{username, password}` for `{token, user}`
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(request) = body.map_err(ApiError::from)?;
    let session = AuthService::new(&state).login(request).await?;
    Ok(ApiResponse::success(session).with_message("Login successful"))
}

/// POST /api/auth/register - create an admin user
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<User> {
    let Json(request) = body.map_err(ApiError::from)?;
    let user = AuthService::new(&state).register(request).await?;
    Ok(ApiResponse::created(user).with_message("User registered successfully"))
}
