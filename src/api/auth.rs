//! Authentication API endpoints
//!
//! Registration, email login, logout, and the current-user endpoint.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{RegisterInput, UserProfile};

/// Routes that do not require authentication
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Routes that require a valid session
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", axum::routing::get(me))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
struct TokenResponse {
    auth_token: String,
}

async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let user = state.user_service.register(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserProfile::from_user(&user, false)),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let session = state
        .user_service
        .login(&input.email, &input.password)
        .await?;
    Ok(Json(TokenResponse {
        auth_token: session.token,
    }))
}

async fn logout(
    State(state): State<AppState>,
    request: axum::extract::Request,
) -> Result<StatusCode, ApiError> {
    // The auth middleware has already validated the token
    if let Some(token) = crate::api::middleware::extract_session_token(&request) {
        state.user_service.logout(&token).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn me(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = state.user_service.profile(user.id, user.id).await?;
    Ok(Json(profile))
}
