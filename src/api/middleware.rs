//! API middleware
//!
//! Session-token authentication middleware, the shared application state,
//! and the JSON error envelope every endpoint responds with.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::db::repositories::{IngredientRepository, TagRepository};
use crate::models::User;
use crate::services::{
    RecipeService, RecipeServiceError, RelationService, RelationServiceError, SubscriptionService,
    SubscriptionServiceError, UserService, UserServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub recipe_service: Arc<RecipeService>,
    pub relation_service: Arc<RelationService>,
    pub subscription_service: Arc<SubscriptionService>,
    pub tag_repo: Arc<dyn TagRepository>,
    pub ingredient_repo: Arc<dyn IngredientRepository>,
}

/// Authenticated user extracted from request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Optionally-authenticated user for endpoints that serve anonymous viewers
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    /// Viewer id for flag evaluation, zero when anonymous
    pub fn viewer_id(&self) -> i64 {
        self.0.as_ref().map(|u| u.id).unwrap_or(0)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(
            parts
                .extensions
                .get::<AuthenticatedUser>()
                .map(|au| au.0.clone()),
        ))
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    /// Validation error carrying the per-field message map
    pub fn validation_fields(fields: BTreeMap<String, String>) -> Self {
        let details = serde_json::to_value(&fields).unwrap_or_default();
        Self::with_details("VALIDATION_ERROR", "Validation failed", details)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::Validation(fields) => ApiError::validation_fields(fields),
            UserServiceError::Conflict(message) => ApiError::conflict(message),
            UserServiceError::Authentication => {
                ApiError::unauthorized("Invalid email or password")
            }
            UserServiceError::NotFound => ApiError::not_found("User not found"),
            UserServiceError::Internal(e) => {
                tracing::error!(error = %e, "User service error");
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<RecipeServiceError> for ApiError {
    fn from(err: RecipeServiceError) -> Self {
        match err {
            RecipeServiceError::Validation(fields) => ApiError::validation_fields(fields),
            RecipeServiceError::NotFound => ApiError::not_found("Recipe not found"),
            RecipeServiceError::Forbidden => {
                ApiError::forbidden("Only the author may modify this recipe")
            }
            RecipeServiceError::Internal(e) => {
                tracing::error!(error = %e, "Recipe service error");
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<RelationServiceError> for ApiError {
    fn from(err: RelationServiceError) -> Self {
        match err {
            RelationServiceError::RecipeNotFound => ApiError::not_found("Recipe not found"),
            RelationServiceError::AlreadyInList => {
                ApiError::conflict("Recipe is already in the list")
            }
            RelationServiceError::NotInList => ApiError::conflict("Recipe is not in the list"),
            RelationServiceError::Internal(e) => {
                tracing::error!(error = %e, "Relation service error");
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<SubscriptionServiceError> for ApiError {
    fn from(err: SubscriptionServiceError) -> Self {
        match err {
            SubscriptionServiceError::UserNotFound => ApiError::not_found("User not found"),
            SubscriptionServiceError::SelfSubscription => {
                ApiError::conflict("Cannot subscribe to yourself")
            }
            SubscriptionServiceError::AlreadySubscribed => ApiError::conflict("Already subscribed"),
            SubscriptionServiceError::NotSubscribed => ApiError::conflict("Not subscribed"),
            SubscriptionServiceError::Internal(e) => {
                tracing::error!(error = %e, "Subscription service error");
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

/// Extract session token from request headers: Bearer first, then the
/// session cookie
pub(crate) fn extract_session_token(request: &Request) -> Option<String> {
    if let Some(auth_header) = request.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = request.headers().get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state
        .user_service
        .validate_session(&token)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Optional authentication middleware for endpoints anonymous viewers may hit
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_session_token(&request) {
        if let Ok(Some(user)) = state.user_service.validate_session(&token).await {
            request.extensions_mut().insert(AuthenticatedUser(user));
        }
    }
    next.run(request).await
}
