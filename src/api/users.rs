//! User API endpoints
//!
//! Public profiles, author subscriptions, and the current user's avatar.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::PageResponse;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, MaybeUser};
use crate::models::{ListParams, SubscribedUser, UserProfile};

/// Routes readable without authentication
pub fn public_router() -> Router<AppState> {
    Router::new().route("/{id}", get(get_profile))
}

/// Routes that require a valid session
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/subscriptions", get(list_subscriptions))
        .route("/{id}/subscribe", post(subscribe).delete(unsubscribe))
        .route("/me/avatar", put(set_avatar).delete(remove_avatar))
}

#[derive(Debug, Deserialize)]
struct SubscriptionListQuery {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_limit")]
    limit: u32,
    recipes_limit: Option<i64>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
struct SubscribeQuery {
    recipes_limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct AvatarRequest {
    #[serde(default)]
    avatar: String,
}

#[derive(Debug, Serialize)]
struct AvatarResponse {
    avatar: String,
}

async fn get_profile(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<i64>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = state.user_service.profile(id, viewer.viewer_id()).await?;
    Ok(Json(profile))
}

async fn list_subscriptions(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<SubscriptionListQuery>,
) -> Result<Json<PageResponse<SubscribedUser>>, ApiError> {
    let page = state
        .subscription_service
        .list(
            user.id,
            ListParams::new(query.page, query.limit),
            query.recipes_limit,
        )
        .await?;
    Ok(Json(PageResponse::from_page(page, |entry| entry)))
}

async fn subscribe(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Query(query): Query<SubscribeQuery>,
) -> Result<(StatusCode, Json<SubscribedUser>), ApiError> {
    let entry = state
        .subscription_service
        .subscribe(user.id, id, query.recipes_limit)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn unsubscribe(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.subscription_service.unsubscribe(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_avatar(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(input): Json<AvatarRequest>,
) -> Result<Json<AvatarResponse>, ApiError> {
    let avatar = state.user_service.set_avatar(user.id, &input.avatar).await?;
    Ok(Json(AvatarResponse { avatar }))
}

async fn remove_avatar(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<StatusCode, ApiError> {
    state.user_service.remove_avatar(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
