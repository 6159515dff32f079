//! Recipe API endpoints
//!
//! Browsing, authoring, favorites, the shopping cart, and the shopping
//! list download.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::PageResponse;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, MaybeUser};
use crate::db::repositories::RelationKind;
use crate::models::{
    ListParams, RecipeIngredientView, RecipeInput, RecipeSummary, RecipeView, Tag, UserProfile,
};
use crate::services::RecipeQuery;

/// Routes readable without authentication
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_recipes))
        .route("/{id}", get(get_recipe))
}

/// Routes that require a valid session
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_recipe))
        .route(
            "/{id}",
            axum::routing::put(update_recipe)
                .patch(update_recipe)
                .delete(delete_recipe),
        )
        .route("/{id}/favorite", post(add_favorite).delete(remove_favorite))
        .route(
            "/{id}/shopping_cart",
            post(add_to_cart).delete(remove_from_cart),
        )
        .route("/download_shopping_cart", get(download_shopping_cart))
}

/// Full recipe payload returned by the browse and authoring endpoints
#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub author: UserProfile,
    pub ingredients: Vec<RecipeIngredientView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
}

impl From<RecipeView> for RecipeResponse {
    fn from(view: RecipeView) -> Self {
        Self {
            id: view.recipe.id,
            tags: view.tags,
            author: view.author,
            ingredients: view.ingredients,
            is_favorited: view.is_favorited,
            is_in_shopping_cart: view.is_in_shopping_cart,
            name: view.recipe.name,
            image: view.recipe.image,
            text: view.recipe.text,
            cooking_time: view.recipe.cooking_time,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RecipeListQuery {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_limit")]
    limit: u32,
    author: Option<i64>,
    /// Comma-separated tag slugs
    tags: Option<String>,
    is_favorited: Option<u8>,
    is_in_shopping_cart: Option<u8>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

async fn list_recipes(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Query(query): Query<RecipeListQuery>,
) -> Result<Json<PageResponse<RecipeResponse>>, ApiError> {
    let viewer_id = viewer.viewer_id();

    let tag_slugs = query
        .tags
        .as_deref()
        .map(|tags| {
            tags.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    // The list filters are viewer-relative, so they only apply when a
    // session is present
    let service_query = RecipeQuery {
        author_id: query.author,
        tag_slugs,
        favorited_only: query.is_favorited == Some(1) && viewer_id > 0,
        in_cart_only: query.is_in_shopping_cart == Some(1) && viewer_id > 0,
        pagination: ListParams::new(query.page, query.limit),
    };

    let page = state.recipe_service.list(&service_query, viewer_id).await?;
    Ok(Json(PageResponse::from_page(page, RecipeResponse::from)))
}

async fn get_recipe(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<i64>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let view = state.recipe_service.get(id, viewer.viewer_id()).await?;
    Ok(Json(RecipeResponse::from(view)))
}

async fn create_recipe(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(input): Json<RecipeInput>,
) -> Result<(StatusCode, Json<RecipeResponse>), ApiError> {
    let view = state.recipe_service.create(user.id, input).await?;
    Ok((StatusCode::CREATED, Json(RecipeResponse::from(view))))
}

async fn update_recipe(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(input): Json<RecipeInput>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let view = state.recipe_service.update(id, user.id, input).await?;
    Ok(Json(RecipeResponse::from(view)))
}

async fn delete_recipe(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.recipe_service.delete(id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_favorite(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<RecipeSummary>), ApiError> {
    let summary = state
        .relation_service
        .add(RelationKind::Favorite, user.id, id)
        .await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

async fn remove_favorite(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .relation_service
        .remove(RelationKind::Favorite, user.id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_to_cart(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<RecipeSummary>), ApiError> {
    let summary = state
        .relation_service
        .add(RelationKind::ShoppingCart, user.id, id)
        .await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

async fn remove_from_cart(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .relation_service
        .remove(RelationKind::ShoppingCart, user.id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn download_shopping_cart(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Response, ApiError> {
    let text = state.relation_service.shopping_list_text(user.id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"shopping_list.txt\"",
            ),
        ],
        text,
    )
        .into_response())
}
