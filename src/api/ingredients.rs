//! Ingredient catalog API endpoints

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::models::Ingredient;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_ingredients))
        .route("/{id}", get(get_ingredient))
}

#[derive(Debug, Deserialize)]
struct IngredientQuery {
    /// Name prefix for typeahead search
    name: Option<String>,
}

async fn list_ingredients(
    State(state): State<AppState>,
    Query(query): Query<IngredientQuery>,
) -> Result<Json<Vec<Ingredient>>, ApiError> {
    let ingredients = state
        .ingredient_repo
        .list(query.name.as_deref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list ingredients");
            ApiError::internal_error("Internal server error")
        })?;
    Ok(Json(ingredients))
}

async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Ingredient>, ApiError> {
    let ingredient = state
        .ingredient_repo
        .get_by_id(id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to get ingredient");
            ApiError::internal_error("Internal server error")
        })?
        .ok_or_else(|| ApiError::not_found("Ingredient not found"))?;
    Ok(Json(ingredient))
}
