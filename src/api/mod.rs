//! API layer - HTTP handlers and routing
//!
//! All HTTP endpoints of the recipe platform:
//! - Authentication (register, login, logout, current user)
//! - Tag and ingredient catalogs
//! - Recipe browsing and authoring
//! - Favorites and the shopping cart
//! - Author subscriptions and avatars
//! - Media file serving

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod common;
pub mod ingredients;
pub mod middleware;
pub mod recipes;
pub mod tags;
pub mod users;

pub use middleware::{ApiError, AppState, AuthenticatedUser, MaybeUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Protected routes (need a valid session)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/users", users::protected_router())
        .nest("/recipes", recipes::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes; optional auth so viewer-relative flags resolve when a
    // session is present
    let public_routes = Router::new()
        .nest("/auth", auth::public_router())
        .nest("/tags", tags::router())
        .nest("/ingredients", ingredients::router())
        .nest("/users", users::public_router())
        .nest("/recipes", recipes::public_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::optional_auth,
        ));

    Router::new().merge(protected_routes).merge(public_routes)
}

/// Build the complete router with middleware and media serving
pub fn build_router(state: AppState, cors_origin: &str, media_root: &std::path::Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            cors_origin
                .parse::<HeaderValue>()
                .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000")),
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .nest_service("/media", ServeDir::new(media_root))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
