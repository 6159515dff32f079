//! Cookbook - a recipe sharing backend

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cookbook::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            SqlxIngredientRepository, SqlxRecipeRepository, SqlxRelationRepository,
            SqlxSessionRepository, SqlxSubscriptionRepository, SqlxTagRepository,
            SqlxUserRepository,
        },
    },
    services::{
        seed, ImageStore, RecipeService, RelationService, SubscriptionService, UserService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cookbook=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database.url).await?;
    tracing::info!(url = %config.database.url, "Database connected");

    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let tag_repo = SqlxTagRepository::boxed(pool.clone());
    let ingredient_repo = SqlxIngredientRepository::boxed(pool.clone());
    let recipe_repo = SqlxRecipeRepository::boxed(pool.clone());
    let relation_repo = SqlxRelationRepository::boxed(pool.clone());
    let subscription_repo = SqlxSubscriptionRepository::boxed(pool.clone());

    // `cookbook seed <catalog.csv>` loads the ingredient catalog and exits
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("seed") {
        let csv_path = args
            .get(2)
            .context("Usage: cookbook seed <catalog.csv>")?;
        let report =
            seed::load_catalog(&tag_repo, &ingredient_repo, Path::new(csv_path)).await?;
        tracing::info!(
            added = report.ingredients_added,
            skipped = report.ingredients_skipped,
            "Seeding finished"
        );
        return Ok(());
    }

    // Services
    let images = Arc::new(ImageStore::new(
        config.media.root.clone(),
        config.media.max_image_bytes,
    ));
    let user_service = Arc::new(UserService::new(
        user_repo.clone(),
        session_repo,
        subscription_repo.clone(),
        images.clone(),
    ));
    let recipe_service = Arc::new(RecipeService::new(
        recipe_repo.clone(),
        tag_repo.clone(),
        ingredient_repo.clone(),
        user_repo.clone(),
        subscription_repo.clone(),
        images.clone(),
    ));
    let relation_service = Arc::new(RelationService::new(relation_repo, recipe_repo.clone()));
    let subscription_service = Arc::new(SubscriptionService::new(
        subscription_repo,
        user_repo,
        recipe_repo,
    ));

    let state = AppState {
        user_service,
        recipe_service,
        relation_service,
        subscription_service,
        tag_repo,
        ingredient_repo,
    };

    // Start expired session cleanup task (runs hourly)
    {
        let users = state.user_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
            loop {
                interval.tick().await;
                match users.cleanup_expired_sessions().await {
                    Ok(removed) if removed > 0 => {
                        tracing::info!(removed, "Removed expired sessions");
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "Session cleanup failed"),
                }
            }
        });
    }

    let app = api::build_router(state, &config.server.cors_origin, &config.media.root);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, "Cookbook API listening");

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
