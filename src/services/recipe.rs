//! Recipe service
//!
//! Business logic for the recipe authoring and browsing workflow. Create and
//! update run the full validation pipeline, resolve catalog references,
//! decode inline images, and hand the repository an atomic write. Reads
//! assemble the denormalized view (tags, author profile, ingredient rows,
//! viewer flags) the API returns.

use crate::db::repositories::{
    IngredientRepository, RecipeFilter, RecipeRepository, SubscriptionRepository, TagRepository,
    UserRepository,
};
use crate::models::{
    ListParams, NewRecipe, PagedResult, RecipeInput, RecipeUpdate, RecipeView, RecipeWithFlags,
    UserProfile, ValidRecipe,
};
use crate::services::image::{ImageError, ImageStore};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Error types for recipe service operations
#[derive(Debug, thiserror::Error)]
pub enum RecipeServiceError {
    /// Invalid input, keyed by field name
    #[error("Validation failed")]
    Validation(BTreeMap<String, String>),

    /// Recipe does not exist
    #[error("Recipe not found")]
    NotFound,

    /// The acting user is not the recipe's author
    #[error("Only the author may modify this recipe")]
    Forbidden,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ImageError> for RecipeServiceError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::Storage(e) => RecipeServiceError::Internal(e),
            other => {
                let mut details = BTreeMap::new();
                details.insert("image".to_string(), other.to_string());
                RecipeServiceError::Validation(details)
            }
        }
    }
}

/// Listing filters accepted by [`RecipeService::list`]
#[derive(Debug, Clone, Default)]
pub struct RecipeQuery {
    pub author_id: Option<i64>,
    pub tag_slugs: Vec<String>,
    pub favorited_only: bool,
    pub in_cart_only: bool,
    pub pagination: ListParams,
}

/// Recipe service wiring the authoring workflow together
pub struct RecipeService {
    recipe_repo: Arc<dyn RecipeRepository>,
    tag_repo: Arc<dyn TagRepository>,
    ingredient_repo: Arc<dyn IngredientRepository>,
    user_repo: Arc<dyn UserRepository>,
    subscription_repo: Arc<dyn SubscriptionRepository>,
    images: Arc<ImageStore>,
}

impl RecipeService {
    pub fn new(
        recipe_repo: Arc<dyn RecipeRepository>,
        tag_repo: Arc<dyn TagRepository>,
        ingredient_repo: Arc<dyn IngredientRepository>,
        user_repo: Arc<dyn UserRepository>,
        subscription_repo: Arc<dyn SubscriptionRepository>,
        images: Arc<ImageStore>,
    ) -> Self {
        Self {
            recipe_repo,
            tag_repo,
            ingredient_repo,
            user_repo,
            subscription_repo,
            images,
        }
    }

    /// Create a recipe for the author. Runs validation, resolves catalog
    /// references, stores the inline image, and writes atomically.
    pub async fn create(
        &self,
        author_id: i64,
        input: RecipeInput,
    ) -> Result<RecipeView, RecipeServiceError> {
        let valid = input
            .validate(true)
            .map_err(RecipeServiceError::Validation)?;
        self.check_references(&valid).await?;

        // validate(true) guarantees the image is present
        let image = valid.image.clone().unwrap_or_default();
        let stored_image = self.images.store_inline(&image, "recipes")?;

        let recipe = self
            .recipe_repo
            .create(&NewRecipe {
                name: valid.name,
                text: valid.text,
                cooking_time: valid.cooking_time,
                image: stored_image,
                author_id,
                tag_ids: valid.tag_ids,
                ingredients: valid.ingredients,
            })
            .await
            .context("Failed to create recipe")?;

        self.assemble_view(
            RecipeWithFlags {
                recipe,
                is_favorited: false,
                is_in_shopping_cart: false,
            },
            author_id,
        )
        .await
    }

    /// Replace a recipe. Only the author may update; the tag and ingredient
    /// sets are rebuilt from scratch, and an absent image keeps the stored
    /// one.
    pub async fn update(
        &self,
        recipe_id: i64,
        actor_id: i64,
        input: RecipeInput,
    ) -> Result<RecipeView, RecipeServiceError> {
        let existing = self
            .recipe_repo
            .get(recipe_id, actor_id)
            .await
            .context("Failed to load recipe")?
            .ok_or(RecipeServiceError::NotFound)?;

        if existing.recipe.author_id != actor_id {
            return Err(RecipeServiceError::Forbidden);
        }

        let valid = input
            .validate(false)
            .map_err(RecipeServiceError::Validation)?;
        self.check_references(&valid).await?;

        let stored_image = match &valid.image {
            Some(value) => Some(self.images.store_inline(value, "recipes")?),
            None => None,
        };

        let updated = self
            .recipe_repo
            .replace(
                recipe_id,
                &RecipeUpdate {
                    name: valid.name,
                    text: valid.text,
                    cooking_time: valid.cooking_time,
                    image: stored_image.clone(),
                    tag_ids: valid.tag_ids,
                    ingredients: valid.ingredients,
                },
            )
            .await
            .context("Failed to update recipe")?
            .ok_or(RecipeServiceError::NotFound)?;

        if stored_image.is_some() && updated.image != existing.recipe.image {
            self.images.remove(&existing.recipe.image);
        }

        self.assemble_view(
            RecipeWithFlags {
                recipe: updated,
                is_favorited: existing.is_favorited,
                is_in_shopping_cart: existing.is_in_shopping_cart,
            },
            actor_id,
        )
        .await
    }

    /// Delete a recipe. Only the author may delete.
    pub async fn delete(&self, recipe_id: i64, actor_id: i64) -> Result<(), RecipeServiceError> {
        let existing = self
            .recipe_repo
            .get(recipe_id, 0)
            .await
            .context("Failed to load recipe")?
            .ok_or(RecipeServiceError::NotFound)?;

        if existing.recipe.author_id != actor_id {
            return Err(RecipeServiceError::Forbidden);
        }

        self.recipe_repo
            .delete(recipe_id)
            .await
            .context("Failed to delete recipe")?;
        self.images.remove(&existing.recipe.image);

        Ok(())
    }

    /// Fetch a single recipe view; flags are evaluated for the viewer
    /// (zero for anonymous).
    pub async fn get(
        &self,
        recipe_id: i64,
        viewer_id: i64,
    ) -> Result<RecipeView, RecipeServiceError> {
        let found = self
            .recipe_repo
            .get(recipe_id, viewer_id)
            .await
            .context("Failed to get recipe")?
            .ok_or(RecipeServiceError::NotFound)?;

        self.assemble_view(found, viewer_id).await
    }

    /// List recipes newest-first with pagination and filters
    pub async fn list(
        &self,
        query: &RecipeQuery,
        viewer_id: i64,
    ) -> Result<PagedResult<RecipeView>, RecipeServiceError> {
        let pages = query.pagination;

        let filter = RecipeFilter {
            viewer_id,
            author_id: query.author_id,
            tag_slugs: query.tag_slugs.clone(),
            favorited_by: query.favorited_only.then_some(viewer_id),
            in_cart_of: query.in_cart_only.then_some(viewer_id),
        };

        let total = self
            .recipe_repo
            .count(&filter)
            .await
            .context("Failed to count recipes")?;
        let rows = self
            .recipe_repo
            .list(&filter, pages.offset(), pages.limit as i64)
            .await
            .context("Failed to list recipes")?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(self.assemble_view(row, viewer_id).await?);
        }

        Ok(PagedResult {
            items,
            total,
            page: pages.page,
            limit: pages.limit,
        })
    }

    /// Verify every referenced tag and ingredient exists in the catalogs
    async fn check_references(&self, valid: &ValidRecipe) -> Result<(), RecipeServiceError> {
        for tag_id in &valid.tag_ids {
            if self
                .tag_repo
                .get_by_id(*tag_id)
                .await
                .context("Failed to check tag")?
                .is_none()
            {
                let mut details = BTreeMap::new();
                details.insert("tags".to_string(), format!("Unknown tag id {}", tag_id));
                return Err(RecipeServiceError::Validation(details));
            }
        }

        for pair in &valid.ingredients {
            if self
                .ingredient_repo
                .get_by_id(pair.id)
                .await
                .context("Failed to check ingredient")?
                .is_none()
            {
                let mut details = BTreeMap::new();
                details.insert(
                    "ingredients".to_string(),
                    format!("Unknown ingredient id {}", pair.id),
                );
                return Err(RecipeServiceError::Validation(details));
            }
        }

        Ok(())
    }

    async fn assemble_view(
        &self,
        found: RecipeWithFlags,
        viewer_id: i64,
    ) -> Result<RecipeView, RecipeServiceError> {
        let tags = self
            .tag_repo
            .list_by_recipe(found.recipe.id)
            .await
            .context("Failed to load recipe tags")?;
        let ingredients = self
            .recipe_repo
            .ingredients_of(found.recipe.id)
            .await
            .context("Failed to load recipe ingredients")?;

        let author = self
            .user_repo
            .get_by_id(found.recipe.author_id)
            .await
            .context("Failed to load recipe author")?
            .ok_or_else(|| anyhow::anyhow!("Recipe author {} missing", found.recipe.author_id))?;

        let is_subscribed = if viewer_id > 0 && viewer_id != author.id {
            self.subscription_repo
                .exists(viewer_id, author.id)
                .await
                .context("Failed to check subscription")?
        } else {
            false
        };

        Ok(RecipeView {
            recipe: found.recipe,
            tags,
            author: UserProfile::from_user(&author, is_subscribed),
            ingredients,
            is_favorited: found.is_favorited,
            is_in_shopping_cart: found.is_in_shopping_cart,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::db::repositories::{
        SqlxIngredientRepository, SqlxRecipeRepository, SqlxSubscriptionRepository,
        SqlxTagRepository, SqlxUserRepository,
    };
    use crate::models::{Ingredient, IngredientAmount, NewUser, Tag};
    use sqlx::SqlitePool;

    struct Fixture {
        service: RecipeService,
        pool: SqlitePool,
        author_id: i64,
        tag_ids: Vec<i64>,
        ingredient_ids: Vec<i64>,
    }

    async fn fixture() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        let users = SqlxUserRepository::new(pool.clone());
        let author_id = users
            .create(&NewUser {
                email: "chef@example.com".to_string(),
                username: "chef".to_string(),
                first_name: "C".to_string(),
                last_name: "H".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
            .id;

        let tags = SqlxTagRepository::new(pool.clone());
        let mut tag_ids = Vec::new();
        for (name, slug) in [("Breakfast", "breakfast"), ("Dinner", "dinner")] {
            tag_ids.push(
                tags.create(&Tag::new(name.to_string(), slug.to_string()))
                    .await
                    .unwrap()
                    .id,
            );
        }

        let ingredients = SqlxIngredientRepository::new(pool.clone());
        let mut ingredient_ids = Vec::new();
        for (name, unit) in [("flour", "g"), ("egg", "pcs")] {
            ingredient_ids.push(
                ingredients
                    .create(&Ingredient::new(name.to_string(), unit.to_string()))
                    .await
                    .unwrap()
                    .id,
            );
        }

        let images = Arc::new(ImageStore::new(
            tempfile::tempdir().unwrap().keep(),
            1024 * 1024,
        ));
        let service = RecipeService::new(
            SqlxRecipeRepository::boxed(pool.clone()),
            SqlxTagRepository::boxed(pool.clone()),
            SqlxIngredientRepository::boxed(pool.clone()),
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSubscriptionRepository::boxed(pool.clone()),
            images,
        );

        Fixture {
            service,
            pool,
            author_id,
            tag_ids,
            ingredient_ids,
        }
    }

    const TINY_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    fn input(fx: &Fixture) -> RecipeInput {
        RecipeInput {
            name: Some("Pancakes".to_string()),
            text: Some("Mix and fry.".to_string()),
            cooking_time: Some(20),
            image: Some(TINY_PNG.to_string()),
            tags: Some(fx.tag_ids.clone()),
            ingredients: Some(vec![
                IngredientAmount {
                    id: fx.ingredient_ids[0],
                    amount: 100,
                },
                IngredientAmount {
                    id: fx.ingredient_ids[1],
                    amount: 2,
                },
            ]),
        }
    }

    #[tokio::test]
    async fn test_create_decodes_image_and_returns_view() {
        let fx = fixture().await;
        let view = fx.service.create(fx.author_id, input(&fx)).await.unwrap();

        assert_eq!(view.recipe.name, "Pancakes");
        assert!(view.recipe.image.starts_with("/media/recipes/"));
        assert_eq!(view.tags.len(), 2);
        assert_eq!(view.ingredients.len(), 2);
        assert_eq!(view.author.username, "chef");
        assert!(!view.is_favorited);
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_references() {
        let fx = fixture().await;

        let mut bad_tag = input(&fx);
        bad_tag.tags = Some(vec![9999]);
        match fx.service.create(fx.author_id, bad_tag).await {
            Err(RecipeServiceError::Validation(errors)) => {
                assert!(errors.contains_key("tags"));
            }
            _ => panic!("Expected validation error"),
        }

        let mut bad_ingredient = input(&fx);
        bad_ingredient.ingredients = Some(vec![IngredientAmount { id: 9999, amount: 5 }]);
        match fx.service.create(fx.author_id, bad_ingredient).await {
            Err(RecipeServiceError::Validation(errors)) => {
                assert!(errors.contains_key("ingredients"));
            }
            _ => panic!("Expected validation error"),
        }
    }

    #[tokio::test]
    async fn test_create_requires_image() {
        let fx = fixture().await;
        let mut no_image = input(&fx);
        no_image.image = None;

        match fx.service.create(fx.author_id, no_image).await {
            Err(RecipeServiceError::Validation(errors)) => {
                assert!(errors.contains_key("image"));
            }
            _ => panic!("Expected validation error"),
        }
    }

    #[tokio::test]
    async fn test_update_replaces_sets_and_keeps_image() {
        let fx = fixture().await;
        let created = fx.service.create(fx.author_id, input(&fx)).await.unwrap();

        let mut update = input(&fx);
        update.name = Some("Crepes".to_string());
        update.image = None;
        update.tags = Some(vec![fx.tag_ids[1]]);
        update.ingredients = Some(vec![IngredientAmount {
            id: fx.ingredient_ids[0],
            amount: 200,
        }]);

        let updated = fx
            .service
            .update(created.recipe.id, fx.author_id, update)
            .await
            .unwrap();

        assert_eq!(updated.recipe.name, "Crepes");
        assert_eq!(updated.recipe.image, created.recipe.image);
        assert_eq!(updated.tags.len(), 1);
        assert_eq!(updated.tags[0].slug, "dinner");
        assert_eq!(updated.ingredients.len(), 1);
        assert_eq!(updated.ingredients[0].amount, 200);
    }

    #[tokio::test]
    async fn test_update_forbidden_for_non_author() {
        let fx = fixture().await;
        let created = fx.service.create(fx.author_id, input(&fx)).await.unwrap();

        let users = SqlxUserRepository::new(fx.pool.clone());
        let other_id = users
            .create(&NewUser {
                email: "other@example.com".to_string(),
                username: "other".to_string(),
                first_name: "O".to_string(),
                last_name: "T".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
            .id;

        let result = fx
            .service
            .update(created.recipe.id, other_id, input(&fx))
            .await;
        assert!(matches!(result, Err(RecipeServiceError::Forbidden)));

        let result = fx.service.delete(created.recipe.id, other_id).await;
        assert!(matches!(result, Err(RecipeServiceError::Forbidden)));
    }

    #[tokio::test]
    async fn test_update_missing_recipe_not_found() {
        let fx = fixture().await;
        let result = fx.service.update(9999, fx.author_id, input(&fx)).await;
        assert!(matches!(result, Err(RecipeServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_by_author() {
        let fx = fixture().await;
        let created = fx.service.create(fx.author_id, input(&fx)).await.unwrap();

        fx.service
            .delete(created.recipe.id, fx.author_id)
            .await
            .unwrap();
        let result = fx.service.get(created.recipe.id, 0).await;
        assert!(matches!(result, Err(RecipeServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_paginates_and_filters() {
        let fx = fixture().await;
        for name in ["One", "Two", "Three"] {
            let mut i = input(&fx);
            i.name = Some(name.to_string());
            fx.service.create(fx.author_id, i).await.unwrap();
        }

        let page = fx
            .service
            .list(
                &RecipeQuery {
                    pagination: ListParams::new(1, 2),
                    ..Default::default()
                },
                0,
            )
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].recipe.name, "Three");
        assert_eq!(page.total_pages(), 2);

        let by_author = fx
            .service
            .list(
                &RecipeQuery {
                    author_id: Some(fx.author_id),
                    pagination: ListParams::new(1, 10),
                    ..Default::default()
                },
                0,
            )
            .await
            .unwrap();
        assert_eq!(by_author.total, 3);
    }
}
