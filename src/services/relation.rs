//! Favorites and shopping cart
//!
//! The two user-recipe lists share one toggle shape: adding an already-listed
//! recipe or removing an unlisted one is an error the API reports as a bad
//! request, and adding returns the compact recipe preview. The shopping cart
//! additionally renders as an aggregated plain-text shopping list.

use crate::db::repositories::{RecipeRepository, RelationKind, RelationRepository};
use crate::models::RecipeSummary;
use anyhow::{Context, Result};
use std::fmt::Write;
use std::sync::Arc;

/// Error types for favorite and cart operations
#[derive(Debug, thiserror::Error)]
pub enum RelationServiceError {
    /// Recipe does not exist
    #[error("Recipe not found")]
    RecipeNotFound,

    /// The recipe is already in the list
    #[error("Recipe is already in the list")]
    AlreadyInList,

    /// The recipe is not in the list
    #[error("Recipe is not in the list")]
    NotInList,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Service for favorite and shopping-cart toggles
pub struct RelationService {
    relation_repo: Arc<dyn RelationRepository>,
    recipe_repo: Arc<dyn RecipeRepository>,
}

impl RelationService {
    pub fn new(
        relation_repo: Arc<dyn RelationRepository>,
        recipe_repo: Arc<dyn RecipeRepository>,
    ) -> Self {
        Self {
            relation_repo,
            recipe_repo,
        }
    }

    /// Add a recipe to the user's list, returning its preview
    pub async fn add(
        &self,
        kind: RelationKind,
        user_id: i64,
        recipe_id: i64,
    ) -> Result<RecipeSummary, RelationServiceError> {
        let recipe = self
            .recipe_repo
            .get(recipe_id, 0)
            .await
            .context("Failed to load recipe")?
            .ok_or(RelationServiceError::RecipeNotFound)?;

        let inserted = self
            .relation_repo
            .add(kind, user_id, recipe_id)
            .await
            .context("Failed to add relation")?;
        if !inserted {
            return Err(RelationServiceError::AlreadyInList);
        }

        Ok(RecipeSummary::from(&recipe.recipe))
    }

    /// Remove a recipe from the user's list
    pub async fn remove(
        &self,
        kind: RelationKind,
        user_id: i64,
        recipe_id: i64,
    ) -> Result<(), RelationServiceError> {
        if self
            .recipe_repo
            .get(recipe_id, 0)
            .await
            .context("Failed to load recipe")?
            .is_none()
        {
            return Err(RelationServiceError::RecipeNotFound);
        }

        let removed = self
            .relation_repo
            .remove(kind, user_id, recipe_id)
            .await
            .context("Failed to remove relation")?;
        if !removed {
            return Err(RelationServiceError::NotInList);
        }

        Ok(())
    }

    /// Render the user's cart as a plain-text shopping list, one line per
    /// distinct ingredient with amounts summed across recipes
    pub async fn shopping_list_text(&self, user_id: i64) -> Result<String, RelationServiceError> {
        let entries = self
            .relation_repo
            .shopping_list(user_id)
            .await
            .context("Failed to aggregate shopping list")?;

        let mut text = String::new();
        for entry in entries {
            writeln!(
                text,
                "{}: {} {}",
                entry.name, entry.total_amount, entry.measurement_unit
            )
            .expect("writing to String cannot fail");
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::db::repositories::{
        SqlxIngredientRepository, SqlxRecipeRepository, SqlxRelationRepository,
        SqlxUserRepository, IngredientRepository, UserRepository,
    };
    use crate::models::{Ingredient, IngredientAmount, NewRecipe, NewUser};
    use sqlx::SqlitePool;

    struct Fixture {
        service: RelationService,
        pool: SqlitePool,
        user_id: i64,
        flour_id: i64,
        egg_id: i64,
    }

    async fn fixture() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        let users = SqlxUserRepository::new(pool.clone());
        let user_id = users
            .create(&NewUser {
                email: "u@example.com".to_string(),
                username: "user".to_string(),
                first_name: "U".to_string(),
                last_name: "S".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
            .id;

        let ingredients = SqlxIngredientRepository::new(pool.clone());
        let flour_id = ingredients
            .create(&Ingredient::new("flour".to_string(), "g".to_string()))
            .await
            .unwrap()
            .id;
        let egg_id = ingredients
            .create(&Ingredient::new("egg".to_string(), "pcs".to_string()))
            .await
            .unwrap()
            .id;

        let service = RelationService::new(
            SqlxRelationRepository::boxed(pool.clone()),
            SqlxRecipeRepository::boxed(pool.clone()),
        );

        Fixture {
            service,
            pool,
            user_id,
            flour_id,
            egg_id,
        }
    }

    async fn seed_recipe(fx: &Fixture, name: &str, ingredients: Vec<IngredientAmount>) -> i64 {
        let recipes = SqlxRecipeRepository::new(fx.pool.clone());
        recipes
            .create(&NewRecipe {
                name: name.to_string(),
                text: "Cook.".to_string(),
                cooking_time: 10,
                image: "/media/recipes/x.png".to_string(),
                author_id: fx.user_id,
                tag_ids: vec![],
                ingredients,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_add_returns_preview_and_rejects_duplicates() {
        let fx = fixture().await;
        let recipe_id = seed_recipe(
            &fx,
            "Bread",
            vec![IngredientAmount {
                id: fx.flour_id,
                amount: 500,
            }],
        )
        .await;

        let preview = fx
            .service
            .add(RelationKind::Favorite, fx.user_id, recipe_id)
            .await
            .unwrap();
        assert_eq!(preview.name, "Bread");
        assert_eq!(preview.id, recipe_id);

        let again = fx
            .service
            .add(RelationKind::Favorite, fx.user_id, recipe_id)
            .await;
        assert!(matches!(again, Err(RelationServiceError::AlreadyInList)));
    }

    #[tokio::test]
    async fn test_add_missing_recipe_not_found() {
        let fx = fixture().await;
        let result = fx
            .service
            .add(RelationKind::ShoppingCart, fx.user_id, 9999)
            .await;
        assert!(matches!(result, Err(RelationServiceError::RecipeNotFound)));
    }

    #[tokio::test]
    async fn test_remove_paths() {
        let fx = fixture().await;
        let recipe_id = seed_recipe(
            &fx,
            "Bread",
            vec![IngredientAmount {
                id: fx.flour_id,
                amount: 500,
            }],
        )
        .await;

        let not_listed = fx
            .service
            .remove(RelationKind::Favorite, fx.user_id, recipe_id)
            .await;
        assert!(matches!(not_listed, Err(RelationServiceError::NotInList)));

        fx.service
            .add(RelationKind::Favorite, fx.user_id, recipe_id)
            .await
            .unwrap();
        fx.service
            .remove(RelationKind::Favorite, fx.user_id, recipe_id)
            .await
            .unwrap();

        let missing = fx
            .service
            .remove(RelationKind::Favorite, fx.user_id, 9999)
            .await;
        assert!(matches!(missing, Err(RelationServiceError::RecipeNotFound)));
    }

    #[tokio::test]
    async fn test_shopping_list_text_sums_and_sorts() {
        let fx = fixture().await;
        let pancakes = seed_recipe(
            &fx,
            "Pancakes",
            vec![
                IngredientAmount {
                    id: fx.flour_id,
                    amount: 100,
                },
                IngredientAmount {
                    id: fx.egg_id,
                    amount: 2,
                },
            ],
        )
        .await;
        let bread = seed_recipe(
            &fx,
            "Bread",
            vec![IngredientAmount {
                id: fx.flour_id,
                amount: 50,
            }],
        )
        .await;

        for recipe_id in [pancakes, bread] {
            fx.service
                .add(RelationKind::ShoppingCart, fx.user_id, recipe_id)
                .await
                .unwrap();
        }

        let text = fx.service.shopping_list_text(fx.user_id).await.unwrap();
        assert_eq!(text, "egg: 2 pcs\nflour: 150 g\n");
    }

    #[tokio::test]
    async fn test_empty_cart_renders_empty_list() {
        let fx = fixture().await;
        let text = fx.service.shopping_list_text(fx.user_id).await.unwrap();
        assert!(text.is_empty());
    }
}
