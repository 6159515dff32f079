//! Subscription service
//!
//! Following recipe authors. Subscribing to yourself or twice to the same
//! author is rejected; listings return each followed author with a preview
//! of their recipes and a total count.

use crate::db::repositories::{RecipeRepository, SubscriptionRepository, UserRepository};
use crate::models::{ListParams, PagedResult, SubscribedUser, User, UserProfile};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Error types for subscription operations
#[derive(Debug, thiserror::Error)]
pub enum SubscriptionServiceError {
    /// Target user does not exist
    #[error("User not found")]
    UserNotFound,

    /// Users cannot subscribe to themselves
    #[error("Cannot subscribe to yourself")]
    SelfSubscription,

    /// Already subscribed to this author
    #[error("Already subscribed")]
    AlreadySubscribed,

    /// No subscription to remove
    #[error("Not subscribed")]
    NotSubscribed,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Service for following authors
pub struct SubscriptionService {
    subscription_repo: Arc<dyn SubscriptionRepository>,
    user_repo: Arc<dyn UserRepository>,
    recipe_repo: Arc<dyn RecipeRepository>,
}

impl SubscriptionService {
    pub fn new(
        subscription_repo: Arc<dyn SubscriptionRepository>,
        user_repo: Arc<dyn UserRepository>,
        recipe_repo: Arc<dyn RecipeRepository>,
    ) -> Self {
        Self {
            subscription_repo,
            user_repo,
            recipe_repo,
        }
    }

    /// Subscribe to an author, returning their entry with a recipe preview
    pub async fn subscribe(
        &self,
        follower_id: i64,
        author_id: i64,
        recipes_limit: Option<i64>,
    ) -> Result<SubscribedUser, SubscriptionServiceError> {
        if follower_id == author_id {
            return Err(SubscriptionServiceError::SelfSubscription);
        }

        let author = self
            .user_repo
            .get_by_id(author_id)
            .await
            .context("Failed to load user")?
            .ok_or(SubscriptionServiceError::UserNotFound)?;

        let inserted = self
            .subscription_repo
            .add(follower_id, author_id)
            .await
            .context("Failed to add subscription")?;
        if !inserted {
            return Err(SubscriptionServiceError::AlreadySubscribed);
        }

        self.entry_for(&author, recipes_limit).await
    }

    /// Remove a subscription
    pub async fn unsubscribe(
        &self,
        follower_id: i64,
        author_id: i64,
    ) -> Result<(), SubscriptionServiceError> {
        if self
            .user_repo
            .get_by_id(author_id)
            .await
            .context("Failed to load user")?
            .is_none()
        {
            return Err(SubscriptionServiceError::UserNotFound);
        }

        let removed = self
            .subscription_repo
            .remove(follower_id, author_id)
            .await
            .context("Failed to remove subscription")?;
        if !removed {
            return Err(SubscriptionServiceError::NotSubscribed);
        }

        Ok(())
    }

    /// Page through the authors the user follows, each with a capped recipe
    /// preview and total recipe count
    pub async fn list(
        &self,
        follower_id: i64,
        pages: ListParams,
        recipes_limit: Option<i64>,
    ) -> Result<PagedResult<SubscribedUser>, SubscriptionServiceError> {
        let total = self
            .subscription_repo
            .count_followed(follower_id)
            .await
            .context("Failed to count subscriptions")?;

        let authors = self
            .subscription_repo
            .followed_of(follower_id, pages.offset(), pages.limit as i64)
            .await
            .context("Failed to list followed authors")?;

        let mut items = Vec::with_capacity(authors.len());
        for author in &authors {
            items.push(self.entry_for(author, recipes_limit).await?);
        }

        Ok(PagedResult {
            items,
            total,
            page: pages.page,
            limit: pages.limit,
        })
    }

    async fn entry_for(
        &self,
        author: &User,
        recipes_limit: Option<i64>,
    ) -> Result<SubscribedUser, SubscriptionServiceError> {
        // A zero or negative limit means no cap on the preview
        let recipes_limit = recipes_limit.filter(|limit| *limit > 0);
        let recipes = self
            .recipe_repo
            .summaries_by_author(author.id, recipes_limit)
            .await
            .context("Failed to load author recipes")?;
        let recipes_count = self
            .recipe_repo
            .count_by_author(author.id)
            .await
            .context("Failed to count author recipes")?;

        Ok(SubscribedUser {
            profile: UserProfile::from_user(author, true),
            recipes,
            recipes_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::db::repositories::{
        SqlxRecipeRepository, SqlxSubscriptionRepository, SqlxUserRepository, RecipeRepository,
        UserRepository,
    };
    use crate::models::{NewRecipe, NewUser};
    use sqlx::SqlitePool;

    struct Fixture {
        service: SubscriptionService,
        pool: SqlitePool,
        follower_id: i64,
        author_id: i64,
    }

    async fn fixture() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        let users = SqlxUserRepository::new(pool.clone());
        let mut ids = Vec::new();
        for (email, username) in [("me@example.com", "me"), ("chef@example.com", "chef")] {
            ids.push(
                users
                    .create(&NewUser {
                        email: email.to_string(),
                        username: username.to_string(),
                        first_name: "T".to_string(),
                        last_name: "U".to_string(),
                        password_hash: "hash".to_string(),
                    })
                    .await
                    .unwrap()
                    .id,
            );
        }

        let service = SubscriptionService::new(
            SqlxSubscriptionRepository::boxed(pool.clone()),
            SqlxUserRepository::boxed(pool.clone()),
            SqlxRecipeRepository::boxed(pool.clone()),
        );

        Fixture {
            service,
            pool,
            follower_id: ids[0],
            author_id: ids[1],
        }
    }

    async fn seed_recipes(fx: &Fixture, count: usize) {
        let recipes = SqlxRecipeRepository::new(fx.pool.clone());
        for i in 0..count {
            recipes
                .create(&NewRecipe {
                    name: format!("Recipe {}", i),
                    text: "Cook.".to_string(),
                    cooking_time: 10,
                    image: "/media/recipes/x.png".to_string(),
                    author_id: fx.author_id,
                    tag_ids: vec![],
                    ingredients: vec![],
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_subscribe_returns_author_entry() {
        let fx = fixture().await;
        seed_recipes(&fx, 3).await;

        let entry = fx
            .service
            .subscribe(fx.follower_id, fx.author_id, Some(2))
            .await
            .unwrap();
        assert_eq!(entry.profile.username, "chef");
        assert!(entry.profile.is_subscribed);
        assert_eq!(entry.recipes.len(), 2);
        assert_eq!(entry.recipes_count, 3);
    }

    #[tokio::test]
    async fn test_zero_recipes_limit_means_unlimited_preview() {
        let fx = fixture().await;
        seed_recipes(&fx, 2).await;

        let entry = fx
            .service
            .subscribe(fx.follower_id, fx.author_id, Some(0))
            .await
            .unwrap();
        assert_eq!(entry.recipes.len(), 2);

        let page = fx
            .service
            .list(fx.follower_id, ListParams::new(1, 10), Some(0))
            .await
            .unwrap();
        assert_eq!(page.items[0].recipes.len(), 2);
    }

    #[tokio::test]
    async fn test_subscribe_rejections() {
        let fx = fixture().await;

        let to_self = fx
            .service
            .subscribe(fx.follower_id, fx.follower_id, None)
            .await;
        assert!(matches!(
            to_self,
            Err(SubscriptionServiceError::SelfSubscription)
        ));

        let missing = fx.service.subscribe(fx.follower_id, 9999, None).await;
        assert!(matches!(
            missing,
            Err(SubscriptionServiceError::UserNotFound)
        ));

        fx.service
            .subscribe(fx.follower_id, fx.author_id, None)
            .await
            .unwrap();
        let twice = fx.service.subscribe(fx.follower_id, fx.author_id, None).await;
        assert!(matches!(
            twice,
            Err(SubscriptionServiceError::AlreadySubscribed)
        ));
    }

    #[tokio::test]
    async fn test_unsubscribe_paths() {
        let fx = fixture().await;

        let not_subscribed = fx.service.unsubscribe(fx.follower_id, fx.author_id).await;
        assert!(matches!(
            not_subscribed,
            Err(SubscriptionServiceError::NotSubscribed)
        ));

        fx.service
            .subscribe(fx.follower_id, fx.author_id, None)
            .await
            .unwrap();
        fx.service
            .unsubscribe(fx.follower_id, fx.author_id)
            .await
            .unwrap();

        let missing = fx.service.unsubscribe(fx.follower_id, 9999).await;
        assert!(matches!(
            missing,
            Err(SubscriptionServiceError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_with_recipe_preview() {
        let fx = fixture().await;
        seed_recipes(&fx, 2).await;
        fx.service
            .subscribe(fx.follower_id, fx.author_id, None)
            .await
            .unwrap();

        let page = fx
            .service
            .list(fx.follower_id, ListParams::new(1, 10), Some(1))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].recipes.len(), 1);
        assert_eq!(page.items[0].recipes_count, 2);

        // The author's own listing is empty
        let empty = fx
            .service
            .list(fx.author_id, ListParams::new(1, 10), None)
            .await
            .unwrap();
        assert_eq!(empty.total, 0);
    }
}
