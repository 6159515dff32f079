//! Subscription repository
//!
//! Database operations for author subscriptions (follower follows author).

use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Subscription repository trait
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Whether the follower is subscribed to the author
    async fn exists(&self, follower_id: i64, followed_id: i64) -> Result<bool>;

    /// Subscribe; returns false when already subscribed
    async fn add(&self, follower_id: i64, followed_id: i64) -> Result<bool>;

    /// Unsubscribe; returns false when there was no subscription
    async fn remove(&self, follower_id: i64, followed_id: i64) -> Result<bool>;

    /// The authors a follower is subscribed to, ordered by username
    async fn followed_of(&self, follower_id: i64, offset: i64, limit: i64) -> Result<Vec<User>>;

    /// How many authors the follower is subscribed to
    async fn count_followed(&self, follower_id: i64) -> Result<i64>;
}

/// SQLx-based subscription repository implementation
pub struct SqlxSubscriptionRepository {
    pool: SqlitePool,
}

impl SqlxSubscriptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn SubscriptionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SubscriptionRepository for SqlxSubscriptionRepository {
    async fn exists(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM subscriptions WHERE follower_id = ? AND followed_id = ?",
        )
        .bind(follower_id)
        .bind(followed_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check subscription")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn add(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO subscriptions (follower_id, followed_id) VALUES (?, ?)",
        )
        .bind(follower_id)
        .bind(followed_id)
        .execute(&self.pool)
        .await
        .context("Failed to add subscription")?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM subscriptions WHERE follower_id = ? AND followed_id = ?",
        )
        .bind(follower_id)
        .bind(followed_id)
        .execute(&self.pool)
        .await
        .context("Failed to remove subscription")?;

        Ok(result.rows_affected() > 0)
    }

    async fn followed_of(&self, follower_id: i64, offset: i64, limit: i64) -> Result<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT u.id, u.email, u.username, u.first_name, u.last_name,
                   u.password_hash, u.avatar, u.created_at
            FROM users u
            JOIN subscriptions s ON s.followed_id = u.id
            WHERE s.follower_id = ?
            ORDER BY u.username
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(follower_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list followed authors")?;

        rows.iter().map(super::user::row_to_user).collect()
    }

    async fn count_followed(&self, follower_id: i64) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM subscriptions WHERE follower_id = ?",
        )
        .bind(follower_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count subscriptions")?;

        Ok(row.get("count"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::db::repositories::{SqlxUserRepository, UserRepository};
    use crate::models::NewUser;

    async fn seed_user(pool: &SqlitePool, email: &str, username: &str) -> i64 {
        let repo = SqlxUserRepository::new(pool.clone());
        repo.create(&NewUser {
            email: email.to_string(),
            username: username.to_string(),
            first_name: "T".to_string(),
            last_name: "U".to_string(),
            password_hash: "hash".to_string(),
        })
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_subscribe_and_unsubscribe() {
        let pool = create_test_pool().await.unwrap();
        let follower = seed_user(&pool, "a@example.com", "alice").await;
        let author = seed_user(&pool, "b@example.com", "bob").await;
        let repo = SqlxSubscriptionRepository::new(pool);

        assert!(!repo.exists(follower, author).await.unwrap());
        assert!(repo.add(follower, author).await.unwrap());
        assert!(!repo.add(follower, author).await.unwrap());
        assert!(repo.exists(follower, author).await.unwrap());

        // One-directional
        assert!(!repo.exists(author, follower).await.unwrap());

        assert!(repo.remove(follower, author).await.unwrap());
        assert!(!repo.remove(follower, author).await.unwrap());
    }

    #[tokio::test]
    async fn test_followed_ordered_by_username() {
        let pool = create_test_pool().await.unwrap();
        let follower = seed_user(&pool, "me@example.com", "me").await;
        let carol = seed_user(&pool, "c@example.com", "carol").await;
        let bob = seed_user(&pool, "b@example.com", "bob").await;
        let repo = SqlxSubscriptionRepository::new(pool);

        repo.add(follower, carol).await.unwrap();
        repo.add(follower, bob).await.unwrap();

        let followed = repo.followed_of(follower, 0, 10).await.unwrap();
        let usernames: Vec<&str> = followed.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(usernames, vec!["bob", "carol"]);
        assert_eq!(repo.count_followed(follower).await.unwrap(), 2);

        let page = repo.followed_of(follower, 1, 10).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].username, "carol");
    }
}
