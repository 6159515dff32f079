//! User repository
//!
//! Database operations for user accounts.

use crate::models::{NewUser, User};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user (password must already be hashed)
    async fn create(&self, input: &NewUser) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Get user by username
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Set or clear the user's avatar path
    async fn set_avatar(&self, id: i64, avatar: Option<&str>) -> Result<()>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: SqlitePool,
}

impl SqlxUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, input: &NewUser) -> Result<User> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (email, username, first_name, last_name, password_hash, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.email)
        .bind(&input.username)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.password_hash)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create user")?;

        Ok(User {
            id: result.last_insert_rowid(),
            email: input.email.clone(),
            username: input.username.clone(),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            password_hash: input.password_hash.clone(),
            avatar: None,
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query(&select_users("id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get user by ID")?;

        row.map(|row| row_to_user(&row)).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&select_users("email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get user by email")?;

        row.map(|row| row_to_user(&row)).transpose()
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(&select_users("username = ?"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get user by username")?;

        row.map(|row| row_to_user(&row)).transpose()
    }

    async fn set_avatar(&self, id: i64, avatar: Option<&str>) -> Result<()> {
        sqlx::query("UPDATE users SET avatar = ? WHERE id = ?")
            .bind(avatar)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update avatar")?;

        Ok(())
    }
}

fn select_users(condition: &str) -> String {
    format!(
        "SELECT id, email, username, first_name, last_name, password_hash, avatar, created_at \
         FROM users WHERE {}",
        condition
    )
}

pub(crate) fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        username: row.try_get("username")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        password_hash: row.try_get("password_hash")?,
        avatar: row.try_get("avatar")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    fn sample_input(email: &str, username: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            username: username.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password_hash: "$argon2id$fake".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqlxUserRepository::new(pool);

        let created = repo
            .create(&sample_input("a@example.com", "alice"))
            .await
            .unwrap();
        assert!(created.id > 0);

        let by_id = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@example.com");

        let by_email = repo.get_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        let by_username = repo.get_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_username.id, created.id);

        assert!(repo.get_by_email("nope@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_by_constraint() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqlxUserRepository::new(pool);

        repo.create(&sample_input("a@example.com", "alice"))
            .await
            .unwrap();
        let duplicate = repo.create(&sample_input("a@example.com", "bob")).await;
        assert!(duplicate.is_err());
    }

    #[tokio::test]
    async fn test_set_and_clear_avatar() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqlxUserRepository::new(pool);

        let user = repo
            .create(&sample_input("a@example.com", "alice"))
            .await
            .unwrap();

        repo.set_avatar(user.id, Some("/media/avatars/x.png"))
            .await
            .unwrap();
        let reloaded = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.avatar.as_deref(), Some("/media/avatars/x.png"));

        repo.set_avatar(user.id, None).await.unwrap();
        let cleared = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert!(cleared.avatar.is_none());
    }
}
