//! Tag repository
//!
//! Database operations for the read-mostly tag catalog and the
//! recipe-to-tag links written by the authoring workflow.

use crate::models::Tag;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Create a new tag
    async fn create(&self, tag: &Tag) -> Result<Tag>;

    /// Get tag by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>>;

    /// Get tag by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>>;

    /// List all tags ordered by name
    async fn list(&self) -> Result<Vec<Tag>>;

    /// Get the tags attached to a recipe
    async fn list_by_recipe(&self, recipe_id: i64) -> Result<Vec<Tag>>;
}

/// SQLx-based tag repository implementation
pub struct SqlxTagRepository {
    pool: SqlitePool,
}

impl SqlxTagRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn create(&self, tag: &Tag) -> Result<Tag> {
        let result = sqlx::query("INSERT INTO tags (name, slug) VALUES (?, ?)")
            .bind(&tag.name)
            .bind(&tag.slug)
            .execute(&self.pool)
            .await
            .context("Failed to create tag")?;

        Ok(Tag {
            id: result.last_insert_rowid(),
            name: tag.name.clone(),
            slug: tag.slug.clone(),
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>> {
        let row = sqlx::query("SELECT id, name, slug FROM tags WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get tag by ID")?;

        row.map(|row| row_to_tag(&row)).transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>> {
        let row = sqlx::query("SELECT id, name, slug FROM tags WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get tag by slug")?;

        row.map(|row| row_to_tag(&row)).transpose()
    }

    async fn list(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query("SELECT id, name, slug FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list tags")?;

        rows.iter().map(row_to_tag).collect()
    }

    async fn list_by_recipe(&self, recipe_id: i64) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.name, t.slug
            FROM tags t
            JOIN recipe_tags rt ON rt.tag_id = t.id
            WHERE rt.recipe_id = ?
            ORDER BY t.name
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list tags for recipe")?;

        rows.iter().map(row_to_tag).collect()
    }
}

fn row_to_tag(row: &sqlx::sqlite::SqliteRow) -> Result<Tag> {
    Ok(Tag {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    #[tokio::test]
    async fn test_create_and_get() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqlxTagRepository::new(pool);

        let tag = repo
            .create(&Tag::new("Breakfast".to_string(), "breakfast".to_string()))
            .await
            .unwrap();
        assert!(tag.id > 0);

        let by_id = repo.get_by_id(tag.id).await.unwrap().unwrap();
        assert_eq!(by_id.name, "Breakfast");

        let by_slug = repo.get_by_slug("breakfast").await.unwrap().unwrap();
        assert_eq!(by_slug.id, tag.id);

        assert!(repo.get_by_slug("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_ordered_by_name() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqlxTagRepository::new(pool);

        repo.create(&Tag::new("Lunch".to_string(), "lunch".to_string()))
            .await
            .unwrap();
        repo.create(&Tag::new("Breakfast".to_string(), "breakfast".to_string()))
            .await
            .unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Breakfast".to_string(), "Lunch".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqlxTagRepository::new(pool);

        repo.create(&Tag::new("Breakfast".to_string(), "breakfast".to_string()))
            .await
            .unwrap();
        let duplicate = repo
            .create(&Tag::new("Brunch".to_string(), "breakfast".to_string()))
            .await;
        assert!(duplicate.is_err());
    }
}
