//! User-recipe relation repository
//!
//! Favorites and shopping-cart entries are both plain (user, recipe) link
//! tables with identical operations, so one repository serves both and the
//! caller picks the table through `RelationKind`.

use crate::models::ShoppingListEntry;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Which user-recipe link table an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    Favorite,
    ShoppingCart,
}

impl RelationKind {
    fn table(self) -> &'static str {
        match self {
            RelationKind::Favorite => "favorites",
            RelationKind::ShoppingCart => "cart_entries",
        }
    }
}

/// Repository for favorite and shopping-cart links
#[async_trait]
pub trait RelationRepository: Send + Sync {
    /// Whether the link exists
    async fn exists(&self, kind: RelationKind, user_id: i64, recipe_id: i64) -> Result<bool>;

    /// Add a link; returns false when it was already present
    async fn add(&self, kind: RelationKind, user_id: i64, recipe_id: i64) -> Result<bool>;

    /// Remove a link; returns false when it was not present
    async fn remove(&self, kind: RelationKind, user_id: i64, recipe_id: i64) -> Result<bool>;

    /// Aggregate the user's cart into one row per distinct ingredient,
    /// summing amounts across recipes
    async fn shopping_list(&self, user_id: i64) -> Result<Vec<ShoppingListEntry>>;
}

/// SQLx-based relation repository implementation
pub struct SqlxRelationRepository {
    pool: SqlitePool,
}

impl SqlxRelationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn RelationRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl RelationRepository for SqlxRelationRepository {
    async fn exists(&self, kind: RelationKind, user_id: i64, recipe_id: i64) -> Result<bool> {
        let sql = format!(
            "SELECT COUNT(*) as count FROM {} WHERE user_id = ? AND recipe_id = ?",
            kind.table()
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(recipe_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check relation")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn add(&self, kind: RelationKind, user_id: i64, recipe_id: i64) -> Result<bool> {
        let sql = format!(
            "INSERT OR IGNORE INTO {} (user_id, recipe_id) VALUES (?, ?)",
            kind.table()
        );
        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(recipe_id)
            .execute(&self.pool)
            .await
            .context("Failed to add relation")?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, kind: RelationKind, user_id: i64, recipe_id: i64) -> Result<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE user_id = ? AND recipe_id = ?",
            kind.table()
        );
        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(recipe_id)
            .execute(&self.pool)
            .await
            .context("Failed to remove relation")?;

        Ok(result.rows_affected() > 0)
    }

    async fn shopping_list(&self, user_id: i64) -> Result<Vec<ShoppingListEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT i.name, i.measurement_unit, SUM(ri.amount) AS total_amount
            FROM recipe_ingredients ri
            JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE ri.recipe_id IN (SELECT recipe_id FROM cart_entries WHERE user_id = ?)
            GROUP BY i.name, i.measurement_unit
            ORDER BY i.name, i.measurement_unit
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to aggregate shopping list")?;

        rows.iter()
            .map(|row| {
                Ok(ShoppingListEntry {
                    name: row.try_get("name")?,
                    measurement_unit: row.try_get("measurement_unit")?,
                    total_amount: row.try_get("total_amount")?,
                })
            })
            .collect()
    }
}
