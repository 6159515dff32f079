//! Ingredient repository
//!
//! Database operations for the ingredient catalog. The (name, unit) pair is
//! unique; listing supports a name-prefix search for typeahead lookups.

use crate::models::Ingredient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Ingredient repository trait
#[async_trait]
pub trait IngredientRepository: Send + Sync {
    /// Create a new ingredient
    async fn create(&self, ingredient: &Ingredient) -> Result<Ingredient>;

    /// Get ingredient by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Ingredient>>;

    /// Get ingredient by its unique (name, measurement unit) pair
    async fn get_by_pair(&self, name: &str, measurement_unit: &str) -> Result<Option<Ingredient>>;

    /// List ingredients ordered by name, optionally narrowed to a name prefix
    async fn list(&self, name_prefix: Option<&str>) -> Result<Vec<Ingredient>>;
}

/// SQLx-based ingredient repository implementation
pub struct SqlxIngredientRepository {
    pool: SqlitePool,
}

impl SqlxIngredientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn IngredientRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl IngredientRepository for SqlxIngredientRepository {
    async fn create(&self, ingredient: &Ingredient) -> Result<Ingredient> {
        let result = sqlx::query("INSERT INTO ingredients (name, measurement_unit) VALUES (?, ?)")
            .bind(&ingredient.name)
            .bind(&ingredient.measurement_unit)
            .execute(&self.pool)
            .await
            .context("Failed to create ingredient")?;

        Ok(Ingredient {
            id: result.last_insert_rowid(),
            name: ingredient.name.clone(),
            measurement_unit: ingredient.measurement_unit.clone(),
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Ingredient>> {
        let row = sqlx::query("SELECT id, name, measurement_unit FROM ingredients WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get ingredient by ID")?;

        row.map(|row| row_to_ingredient(&row)).transpose()
    }

    async fn get_by_pair(&self, name: &str, measurement_unit: &str) -> Result<Option<Ingredient>> {
        let row = sqlx::query(
            "SELECT id, name, measurement_unit FROM ingredients WHERE name = ? AND measurement_unit = ?",
        )
        .bind(name)
        .bind(measurement_unit)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get ingredient by pair")?;

        row.map(|row| row_to_ingredient(&row)).transpose()
    }

    async fn list(&self, name_prefix: Option<&str>) -> Result<Vec<Ingredient>> {
        let rows = match name_prefix {
            Some(prefix) if !prefix.is_empty() => {
                // Escape LIKE wildcards so a literal prefix search is performed
                let escaped = prefix.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
                sqlx::query(
                    "SELECT id, name, measurement_unit FROM ingredients \
                     WHERE name LIKE ? ESCAPE '\\' ORDER BY name",
                )
                .bind(format!("{}%", escaped))
                .fetch_all(&self.pool)
                .await
            }
            _ => {
                sqlx::query("SELECT id, name, measurement_unit FROM ingredients ORDER BY name")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .context("Failed to list ingredients")?;

        rows.iter().map(row_to_ingredient).collect()
    }
}

fn row_to_ingredient(row: &sqlx::sqlite::SqliteRow) -> Result<Ingredient> {
    Ok(Ingredient {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        measurement_unit: row.try_get("measurement_unit")?,
    })
}
