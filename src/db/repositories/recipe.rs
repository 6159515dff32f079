//! Recipe repository
//!
//! Database operations for recipes and their association rows. The write path
//! (create and full-replace update) runs inside a single transaction so a
//! failure partway through the ingredient/tag rebuild leaves no partial state:
//! readers see either the fully-old or fully-new recipe.

use crate::models::{
    IngredientAmount, NewRecipe, Recipe, RecipeIngredientView, RecipeSummary, RecipeUpdate,
    RecipeWithFlags,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use std::sync::Arc;

/// Filters for recipe listing. `viewer_id` parameterizes the favorite/cart
/// flags in the result rows; zero (no user) makes both flags false.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub viewer_id: i64,
    pub author_id: Option<i64>,
    pub tag_slugs: Vec<String>,
    pub favorited_by: Option<i64>,
    pub in_cart_of: Option<i64>,
}

/// Recipe repository trait
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// Insert a recipe with its join rows and tag links, atomically
    async fn create(&self, input: &NewRecipe) -> Result<Recipe>;

    /// Full-replace update: overwrite scalars, clear and rebuild all
    /// ingredient join rows and tag links, atomically. Returns None when the
    /// recipe does not exist.
    async fn replace(&self, id: i64, input: &RecipeUpdate) -> Result<Option<Recipe>>;

    /// Get a recipe with viewer-dependent flags
    async fn get(&self, id: i64, viewer_id: i64) -> Result<Option<RecipeWithFlags>>;

    /// Delete a recipe (join rows cascade); returns whether a row was removed
    async fn delete(&self, id: i64) -> Result<bool>;

    /// List recipes newest-first with flags for the filter's viewer
    async fn list(&self, filter: &RecipeFilter, offset: i64, limit: i64)
        -> Result<Vec<RecipeWithFlags>>;

    /// Count recipes matching the filter
    async fn count(&self, filter: &RecipeFilter) -> Result<i64>;

    /// The recipe's ingredient rows joined with catalog fields
    async fn ingredients_of(&self, recipe_id: i64) -> Result<Vec<RecipeIngredientView>>;

    /// Compact previews of an author's recipes, newest-first, optionally capped
    async fn summaries_by_author(
        &self,
        author_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<RecipeSummary>>;

    /// Number of recipes an author has published
    async fn count_by_author(&self, author_id: i64) -> Result<i64>;
}

/// SQLx-based recipe repository implementation
pub struct SqlxRecipeRepository {
    pool: SqlitePool,
}

impl SqlxRecipeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn RecipeRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl RecipeRepository for SqlxRecipeRepository {
    async fn create(&self, input: &NewRecipe) -> Result<Recipe> {
        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin recipe transaction")?;

        let result = sqlx::query(
            r#"
            INSERT INTO recipes (name, text, cooking_time, image, author_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.name)
        .bind(&input.text)
        .bind(input.cooking_time)
        .bind(&input.image)
        .bind(input.author_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to insert recipe")?;

        let id = result.last_insert_rowid();

        insert_associations(&mut tx, id, &input.tag_ids, &input.ingredients).await?;

        tx.commit().await.context("Failed to commit recipe")?;

        Ok(Recipe {
            id,
            name: input.name.clone(),
            text: input.text.clone(),
            cooking_time: input.cooking_time,
            image: input.image.clone(),
            author_id: input.author_id,
            created_at: now,
        })
    }

    async fn replace(&self, id: i64, input: &RecipeUpdate) -> Result<Option<Recipe>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin recipe transaction")?;

        let existing = sqlx::query(
            "SELECT image, author_id, created_at FROM recipes WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to load recipe for update")?;

        let Some(existing) = existing else {
            return Ok(None);
        };
        let current_image: String = existing.try_get("image")?;
        let author_id: i64 = existing.try_get("author_id")?;
        let created_at: DateTime<Utc> = existing.try_get("created_at")?;

        let image = input.image.clone().unwrap_or(current_image);

        sqlx::query("UPDATE recipes SET name = ?, text = ?, cooking_time = ?, image = ? WHERE id = ?")
            .bind(&input.name)
            .bind(&input.text)
            .bind(input.cooking_time)
            .bind(&image)
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to update recipe")?;

        // Full-replace semantics: every old association row goes away before
        // the new sets are attached.
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear recipe ingredients")?;
        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear recipe tags")?;

        insert_associations(&mut tx, id, &input.tag_ids, &input.ingredients).await?;

        tx.commit().await.context("Failed to commit recipe update")?;

        Ok(Some(Recipe {
            id,
            name: input.name.clone(),
            text: input.text.clone(),
            cooking_time: input.cooking_time,
            image,
            author_id,
            created_at,
        }))
    }

    async fn get(&self, id: i64, viewer_id: i64) -> Result<Option<RecipeWithFlags>> {
        let sql = format!("{} WHERE r.id = ?", select_with_flags());
        let row = sqlx::query(&sql)
            .bind(viewer_id)
            .bind(viewer_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get recipe")?;

        row.map(|row| row_to_recipe_with_flags(&row)).transpose()
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete recipe")?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(
        &self,
        filter: &RecipeFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<RecipeWithFlags>> {
        let conditions = filter_conditions(filter);
        let mut sql = select_with_flags();
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY r.created_at DESC, r.id DESC LIMIT ? OFFSET ?");

        let mut query = sqlx::query(&sql).bind(filter.viewer_id).bind(filter.viewer_id);
        query = bind_filter(query, filter);
        let rows = query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list recipes")?;

        rows.iter().map(row_to_recipe_with_flags).collect()
    }

    async fn count(&self, filter: &RecipeFilter) -> Result<i64> {
        let conditions = filter_conditions(filter);
        let mut sql = String::from("SELECT COUNT(*) as count FROM recipes r");
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        let query = bind_filter(sqlx::query(&sql), filter);
        let row = query
            .fetch_one(&self.pool)
            .await
            .context("Failed to count recipes")?;

        Ok(row.get("count"))
    }

    async fn ingredients_of(&self, recipe_id: i64) -> Result<Vec<RecipeIngredientView>> {
        let rows = sqlx::query(
            r#"
            SELECT i.id, i.name, i.measurement_unit, ri.amount
            FROM recipe_ingredients ri
            JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE ri.recipe_id = ?
            ORDER BY i.name
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load recipe ingredients")?;

        rows.iter()
            .map(|row| {
                Ok(RecipeIngredientView {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    measurement_unit: row.try_get("measurement_unit")?,
                    amount: row.try_get("amount")?,
                })
            })
            .collect()
    }

    async fn summaries_by_author(
        &self,
        author_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<RecipeSummary>> {
        let mut sql = String::from(
            "SELECT id, name, image, cooking_time FROM recipes \
             WHERE author_id = ? ORDER BY created_at DESC, id DESC",
        );
        if limit.is_some() {
            sql.push_str(" LIMIT ?");
        }

        let mut query = sqlx::query(&sql).bind(author_id);
        if let Some(limit) = limit {
            query = query.bind(limit);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list author recipes")?;

        rows.iter()
            .map(|row| {
                Ok(RecipeSummary {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    image: row.try_get("image")?,
                    cooking_time: row.try_get("cooking_time")?,
                })
            })
            .collect()
    }

    async fn count_by_author(&self, author_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM recipes WHERE author_id = ?")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count author recipes")?;

        Ok(row.get("count"))
    }
}

async fn insert_associations(
    tx: &mut Transaction<'_, Sqlite>,
    recipe_id: i64,
    tag_ids: &[i64],
    ingredients: &[IngredientAmount],
) -> Result<()> {
    for pair in ingredients {
        sqlx::query(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) VALUES (?, ?, ?)",
        )
        .bind(recipe_id)
        .bind(pair.id)
        .bind(pair.amount)
        .execute(&mut **tx)
        .await
        .context("Failed to insert recipe ingredient")?;
    }

    for tag_id in tag_ids {
        sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) VALUES (?, ?)")
            .bind(recipe_id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await
            .context("Failed to attach recipe tag")?;
    }

    Ok(())
}

fn select_with_flags() -> String {
    String::from(
        "SELECT r.id, r.name, r.text, r.cooking_time, r.image, r.author_id, r.created_at, \
         EXISTS(SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ?) AS is_favorited, \
         EXISTS(SELECT 1 FROM cart_entries c WHERE c.recipe_id = r.id AND c.user_id = ?) AS is_in_shopping_cart \
         FROM recipes r",
    )
}

/// Build the WHERE fragments for a filter. Bind order must match
/// [`bind_filter`].
fn filter_conditions(filter: &RecipeFilter) -> Vec<String> {
    let mut conditions = Vec::new();

    if filter.author_id.is_some() {
        conditions.push("r.author_id = ?".to_string());
    }
    if !filter.tag_slugs.is_empty() {
        let placeholders = vec!["?"; filter.tag_slugs.len()].join(", ");
        conditions.push(format!(
            "r.id IN (SELECT rt.recipe_id FROM recipe_tags rt \
             JOIN tags t ON t.id = rt.tag_id WHERE t.slug IN ({}))",
            placeholders
        ));
    }
    if filter.favorited_by.is_some() {
        conditions.push("r.id IN (SELECT recipe_id FROM favorites WHERE user_id = ?)".to_string());
    }
    if filter.in_cart_of.is_some() {
        conditions.push("r.id IN (SELECT recipe_id FROM cart_entries WHERE user_id = ?)".to_string());
    }

    conditions
}

fn bind_filter<'q>(
    mut query: sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    filter: &'q RecipeFilter,
) -> sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    if let Some(author_id) = filter.author_id {
        query = query.bind(author_id);
    }
    for slug in &filter.tag_slugs {
        query = query.bind(slug);
    }
    if let Some(user_id) = filter.favorited_by {
        query = query.bind(user_id);
    }
    if let Some(user_id) = filter.in_cart_of {
        query = query.bind(user_id);
    }
    query
}

fn row_to_recipe_with_flags(row: &sqlx::sqlite::SqliteRow) -> Result<RecipeWithFlags> {
    Ok(RecipeWithFlags {
        recipe: Recipe {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            text: row.try_get("text")?,
            cooking_time: row.try_get("cooking_time")?,
            image: row.try_get("image")?,
            author_id: row.try_get("author_id")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        },
        is_favorited: row.try_get("is_favorited")?,
        is_in_shopping_cart: row.try_get("is_in_shopping_cart")?,
    })
}
