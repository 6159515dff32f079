//! Catalog seeding
//!
//! Loads the ingredient catalog from a `name,unit` CSV file and installs the
//! default tag set. Seeding is idempotent: entries that already exist are
//! skipped, so it can run against a populated database.

use crate::db::repositories::{IngredientRepository, TagRepository};
use crate::models::{Ingredient, Tag};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Tags installed when seeding a fresh database
const DEFAULT_TAGS: &[(&str, &str)] = &[
    ("Breakfast", "breakfast"),
    ("Lunch", "lunch"),
    ("Dinner", "dinner"),
];

/// Outcome counts of a seeding run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub ingredients_added: usize,
    pub ingredients_skipped: usize,
    pub tags_added: usize,
}

/// Seed the tag and ingredient catalogs from a CSV file
pub async fn load_catalog(
    tag_repo: &Arc<dyn TagRepository>,
    ingredient_repo: &Arc<dyn IngredientRepository>,
    csv_path: &Path,
) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for (name, slug) in DEFAULT_TAGS {
        if tag_repo
            .get_by_slug(slug)
            .await
            .context("Failed to check tag")?
            .is_none()
        {
            tag_repo
                .create(&Tag::new(name.to_string(), slug.to_string()))
                .await
                .context("Failed to create tag")?;
            report.tags_added += 1;
        }
    }

    let content = std::fs::read_to_string(csv_path)
        .with_context(|| format!("Failed to read catalog file {}", csv_path.display()))?;

    for (line_number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((name, unit)) = line.split_once(',') else {
            warn!(line = line_number + 1, "Skipping malformed catalog line");
            continue;
        };
        let (name, unit) = (name.trim(), unit.trim());
        if name.is_empty() || unit.is_empty() {
            warn!(line = line_number + 1, "Skipping malformed catalog line");
            continue;
        }

        if ingredient_repo
            .get_by_pair(name, unit)
            .await
            .context("Failed to check ingredient")?
            .is_some()
        {
            report.ingredients_skipped += 1;
            continue;
        }

        ingredient_repo
            .create(&Ingredient::new(name.to_string(), unit.to_string()))
            .await
            .context("Failed to create ingredient")?;
        report.ingredients_added += 1;
    }

    info!(
        added = report.ingredients_added,
        skipped = report.ingredients_skipped,
        tags = report.tags_added,
        "Catalog seeded"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::db::repositories::{SqlxIngredientRepository, SqlxTagRepository};
    use std::io::Write;

    async fn repos() -> (Arc<dyn TagRepository>, Arc<dyn IngredientRepository>) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        (
            SqlxTagRepository::boxed(pool.clone()),
            SqlxIngredientRepository::boxed(pool),
        )
    }

    fn csv_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_seed_loads_ingredients_and_default_tags() {
        let (tags, ingredients) = repos().await;
        let file = csv_file("flour,g\negg,pcs\nmilk,ml\n");

        let report = load_catalog(&tags, &ingredients, file.path()).await.unwrap();
        assert_eq!(report.ingredients_added, 3);
        assert_eq!(report.tags_added, 3);

        assert_eq!(ingredients.list(None).await.unwrap().len(), 3);
        let slugs: Vec<String> = tags
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.slug)
            .collect();
        assert_eq!(slugs, vec!["breakfast", "dinner", "lunch"]);
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let (tags, ingredients) = repos().await;
        let file = csv_file("flour,g\negg,pcs\n");

        load_catalog(&tags, &ingredients, file.path()).await.unwrap();
        let second = load_catalog(&tags, &ingredients, file.path()).await.unwrap();

        assert_eq!(second.ingredients_added, 0);
        assert_eq!(second.ingredients_skipped, 2);
        assert_eq!(second.tags_added, 0);
        assert_eq!(ingredients.list(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_seed_skips_malformed_lines() {
        let (tags, ingredients) = repos().await;
        let file = csv_file("flour,g\nno-comma-here\n,missing-name\nsalt,\n\negg,pcs\n");

        let report = load_catalog(&tags, &ingredients, file.path()).await.unwrap();
        assert_eq!(report.ingredients_added, 2);
    }

    #[tokio::test]
    async fn test_seed_missing_file_errors() {
        let (tags, ingredients) = repos().await;
        let result = load_catalog(&tags, &ingredients, Path::new("/nonexistent.csv")).await;
        assert!(result.is_err());
    }
}
