//! Recipe model and authoring input validation
//!
//! A recipe owns scalar fields plus two association sets: tags (plain
//! many-to-many) and ingredients (through rows carrying an amount). The write
//! input is validated up front; failures come back as a field-keyed error map
//! so a client can show every problem at once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Minimum cooking time in minutes
pub const MIN_COOKING_TIME: i64 = 1;
/// Maximum cooking time in minutes
pub const MAX_COOKING_TIME: i64 = 600;
/// Minimum ingredient amount per join row
pub const MIN_AMOUNT: i64 = 1;
/// Maximum ingredient amount per join row
pub const MAX_AMOUNT: i64 = 1000;

/// Recipe entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Unique identifier
    pub id: i64,
    /// Recipe name
    pub name: String,
    /// Free-text description
    pub text: String,
    /// Cooking time in minutes (1-600)
    pub cooking_time: i64,
    /// Stored image path
    pub image: String,
    /// Owning author
    pub author_id: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// An (ingredient id, amount) pair in a write payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientAmount {
    pub id: i64,
    pub amount: i64,
}

/// Raw recipe write payload, as deserialized from the request body.
///
/// Everything is optional here so that missing fields can be reported
/// together by `validate` instead of failing deserialization one at a time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub cooking_time: Option<i64>,
    #[serde(default)]
    pub tags: Option<Vec<i64>>,
    #[serde(default)]
    pub ingredients: Option<Vec<IngredientAmount>>,
    #[serde(default)]
    pub image: Option<String>,
}

/// A validated recipe payload ready for persistence
#[derive(Debug, Clone)]
pub struct ValidRecipe {
    pub name: String,
    pub text: String,
    pub cooking_time: i64,
    pub tag_ids: Vec<i64>,
    pub ingredients: Vec<IngredientAmount>,
    /// Raw image value (data URI or already-stored reference); absent only
    /// on updates that keep the existing image
    pub image: Option<String>,
}

impl RecipeInput {
    /// Validate the payload, in order:
    ///
    /// 1. required-field presence (all missing fields reported together),
    /// 2. duplicated tag ids,
    /// 3. duplicated ingredient ids,
    /// 4. image presence when `require_image` (creation),
    /// 5. cooking time and amount bounds.
    ///
    /// Errors are a field-name-to-message map.
    pub fn validate(&self, require_image: bool) -> Result<ValidRecipe, BTreeMap<String, String>> {
        let mut errors = BTreeMap::new();

        let name = self.name.as_deref().unwrap_or("").trim();
        let text = self.text.as_deref().unwrap_or("").trim();
        let tags = self.tags.clone().unwrap_or_default();
        let ingredients = self.ingredients.clone().unwrap_or_default();

        if name.is_empty() {
            errors.insert("name".into(), required_message("name"));
        }
        if text.is_empty() {
            errors.insert("text".into(), required_message("text"));
        }
        if self.cooking_time.is_none() {
            errors.insert("cooking_time".into(), required_message("cooking_time"));
        }
        if tags.is_empty() {
            errors.insert("tags".into(), required_message("tags"));
        }
        if ingredients.is_empty() {
            errors.insert("ingredients".into(), required_message("ingredients"));
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let mut seen_tags = HashSet::new();
        if tags.iter().any(|id| !seen_tags.insert(*id)) {
            errors.insert("tags".into(), "Tags must not repeat.".into());
            return Err(errors);
        }

        let mut seen_ingredients = HashSet::new();
        if ingredients.iter().any(|i| !seen_ingredients.insert(i.id)) {
            errors.insert(
                "ingredients".into(),
                "Ingredients must be distinct.".into(),
            );
            return Err(errors);
        }

        let image = self
            .image
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        if require_image && image.is_none() {
            errors.insert("image".into(), "An image is required.".into());
            return Err(errors);
        }

        let cooking_time = self.cooking_time.unwrap_or(0);
        if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&cooking_time) {
            errors.insert(
                "cooking_time".into(),
                format!(
                    "Cooking time must be between {} and {} minutes.",
                    MIN_COOKING_TIME, MAX_COOKING_TIME
                ),
            );
        }
        if ingredients
            .iter()
            .any(|i| !(MIN_AMOUNT..=MAX_AMOUNT).contains(&i.amount))
        {
            errors.insert(
                "ingredients".into(),
                format!(
                    "Ingredient amounts must be between {} and {}.",
                    MIN_AMOUNT, MAX_AMOUNT
                ),
            );
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ValidRecipe {
            name: name.to_string(),
            text: text.to_string(),
            cooking_time,
            tag_ids: tags,
            ingredients,
            image,
        })
    }
}

fn required_message(field: &str) -> String {
    format!("The {} field is required.", field)
}

/// Input for inserting a recipe row with its associations (image already stored)
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub name: String,
    pub text: String,
    pub cooking_time: i64,
    pub image: String,
    pub author_id: i64,
    pub tag_ids: Vec<i64>,
    pub ingredients: Vec<IngredientAmount>,
}

/// Full-replace update of a recipe: scalars are overwritten and the
/// ingredient/tag sets are cleared and rebuilt, never diffed.
#[derive(Debug, Clone)]
pub struct RecipeUpdate {
    pub name: String,
    pub text: String,
    pub cooking_time: i64,
    /// New stored image path, or None to keep the current one
    pub image: Option<String>,
    pub tag_ids: Vec<i64>,
    pub ingredients: Vec<IngredientAmount>,
}

/// A recipe row together with the viewer-dependent relation flags
#[derive(Debug, Clone)]
pub struct RecipeWithFlags {
    pub recipe: Recipe,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

/// An ingredient row of a recipe as exposed on reads:
/// the catalog fields joined with the per-recipe amount.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecipeIngredientView {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// Compact recipe representation for toggle responses and previews
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecipeSummary {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i64,
}

impl From<&Recipe> for RecipeSummary {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.clone(),
            image: recipe.image.clone(),
            cooking_time: recipe.cooking_time,
        }
    }
}

/// Fully shaped recipe for API reads
#[derive(Debug, Clone)]
pub struct RecipeView {
    pub recipe: Recipe,
    pub tags: Vec<crate::models::Tag>,
    pub author: crate::models::UserProfile,
    pub ingredients: Vec<RecipeIngredientView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

/// One aggregated shopping list line: summed amount per (name, unit) group
#[derive(Debug, Clone, PartialEq)]
pub struct ShoppingListEntry {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

/// Page/limit list parameters
#[derive(Debug, Clone, Copy)]
pub struct ListParams {
    pub page: u32,
    pub limit: u32,
}

impl ListParams {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, 100),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

impl Default for ListParams {
    fn default() -> Self {
        Self::new(1, 10)
    }
}

/// A page of results with pagination metadata
#[derive(Debug, Clone)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

impl<T> PagedResult<T> {
    pub fn total_pages(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.total + self.limit as i64 - 1) / self.limit as i64) as u32
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn amount_strategy() -> impl Strategy<Value = Vec<IngredientAmount>> {
        prop::collection::vec((1i64..50, 1i64..=1000), 1..8).prop_map(|pairs| {
            let mut seen = std::collections::HashSet::new();
            pairs
                .into_iter()
                .filter(|(id, _)| seen.insert(*id))
                .map(|(id, amount)| IngredientAmount { id, amount })
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Any payload with distinct tags/ingredients and in-bounds numbers validates.
        #[test]
        fn in_bounds_payloads_validate(
            cooking_time in 1i64..=600,
            ingredients in amount_strategy(),
        ) {
            let input = RecipeInput {
                name: Some("Soup".to_string()),
                text: Some("Boil.".to_string()),
                cooking_time: Some(cooking_time),
                tags: Some(vec![1]),
                ingredients: Some(ingredients),
                image: Some("pic.png".to_string()),
            };
            prop_assert!(input.validate(true).is_ok());
        }

        /// A duplicated ingredient id always fails, whatever the amounts are.
        #[test]
        fn duplicated_ingredient_always_fails(
            id in 1i64..100,
            a in 1i64..=1000,
            b in 1i64..=1000,
        ) {
            let input = RecipeInput {
                name: Some("Soup".to_string()),
                text: Some("Boil.".to_string()),
                cooking_time: Some(30),
                tags: Some(vec![1]),
                ingredients: Some(vec![
                    IngredientAmount { id, amount: a },
                    IngredientAmount { id, amount: b },
                ]),
                image: Some("pic.png".to_string()),
            };
            let errors = input.validate(true).unwrap_err();
            prop_assert!(errors.contains_key("ingredients"));
        }

        /// Out-of-bounds cooking time is always rejected.
        #[test]
        fn out_of_bounds_cooking_time_fails(cooking_time in 601i64..5000) {
            let input = RecipeInput {
                name: Some("Stew".to_string()),
                text: Some("Wait.".to_string()),
                cooking_time: Some(cooking_time),
                tags: Some(vec![1]),
                ingredients: Some(vec![IngredientAmount { id: 1, amount: 1 }]),
                image: Some("pic.png".to_string()),
            };
            prop_assert!(input.validate(true).is_err());
        }
    }
}
