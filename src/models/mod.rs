//! Data models
//!
//! This module contains all data structures used throughout the Cookbook backend.
//! Models represent:
//! - Database entities (User, Session, Tag, Ingredient, Recipe and its relations)
//! - Validated write inputs
//! - Read-side shapes (recipe views, user profiles, paged results)

mod ingredient;
mod recipe;
mod session;
mod tag;
mod user;

pub use ingredient::Ingredient;
pub use recipe::{
    IngredientAmount, ListParams, NewRecipe, PagedResult, Recipe, RecipeIngredientView,
    RecipeInput, RecipeSummary, RecipeUpdate, RecipeView, RecipeWithFlags, ShoppingListEntry,
    ValidRecipe, MAX_AMOUNT, MAX_COOKING_TIME, MIN_AMOUNT, MIN_COOKING_TIME,
};
pub use session::Session;
pub use tag::Tag;
pub use user::{NewUser, RegisterInput, SubscribedUser, User, UserProfile};
