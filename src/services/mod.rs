//! Business logic services
//!
//! Services sit between the HTTP handlers and the repositories: they own
//! validation, authorization, and the composition of persisted rows into the
//! views the API returns.

pub mod image;
pub mod password;
pub mod recipe;
pub mod relation;
pub mod seed;
pub mod subscription;
pub mod user;

pub use image::{ImageError, ImageStore};
pub use recipe::{RecipeQuery, RecipeService, RecipeServiceError};
pub use relation::{RelationService, RelationServiceError};
pub use seed::{load_catalog, SeedReport};
pub use subscription::{SubscriptionService, SubscriptionServiceError};
pub use user::{UserService, UserServiceError};
