//! Database layer
//!
//! SQLite access for the Cookbook backend: pool construction, code-embedded
//! migrations, and one repository per entity.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool};
