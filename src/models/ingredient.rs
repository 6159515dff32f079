//! Ingredient model
//!
//! An ingredient is identified by its (name, measurement unit) pair; the same
//! name may appear with several units as distinct catalog rows.

use serde::{Deserialize, Serialize};

/// Ingredient catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    /// Unique identifier
    pub id: i64,
    /// Ingredient name
    pub name: String,
    /// Measurement unit the amount is expressed in
    pub measurement_unit: String,
}

impl Ingredient {
    /// Create a new Ingredient. The ID will be assigned by the database.
    pub fn new(name: String, measurement_unit: String) -> Self {
        Self {
            id: 0,
            name,
            measurement_unit,
        }
    }
}
