//! Tag model
//!
//! Tags classify recipes (breakfast, lunch, ...) and drive recipe list
//! filtering by slug. Both name and slug are unique.

use serde::{Deserialize, Serialize};

/// Tag entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    /// Unique identifier
    pub id: i64,
    /// Tag name (unique)
    pub name: String,
    /// URL-friendly slug (unique)
    pub slug: String,
}

impl Tag {
    /// Create a new Tag. The ID will be assigned by the database.
    pub fn new(name: String, slug: String) -> Self {
        Self { id: 0, name, slug }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_new() {
        let tag = Tag::new("Breakfast".to_string(), "breakfast".to_string());

        assert_eq!(tag.id, 0);
        assert_eq!(tag.name, "Breakfast");
        assert_eq!(tag.slug, "breakfast");
    }
}
