//! User model
//!
//! Users register with email as the login identifier; email and username are
//! both unique. Subscriptions are (follower, followed) pairs between users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::RecipeSummary;

/// User entity representing a registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Email address (unique, used for login)
    pub email: String,
    /// Username (unique)
    pub username: String,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Stored avatar path, if set
    pub avatar: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Input for creating a user row (password already hashed)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

/// Registration request payload (plaintext password)
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub password: String,
}

/// Public user profile as seen by a viewer.
///
/// `is_subscribed` reflects whether the viewer follows this user and is
/// always false for anonymous viewers.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

impl UserProfile {
    /// Build a profile from a user row and a precomputed subscription flag
    pub fn from_user(user: &User, is_subscribed: bool) -> Self {
        Self {
            email: user.email.clone(),
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
            avatar: user.avatar.clone(),
        }
    }
}

/// A followed user enriched with a recipe preview, for subscription listings
#[derive(Debug, Clone, Serialize)]
pub struct SubscribedUser {
    #[serde(flatten)]
    pub profile: UserProfile,
    /// Capped preview of the user's recipes
    pub recipes: Vec<RecipeSummary>,
    /// Total number of recipes the user has authored
    pub recipes_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 7,
            email: "cook@example.com".to_string(),
            username: "cook".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password_hash: "hash".to_string(),
            avatar: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_profile_from_user() {
        let profile = UserProfile::from_user(&sample_user(), true);
        assert_eq!(profile.id, 7);
        assert_eq!(profile.username, "cook");
        assert!(profile.is_subscribed);
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "cook@example.com");
    }
}
