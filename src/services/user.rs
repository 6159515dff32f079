//! User service
//!
//! Business logic for accounts and authentication: registration, email
//! login, session validation, profile assembly, and avatar management.

use crate::db::repositories::{SessionRepository, SubscriptionRepository, UserRepository};
use crate::models::{NewUser, RegisterInput, Session, User, UserProfile};
use crate::services::image::{ImageError, ImageStore};
use crate::services::password::{hash_password, verify_password};
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Default session lifetime in days
const DEFAULT_SESSION_TTL_DAYS: i64 = 7;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Invalid input, keyed by field name
    #[error("Validation failed")]
    Validation(BTreeMap<String, String>),

    /// Email or username already taken
    #[error("{0}")]
    Conflict(String),

    /// Invalid credentials
    #[error("Invalid email or password")]
    Authentication,

    /// User does not exist
    #[error("User not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ImageError> for UserServiceError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::Storage(e) => UserServiceError::Internal(e),
            other => {
                let mut details = BTreeMap::new();
                details.insert("avatar".to_string(), other.to_string());
                UserServiceError::Validation(details)
            }
        }
    }
}

/// User service for accounts, sessions, and avatars
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    subscription_repo: Arc<dyn SubscriptionRepository>,
    images: Arc<ImageStore>,
    session_ttl_days: i64,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        subscription_repo: Arc<dyn SubscriptionRepository>,
        images: Arc<ImageStore>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            subscription_repo,
            images,
            session_ttl_days: DEFAULT_SESSION_TTL_DAYS,
        }
    }

    /// Override the session lifetime, used by expiry tests
    pub fn with_session_ttl(mut self, days: i64) -> Self {
        self.session_ttl_days = days;
        self
    }

    /// Register a new account. The email and username must be unused.
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        validate_register_input(&input)?;

        if self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::Conflict(format!(
                "Email '{}' is already registered",
                input.email
            )));
        }

        if self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::Conflict(format!(
                "Username '{}' is already taken",
                input.username
            )));
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;

        let user = self
            .user_repo
            .create(&NewUser {
                email: input.email,
                username: input.username,
                first_name: input.first_name,
                last_name: input.last_name,
                password_hash,
            })
            .await
            .context("Failed to create user")?;

        Ok(user)
    }

    /// Login with email and password, creating a fresh session token
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, UserServiceError> {
        let user = self
            .user_repo
            .get_by_email(email)
            .await
            .context("Failed to get user by email")?
            .ok_or(UserServiceError::Authentication)?;

        let valid = verify_password(password, &user.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            return Err(UserServiceError::Authentication);
        }

        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4().to_string(),
            user_id: user.id,
            expires_at: now + Duration::days(self.session_ttl_days),
            created_at: now,
        };

        self.session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok(session)
    }

    /// Invalidate a session token. Unknown tokens are a no-op.
    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;

        Ok(())
    }

    /// Resolve a session token to its user, dropping expired sessions
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            let _ = self.session_repo.delete(token).await;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        let user = self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?;

        Ok(user)
    }

    /// Public profile of a user, with the subscription flag evaluated
    /// against the viewer (zero for anonymous viewers).
    pub async fn profile(
        &self,
        user_id: i64,
        viewer_id: i64,
    ) -> Result<UserProfile, UserServiceError> {
        let user = self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to get user")?
            .ok_or(UserServiceError::NotFound)?;

        let is_subscribed = if viewer_id > 0 && viewer_id != user_id {
            self.subscription_repo
                .exists(viewer_id, user_id)
                .await
                .context("Failed to check subscription")?
        } else {
            false
        };

        Ok(UserProfile::from_user(&user, is_subscribed))
    }

    /// Store an inline avatar image and return its public path. The value
    /// must be a base64 data URI; plain paths are rejected.
    pub async fn set_avatar(
        &self,
        user_id: i64,
        value: &str,
    ) -> Result<String, UserServiceError> {
        if crate::services::image::parse_data_uri(value).is_none() {
            let mut details = BTreeMap::new();
            details.insert(
                "avatar".to_string(),
                "Expected a base64 image data URI".to_string(),
            );
            return Err(UserServiceError::Validation(details));
        }

        let user = self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to get user")?
            .ok_or(UserServiceError::NotFound)?;

        let stored = self.images.store_inline(value, "avatars")?;

        self.user_repo
            .set_avatar(user_id, Some(&stored))
            .await
            .context("Failed to update avatar")?;

        if let Some(old) = user.avatar {
            self.images.remove(&old);
        }

        Ok(stored)
    }

    /// Clear the user's avatar and delete the stored file
    pub async fn remove_avatar(&self, user_id: i64) -> Result<(), UserServiceError> {
        let user = self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to get user")?
            .ok_or(UserServiceError::NotFound)?;

        self.user_repo
            .set_avatar(user_id, None)
            .await
            .context("Failed to clear avatar")?;

        if let Some(old) = user.avatar {
            self.images.remove(&old);
        }

        Ok(())
    }

    /// Maintenance sweep for expired sessions
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;

        Ok(count)
    }
}

fn validate_register_input(input: &RegisterInput) -> Result<(), UserServiceError> {
    let mut errors = BTreeMap::new();

    for (field, value) in [
        ("email", &input.email),
        ("username", &input.username),
        ("first_name", &input.first_name),
        ("last_name", &input.last_name),
    ] {
        if value.trim().is_empty() {
            errors.insert(field.to_string(), "This field is required".to_string());
        }
    }
    if input.password.is_empty() {
        errors.insert("password".to_string(), "This field is required".to_string());
    }
    if !input.email.trim().is_empty() && !input.email.contains('@') {
        errors.insert("email".to_string(), "Invalid email format".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(UserServiceError::Validation(errors))
    }
}
