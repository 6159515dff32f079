//! Session model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authentication session bound to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session token (uuid)
    pub token: String,
    /// Owning user
    pub user_id: i64,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Check whether the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}
