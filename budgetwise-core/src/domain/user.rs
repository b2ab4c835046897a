//! User domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user, identified by email
///
/// The password is stored only as an Argon2id hash. The reset token and its
/// expiry are always set and cleared together (at most one active token).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Argon2id PHC string, never the raw password
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    /// Absolute expiry in epoch milliseconds
    #[serde(skip_serializing)]
    pub reset_token_expiry: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with the default role
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: password_hash.into(),
            role: "USER".to_string(),
            reset_token: None,
            reset_token_expiry: None,
            created_at: Utc::now(),
        }
    }

    /// Store a reset token with its expiry, replacing any prior token
    pub fn issue_reset_token(&mut self, token: impl Into<String>, expiry_ms: i64) {
        self.reset_token = Some(token.into());
        self.reset_token_expiry = Some(expiry_ms);
    }

    /// Clear the reset token and its expiry together
    pub fn clear_reset_token(&mut self) {
        self.reset_token = None;
        self.reset_token_expiry = None;
    }

    /// True if the stored reset token expiry is in the past
    pub fn reset_token_expired(&self, now_ms: i64) -> bool {
        match self.reset_token_expiry {
            Some(expiry) => expiry < now_ms,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults() {
        let user = User::new("test@example.com", "$argon2id$...");
        assert_eq!(user.role, "USER");
        assert!(user.reset_token.is_none());
        assert!(user.reset_token_expiry.is_none());
    }

    #[test]
    fn test_reset_token_paired() {
        let mut user = User::new("test@example.com", "hash");
        user.issue_reset_token("abc", 1_000);
        assert!(user.reset_token.is_some() && user.reset_token_expiry.is_some());

        user.clear_reset_token();
        assert!(user.reset_token.is_none() && user.reset_token_expiry.is_none());
    }

    #[test]
    fn test_reset_token_expiry_check() {
        let mut user = User::new("test@example.com", "hash");
        user.issue_reset_token("abc", 1_000);
        assert!(!user.reset_token_expired(999));
        assert!(!user.reset_token_expired(1_000));
        assert!(user.reset_token_expired(1_001));
    }
}
