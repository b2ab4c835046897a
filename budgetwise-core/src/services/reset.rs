//! Password reset service - single-use, time-limited reset tokens
//!
//! Per-user state machine: NoActiveToken -> TokenIssued -> NoActiveToken,
//! leaving TokenIssued either by a successful reset or by an expired token
//! being consumed on its next attempted use. Issuing a new token overwrites
//! any prior one, so at most one is ever active.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::result::{Error, Result};
use crate::services::auth::hash_password;

/// Reset tokens are valid for 15 minutes from issuance
const RESET_TOKEN_TTL_MS: i64 = 15 * 60 * 1000;

/// An issued reset token, returned to the caller for delivery
///
/// Real email delivery is out of scope; the CLI prints the token directly.
#[derive(Debug, Serialize)]
pub struct IssuedResetToken {
    pub token: String,
    /// Absolute expiry, epoch milliseconds
    pub expires_at: i64,
}

/// Password reset lifecycle service
pub struct PasswordResetService {
    repository: Arc<DuckDbRepository>,
}

impl PasswordResetService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        Self { repository }
    }

    /// Issue a reset token for the account with this email
    ///
    /// Overwrites any previously issued token: the old token stops working
    /// the moment this returns.
    pub fn generate_reset_token(&self, email: &str) -> Result<IssuedResetToken> {
        let email = email.trim().to_lowercase();
        let mut user = self
            .repository
            .find_user_by_email(&email)?
            .ok_or_else(|| Error::not_found("No account with that email"))?;

        let token = Uuid::new_v4().to_string();
        let expires_at = Utc::now().timestamp_millis() + RESET_TOKEN_TTL_MS;

        user.issue_reset_token(&token, expires_at);
        self.repository.update_user(&user)?;

        Ok(IssuedResetToken { token, expires_at })
    }

    /// Consume a reset token and set a new password
    ///
    /// The token is single-use. An expired token is cleared as a side effect
    /// of the failed attempt, so retrying it yields InvalidToken and a fresh
    /// issuance is required.
    pub fn reset_password(&self, token: &str, new_password: &str) -> Result<()> {
        if new_password.is_empty() {
            return Err(Error::validation("Password is required"));
        }

        let mut user = self
            .repository
            .find_user_by_reset_token(token)?
            .ok_or(Error::InvalidToken)?;

        if user.reset_token_expired(Utc::now().timestamp_millis()) {
            // Consume the stale token so the same value cannot be retried
            user.clear_reset_token();
            self.repository.update_user(&user)?;
            return Err(Error::TokenExpired);
        }

        // New hash and token clearing land in the same row update
        user.password_hash = hash_password(new_password)?;
        user.clear_reset_token();
        self.repository.update_user(&user)?;

        Ok(())
    }
}
