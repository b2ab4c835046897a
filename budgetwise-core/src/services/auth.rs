//! Auth service - registration and login

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::result::{Error, Result};
use crate::domain::User;
use crate::services::TokenService;

/// Auth service for account registration and login
pub struct AuthService {
    repository: Arc<DuckDbRepository>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(repository: Arc<DuckDbRepository>, tokens: Arc<TokenService>) -> Self {
        Self { repository, tokens }
    }

    /// Register a new account
    ///
    /// The raw password exists only long enough to be hashed; it is never
    /// stored or logged.
    pub fn register(&self, email: &str, password: &str) -> Result<User> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(Error::validation("A valid email address is required"));
        }
        if password.is_empty() {
            return Err(Error::validation("Password is required"));
        }

        if self.repository.find_user_by_email(&email)?.is_some() {
            return Err(Error::conflict("Email already registered"));
        }

        let user = User::new(email, hash_password(password)?);
        self.repository.insert_user(&user)?;

        Ok(user)
    }

    /// Log in, returning a bearer token on success
    ///
    /// Unknown email and wrong password fail identically, so a caller cannot
    /// probe which addresses have accounts.
    pub fn login(&self, email: &str, password: &str) -> Result<String> {
        let email = email.trim().to_lowercase();

        let user = self
            .repository
            .find_user_by_email(&email)?
            .ok_or(Error::Unauthorized)?;

        if !verify_password(password, &user.password_hash) {
            return Err(Error::Unauthorized);
        }

        self.tokens.issue(&user.email)
    }
}

/// Argon2id with a fresh random salt, PHC string output
pub(crate) fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| Error::database(format!("Password hashing failed: {}", e)))
}

pub(crate) fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
