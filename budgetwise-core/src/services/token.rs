//! Token service - signed, stateless bearer tokens
//!
//! Token format: base64url(payload JSON) "." base64url(signature), where the
//! payload is `{"sub": email, "exp": epoch_millis}` and the signature is a
//! SHA-256 digest keyed with a secret from settings.json. Nothing is stored
//! per token; verification is signature + expiry only.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::result::{Error, Result};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject: the user's email
    sub: String,
    /// Expiry in epoch milliseconds
    exp: i64,
}

/// Issues and verifies bearer tokens
pub struct TokenService {
    secret: Vec<u8>,
    ttl_ms: i64,
}

impl TokenService {
    /// Create a token service from a base64 secret (see Config)
    pub fn new(secret_b64: &str, ttl_hours: i64) -> Result<Self> {
        let secret = base64::engine::general_purpose::STANDARD
            .decode(secret_b64)
            .map_err(|_| Error::Config("Invalid token secret in settings".to_string()))?;
        if secret.len() < 16 {
            return Err(Error::Config("Token secret too short".to_string()));
        }
        Ok(Self {
            secret,
            ttl_ms: ttl_hours * 60 * 60 * 1000,
        })
    }

    /// Issue a token for an identity, expiring after the configured TTL
    pub fn issue(&self, email: &str) -> Result<String> {
        self.issue_with_expiry(email, Utc::now().timestamp_millis() + self.ttl_ms)
    }

    fn issue_with_expiry(&self, email: &str, exp: i64) -> Result<String> {
        let claims = Claims {
            sub: email.to_string(),
            exp,
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let sig = URL_SAFE_NO_PAD.encode(self.sign(&payload));
        Ok(format!("{}.{}", payload, sig))
    }

    /// Verify signature and expiry, returning the subject email
    ///
    /// Every failure mode is the same Unauthorized: a caller learns nothing
    /// about why a token was rejected.
    pub fn verify(&self, token: &str) -> Result<String> {
        let (payload, sig_b64) = token.split_once('.').ok_or(Error::Unauthorized)?;

        let presented = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| Error::Unauthorized)?;
        let expected = self.sign(payload);
        if !constant_time_eq(&presented, &expected) {
            return Err(Error::Unauthorized);
        }

        let claims: Claims = URL_SAFE_NO_PAD
            .decode(payload)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or(Error::Unauthorized)?;

        if claims.exp < Utc::now().timestamp_millis() {
            return Err(Error::Unauthorized);
        }

        Ok(claims.sub)
    }

    /// Keyed digest with the secret on both sides of the payload, so an
    /// attacker cannot extend the message.
    fn sign(&self, payload: &str) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(&self.secret);
        hasher.update(payload.as_bytes());
        hasher.update(&self.secret);
        hasher.finalize().to_vec()
    }
}

/// Compare without short-circuiting on the first mismatched byte
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
