//! Configuration management
//!
//! Settings live in settings.json in the budgetwise directory:
//! ```json
//! {
//!   "auth": { "tokenSecret": "...", "tokenTtlHours": 24 }
//! }
//! ```
//! The token secret is generated on first load and persisted; fields the
//! library does not manage are preserved on save.

use std::collections::HashMap;
use std::path::Path;

use base64::Engine;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::result::Result;

const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    auth: AuthSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthSettings {
    #[serde(default)]
    token_secret: Option<String>,
    #[serde(default)]
    token_ttl_hours: Option<i64>,
}

/// Budgetwise configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    /// Base64-encoded bearer-token signing secret
    pub token_secret: String,
    pub token_ttl_hours: i64,
    // Keep the raw settings for preservation when saving
    raw_settings: SettingsFile,
}

impl Config {
    /// Load config from the budgetwise directory
    ///
    /// Generates and persists a fresh token secret if none exists yet, so a
    /// first run leaves a working settings.json behind.
    pub fn load(budgetwise_dir: &Path) -> Result<Self> {
        let settings_path = budgetwise_dir.join("settings.json");

        let mut raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        let mut needs_save = false;
        let token_secret = match raw.auth.token_secret.clone() {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                let secret = generate_secret();
                raw.auth.token_secret = Some(secret.clone());
                needs_save = true;
                secret
            }
        };

        let token_ttl_hours = raw.auth.token_ttl_hours.unwrap_or(DEFAULT_TOKEN_TTL_HOURS);

        let config = Self {
            token_secret,
            token_ttl_hours,
            raw_settings: raw,
        };

        if needs_save {
            config.save(budgetwise_dir)?;
        }

        Ok(config)
    }

    /// Save config, preserving settings the library doesn't manage
    pub fn save(&self, budgetwise_dir: &Path) -> Result<()> {
        let settings_path = budgetwise_dir.join("settings.json");

        let mut settings = self.raw_settings.clone();
        settings.auth.token_secret = Some(self.token_secret.clone());
        settings.auth.token_ttl_hours = Some(self.token_ttl_hours);

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }
}

/// 32 random bytes, base64-encoded
fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes[..]);
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
