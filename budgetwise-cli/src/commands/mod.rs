//! CLI command implementations

pub mod auth;
pub mod budget;
pub mod expense;
pub mod goal;

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use budgetwise_core::services::{LogEvent, LoggingService};
use budgetwise_core::{BudgetwiseContext, User};

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let dir = get_budgetwise_dir();
    std::fs::create_dir_all(&dir).ok()?;
    LoggingService::new(&dir, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Get the budgetwise directory from environment or default
pub fn get_budgetwise_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("BUDGETWISE_DIR") {
        PathBuf::from(dir)
    } else {
        dirs::home_dir()
            .expect("Could not find home directory")
            .join(".budgetwise")
    }
}

/// Get or create the budgetwise context
pub fn get_context() -> Result<BudgetwiseContext> {
    let dir = get_budgetwise_dir();

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create budgetwise directory: {:?}", dir))?;

    BudgetwiseContext::new(&dir).context("Failed to initialize budgetwise context")
}

/// Stored session: the bearer token from the last login
#[derive(Debug, Serialize, Deserialize)]
struct Session {
    token: String,
}

fn session_path() -> PathBuf {
    get_budgetwise_dir().join("session.json")
}

/// Persist the bearer token after login
pub fn save_session(token: &str) -> Result<()> {
    let session = Session {
        token: token.to_string(),
    };
    let content = serde_json::to_string_pretty(&session)?;
    std::fs::write(session_path(), content)?;
    Ok(())
}

/// Remove any stored session
pub fn clear_session() -> Result<()> {
    let path = session_path();
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}

/// Resolve the caller's identity from the stored bearer token
///
/// This is the seam where "who is asking" becomes an explicit value that is
/// passed into every core operation.
pub fn require_user(ctx: &BudgetwiseContext) -> Result<User> {
    let path = session_path();
    if !path.exists() {
        anyhow::bail!("Not logged in (run 'bw login' first)");
    }

    let content = std::fs::read_to_string(&path)?;
    let session: Session =
        serde_json::from_str(&content).context("Session file is corrupt; run 'bw login' again")?;

    let email = ctx
        .token_service
        .verify(&session.token)
        .context("Session expired or invalid; run 'bw login' again")?;

    let user = ctx
        .repository
        .find_user_by_email(&email)?
        .context("Account no longer exists; run 'bw login' again")?;

    Ok(user)
}
