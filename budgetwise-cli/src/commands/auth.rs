//! Auth commands - register, login, logout, password reset

use anyhow::Result;
use chrono::{DateTime, Utc};
use dialoguer::Password;

use super::{clear_session, get_context, save_session};
use crate::output;

pub fn register(email: &str, password: Option<String>) -> Result<()> {
    let ctx = get_context()?;
    let password = password_or_prompt(password, true)?;

    let user = ctx.auth_service.register(email, &password)?;

    output::success(&format!("Account created for {}", user.email));
    output::info("Run 'bw login' to start a session");
    Ok(())
}

pub fn login(email: &str, password: Option<String>) -> Result<()> {
    let ctx = get_context()?;
    let password = password_or_prompt(password, false)?;

    let token = ctx.auth_service.login(email, &password)?;
    save_session(&token)?;

    output::success(&format!("Logged in as {}", email.trim().to_lowercase()));
    Ok(())
}

pub fn logout() -> Result<()> {
    clear_session()?;
    output::success("Logged out");
    Ok(())
}

pub fn forgot_password(email: &str) -> Result<()> {
    let ctx = get_context()?;
    let issued = ctx.reset_service.generate_reset_token(email)?;

    // No email delivery; the token is handed to the caller directly
    let expires = DateTime::<Utc>::from_timestamp_millis(issued.expires_at)
        .map(|dt| dt.format("%H:%M UTC").to_string())
        .unwrap_or_default();

    output::info(&format!("Reset token: {}", issued.token));
    output::warning(&format!(
        "Single use, valid until {} (15 minutes). Run 'bw reset-password <token>'",
        expires
    ));
    Ok(())
}

pub fn reset_password(token: &str, password: Option<String>) -> Result<()> {
    let ctx = get_context()?;
    let password = password_or_prompt(password, true)?;

    ctx.reset_service.reset_password(token, &password)?;

    output::success("Password reset. Run 'bw login' with your new password");
    Ok(())
}

/// Use the flag value if given, otherwise prompt without echo
fn password_or_prompt(password: Option<String>, confirm: bool) -> Result<String> {
    if let Some(p) = password {
        return Ok(p);
    }

    let mut prompt = Password::new().with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    Ok(prompt.interact()?)
}
