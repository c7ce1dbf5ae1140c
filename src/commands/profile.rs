//! Profile commands
//!
//! Edits go to the backend first; the stored session is only updated once
//! the backend accepted them.

use std::path::Path;

use colored::Colorize;

use crate::api::types::ProfileUpdate;
use crate::auth::SessionStore;
use crate::config::Config;
use crate::error::{FluxNovaError, Result};
use crate::media;

use super::session_backend;

/// Print the logged-in identity
pub fn show_profile() -> Result<()> {
    let session = SessionStore::default().require()?;
    println!("Username: {}", session.username.cyan());
    println!("Email:    {}", session.email);
    println!("User ID:  {}", session.user_id);
    println!(
        "Picture:  {}",
        if session.profile_picture.is_some() {
            "set"
        } else {
            "none"
        }
    );
    Ok(())
}

/// Change the username
pub async fn rename(config: &Config, username: &str) -> Result<()> {
    let username = username.trim();
    if username.is_empty() {
        return Err(FluxNovaError::InvalidInput("username cannot be empty".to_string()).into());
    }

    let (backend, mut session) = session_backend(config)?;
    backend
        .update_profile(&ProfileUpdate {
            username: Some(username.to_string()),
            profile_picture: None,
        })
        .await?;

    session.username = username.to_string();
    SessionStore::default().save(&session)?;
    println!("{}", format!("Username changed to {}", username).green());
    Ok(())
}

/// Upload a new profile picture from an image file
pub async fn set_picture(config: &Config, path: &Path) -> Result<()> {
    let data_uri = media::read_image_data_uri(path)?;

    let (backend, mut session) = session_backend(config)?;
    backend
        .update_profile(&ProfileUpdate {
            username: None,
            profile_picture: Some(data_uri.clone()),
        })
        .await?;

    session.profile_picture = Some(data_uri);
    SessionStore::default().save(&session)?;
    println!("{}", "Profile picture updated".green());
    Ok(())
}

/// Delete the account and forget the local session
///
/// # Errors
///
/// Returns [`FluxNovaError::InvalidInput`] unless `confirmed`.
pub async fn delete_account(config: &Config, confirmed: bool) -> Result<()> {
    if !confirmed {
        return Err(FluxNovaError::InvalidInput(
            "account deletion is permanent; pass --yes to confirm".to_string(),
        )
        .into());
    }

    let (backend, session) = session_backend(config)?;
    backend.delete_account().await?;
    SessionStore::default().clear()?;
    tracing::info!(user_id = %session.user_id, "Account deleted");
    println!(
        "{}",
        format!("Account {} deleted", session.display_name()).green()
    );
    Ok(())
}
