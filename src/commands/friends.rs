//! Friend management commands

use colored::Colorize;
use prettytable::{format, row, Table};

use crate::api::{Backend, HttpBackend, UserRecord};
use crate::config::Config;
use crate::error::{FluxNovaError, Result};

use super::session_backend;

/// First user whose username contains `query`, ignoring case
///
/// Users listed in `exclude` (typically the caller) are skipped.
pub fn search_user<'a>(
    users: &'a [UserRecord],
    query: &str,
    exclude: Option<&str>,
) -> Option<&'a UserRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    users
        .iter()
        .filter(|u| Some(u.id.as_str()) != exclude)
        .find(|u| u.username.to_lowercase().contains(&needle))
}

/// User whose id equals `name` or whose username equals it, ignoring case
pub fn resolve_user<'a>(users: &'a [UserRecord], name: &str) -> Option<&'a UserRecord> {
    users
        .iter()
        .find(|u| u.id == name)
        .or_else(|| users.iter().find(|u| u.username.eq_ignore_ascii_case(name)))
}

/// Print the friend list
pub async fn list_friends(config: &Config) -> Result<()> {
    let (backend, _) = session_backend(config)?;
    let friends = backend.list_friends().await?;

    if friends.is_empty() {
        println!("{}", "No friends yet.".yellow());
        println!("Use {} to add one.", "fluxnova friends add <name>".cyan());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row!["Username".bold(), "ID".bold()]);
    for friend in &friends {
        table.add_row(row![friend.username.cyan(), friend.id]);
    }

    println!("\nFriends:");
    table.printstd();
    println!();
    Ok(())
}

/// Search users by name and befriend the first match
pub async fn add_friend(config: &Config, query: &str) -> Result<()> {
    let (backend, session) = session_backend(config)?;
    let added = add_by_search(&backend, query, Some(&session.user_id)).await?;
    println!("{}", format!("Added {} as a friend", added.username).green());
    Ok(())
}

/// Find the first user matching `query` and add them as a friend
///
/// # Errors
///
/// Returns [`FluxNovaError::UserNotFound`] when nobody matches.
pub async fn add_by_search(
    backend: &HttpBackend,
    query: &str,
    exclude: Option<&str>,
) -> Result<UserRecord> {
    let users = backend.list_users().await?;
    let user = search_user(&users, query, exclude)
        .cloned()
        .ok_or_else(|| FluxNovaError::UserNotFound(query.to_string()))?;

    backend.add_friend(&user.id).await?;
    tracing::info!(friend_id = %user.id, "Friend added");
    Ok(user)
}

/// Remove a friend by username or id
pub async fn remove_friend(config: &Config, friend: &str) -> Result<()> {
    let (backend, _) = session_backend(config)?;
    let friends = backend.list_friends().await?;
    let target = resolve_user(&friends, friend)
        .ok_or_else(|| FluxNovaError::UserNotFound(friend.to_string()))?;

    backend.remove_friend(&target.id).await?;
    println!("{}", format!("Removed {}", target.username).green());
    Ok(())
}
