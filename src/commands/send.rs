//! Send command
//!
//! Recipients are resolved against the friend list up front, so a typo
//! fails before anything is sent. Snaps then go out one request per
//! recipient, in order, stopping at the first failure.

use std::path::Path;

use chrono::Utc;
use colored::Colorize;

use crate::api::types::NewSnap;
use crate::api::{HttpBackend, UserRecord};
use crate::config::{Config, MAX_SNAP_DURATION_SECS, MIN_SNAP_DURATION_SECS};
use crate::error::{FluxNovaError, Result};
use crate::media;

use super::friends::resolve_user;
use super::session_backend;

/// Pick the requested duration or the configured default, and range-check it
///
/// # Errors
///
/// Returns [`FluxNovaError::InvalidInput`] outside 1..=10 seconds.
pub fn resolve_duration(requested: Option<u32>, default: u32) -> Result<u32> {
    let duration = requested.unwrap_or(default);
    if !(MIN_SNAP_DURATION_SECS..=MAX_SNAP_DURATION_SECS).contains(&duration) {
        return Err(FluxNovaError::InvalidInput(format!(
            "duration must be between {} and {} seconds, got {}",
            MIN_SNAP_DURATION_SECS, MAX_SNAP_DURATION_SECS, duration
        ))
        .into());
    }
    Ok(duration)
}

/// Map each recipient name or id to a friend
///
/// # Errors
///
/// Returns [`FluxNovaError::UserNotFound`] for the first name that is not a
/// friend, and [`FluxNovaError::InvalidInput`] for an empty list.
pub fn resolve_recipients(friends: &[UserRecord], names: &[String]) -> Result<Vec<UserRecord>> {
    if names.is_empty() {
        return Err(FluxNovaError::InvalidInput("no recipients given".to_string()).into());
    }
    names
        .iter()
        .map(|name| {
            resolve_user(friends, name)
                .cloned()
                .ok_or_else(|| anyhow::Error::from(FluxNovaError::UserNotFound(name.clone())))
        })
        .collect()
}

/// Post `image` to every recipient, stopping at the first failure
///
/// # Returns
///
/// The number of snaps sent
pub async fn deliver(
    backend: &HttpBackend,
    image: &str,
    recipients: &[UserRecord],
    duration: u32,
) -> Result<usize> {
    for (sent, recipient) in recipients.iter().enumerate() {
        let snap = NewSnap {
            to: recipient.id.clone(),
            image: image.to_string(),
            date: Utc::now(),
            duration,
        };
        if let Err(e) = backend.send_snap(&snap).await {
            tracing::warn!(
                recipient = %recipient.username,
                sent,
                "Sending stopped after a failure"
            );
            return Err(e);
        }
        tracing::debug!(recipient = %recipient.id, "Snap sent");
        println!("  {} {}", "✓".green(), recipient.username);
    }
    Ok(recipients.len())
}

/// Send an image file to the named friends
pub async fn send_snap(
    config: &Config,
    image: &Path,
    recipients: &[String],
    duration: Option<u32>,
) -> Result<()> {
    let duration = resolve_duration(duration, config.send.default_duration_secs)?;
    let data_uri = media::read_image_data_uri(image)?;

    let (backend, _) = session_backend(config)?;
    let friends = backend.list_friends().await?;
    let targets = resolve_recipients(&friends, recipients)?;

    println!("Sending {} ({}s):", image.display(), duration);
    let sent = deliver(&backend, &data_uri, &targets, duration).await?;
    println!("{}", format!("Sent to {} friend(s)", sent).green());
    Ok(())
}
