/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `auth`: Login, registration and logout
- `feed`: Print or watch pending snaps, and view one
- `send`: Send an image to friends
- `friends`: List, add and remove friends
- `profile`: Show and edit the logged-in account

Handlers print human-readable output and return errors to `main`. The
pieces that talk to the backend take an [`HttpBackend`] so they can be
driven against a mock server.
*/

use crate::api::HttpBackend;
use crate::auth::{SessionStore, StoredSession};
use crate::config::Config;
use crate::error::Result;

pub mod auth;
pub mod feed;
pub mod friends;
pub mod profile;
pub mod send;

/// Backend authenticated with the stored session
///
/// # Errors
///
/// Returns [`crate::error::FluxNovaError::NotAuthenticated`] when nobody is
/// logged in.
pub(crate) fn session_backend(config: &Config) -> Result<(HttpBackend, StoredSession)> {
    let session = SessionStore::default().require()?;
    tracing::debug!(user = %session.display_name(), "Using stored session");
    let backend = HttpBackend::new(&config.api)?.with_token(session.token.clone());
    Ok((backend, session))
}
