//! Authentication commands
//!
//! Sessions live in the OS keyring (see [`crate::auth::SessionStore`]).

use colored::Colorize;

use crate::api::HttpBackend;
use crate::auth::{SessionStore, StoredSession};
use crate::config::Config;
use crate::error::Result;

/// Exchange credentials for a session and store it
///
/// # Errors
///
/// Returns an authentication error on rejected credentials, or a keyring
/// error if the session cannot be stored.
pub async fn login(config: &Config, email: &str, password: &str) -> Result<()> {
    let backend = HttpBackend::new(&config.api)?;
    let session = authenticate(&backend, email, password).await?;
    SessionStore::default().save(&session)?;

    println!(
        "{}",
        format!("Logged in as {}", session.display_name()).green()
    );
    Ok(())
}

/// Log in against `backend` and build the session to store
pub async fn authenticate(
    backend: &HttpBackend,
    email: &str,
    password: &str,
) -> Result<StoredSession> {
    let response = backend.login(email, password).await?;
    let session = StoredSession::from_login(response)?;
    tracing::info!(user_id = %session.user_id, "Authenticated");
    Ok(session)
}

/// Create an account, then log in with the same credentials
///
/// The account exists once the backend accepts the registration; a
/// failing follow-up login is reported but not treated as an error.
pub async fn register(config: &Config, email: &str, username: &str, password: &str) -> Result<()> {
    let backend = HttpBackend::new(&config.api)?;
    backend.register(email, username, password).await?;
    println!("{}", format!("Account {} created", username).green());

    match authenticate(&backend, email, password).await {
        Ok(session) => {
            SessionStore::default().save(&session)?;
            println!(
                "{}",
                format!("Logged in as {}", session.display_name()).green()
            );
        }
        Err(e) => {
            tracing::warn!("Login after registration failed: {}", e);
            println!(
                "{}",
                "Could not log in automatically; run `fluxnova login`.".yellow()
            );
        }
    }
    Ok(())
}

/// Forget the stored session
pub fn logout() -> Result<()> {
    let store = SessionStore::default();
    match store.load()? {
        Some(session) => {
            store.clear()?;
            println!("Logged out {}", session.display_name());
        }
        None => println!("{}", "Not logged in.".yellow()),
    }
    Ok(())
}
