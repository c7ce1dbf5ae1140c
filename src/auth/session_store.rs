//! Login session persistence via OS keyring
//!
//! The bearer token and the logged-in identity are stored together as JSON
//! in the operating system's credential store (Keychain on macOS, Secret
//! Service on Linux, Windows Credential Manager on Windows).

use serde::{Deserialize, Serialize};

use crate::api::types::LoginResponse;
use crate::error::{FluxNovaError, Result};

const SERVICE_NAME: &str = "fluxnova";
const DEFAULT_ACCOUNT: &str = "session";

// ---------------------------------------------------------------------------
// StoredSession
// ---------------------------------------------------------------------------

/// The logged-in identity plus its bearer token.
///
/// # Examples
///
/// ```
/// use fluxnova::auth::StoredSession;
///
/// let session = StoredSession {
///     token: "tok".to_string(),
///     user_id: "u1".to_string(),
///     email: "a@example.com".to_string(),
///     username: "alice".to_string(),
///     profile_picture: None,
/// };
/// assert_eq!(session.display_name(), "alice");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    /// Bearer token
    pub token: String,
    /// User identifier
    pub user_id: String,
    /// Account email
    pub email: String,
    /// Public username
    pub username: String,
    /// Avatar data URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

impl StoredSession {
    /// Build a session from a login response
    ///
    /// # Errors
    ///
    /// Returns [`FluxNovaError::MalformedResponse`] if the response carries
    /// no token.
    pub fn from_login(response: LoginResponse) -> Result<Self> {
        let token = response
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| FluxNovaError::MalformedResponse("login has no token".to_string()))?;
        Ok(Self {
            token,
            user_id: response.id,
            email: response.email,
            username: response.username,
            profile_picture: response.profile_picture.filter(|p| !p.is_empty()),
        })
    }

    /// Username, or the email when the username is empty
    pub fn display_name(&self) -> &str {
        if self.username.is_empty() {
            &self.email
        } else {
            &self.username
        }
    }
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// Keyring accessor for the stored session.
///
/// Sessions are stored under the `fluxnova` service; the account name
/// defaults to `session` and can be changed to keep several profiles apart.
///
/// # Examples
///
/// ```no_run
/// use fluxnova::auth::SessionStore;
///
/// # fn example() -> fluxnova::error::Result<()> {
/// let store = SessionStore::default();
/// match store.load()? {
///     Some(session) => println!("Logged in as {}", session.display_name()),
///     None => println!("Not logged in"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SessionStore {
    account: String,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_ACCOUNT)
    }
}

impl SessionStore {
    /// Accessor for a named keyring account
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry> {
        Ok(keyring::Entry::new(SERVICE_NAME, &self.account).map_err(FluxNovaError::Keyring)?)
    }

    /// Persist `session`, replacing any previous one
    ///
    /// # Errors
    ///
    /// Returns [`FluxNovaError::Keyring`] if the credential store rejects the
    /// write.
    pub fn save(&self, session: &StoredSession) -> Result<()> {
        let json = serde_json::to_string(session)?;
        self.entry()?
            .set_password(&json)
            .map_err(FluxNovaError::Keyring)?;
        tracing::debug!(account = %self.account, "Saved session to keyring");
        Ok(())
    }

    /// Load the stored session; `Ok(None)` if nobody is logged in
    pub fn load(&self) -> Result<Option<StoredSession>> {
        match self.entry()?.get_password() {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(FluxNovaError::Keyring(e).into()),
        }
    }

    /// Load the stored session or fail with [`FluxNovaError::NotAuthenticated`]
    pub fn require(&self) -> Result<StoredSession> {
        self.load()?
            .ok_or_else(|| FluxNovaError::NotAuthenticated.into())
    }

    /// Forget the stored session; a no-op when none exists
    pub fn clear(&self) -> Result<()> {
        match self.entry()?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(FluxNovaError::Keyring(e).into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
