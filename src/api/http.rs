//! HTTP implementation of the Flux Nova backend
//!
//! Every request carries the static `x-api-key` header; authenticated
//! requests add `Authorization: Bearer <token>`. Responses are unwrapped
//! from the `{ "data": ... }` envelope, and non-success statuses are turned
//! into [`FluxNovaError::Status`] / [`FluxNovaError::Authentication`] with
//! the backend's message when it sent one.

use crate::api::types::{
    Credentials, Envelope, ErrorBody, FriendRef, LoginResponse, NewSnap, ProfileUpdate,
    RegisterResponse, Registration, SnapContent, SnapPayload, SnapRecord, UserRecord,
};
use crate::api::Backend;
use crate::config::ApiConfig;
use crate::error::{FluxNovaError, Result};

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

const API_KEY_HEADER: &str = "x-api-key";

/// reqwest-backed client for the Flux Nova REST API
///
/// # Examples
///
/// ```no_run
/// use fluxnova::api::{Backend, HttpBackend};
/// use fluxnova::config::ApiConfig;
///
/// # async fn example() -> fluxnova::error::Result<()> {
/// let config = ApiConfig {
///     api_key: "my-key".to_string(),
///     ..ApiConfig::default()
/// };
/// let backend = HttpBackend::new(&config)?.with_token("bearer-token");
/// let snaps = backend.list_snaps().await?;
/// println!("{} pending snaps", snaps.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    api_key: String,
    token: Option<String>,
}

impl HttpBackend {
    /// Create a client from the API configuration
    ///
    /// No network I/O happens here. The configured request timeout applies
    /// to every call made through this client.
    ///
    /// # Errors
    ///
    /// Returns [`FluxNovaError::Config`] if the base URL is invalid, or a
    /// transport error if the HTTP client cannot be initialized.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            FluxNovaError::Config(format!("Invalid base URL {}: {}", config.base_url, e))
        })?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("fluxnova/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                FluxNovaError::Transport(format!("Failed to create HTTP client: {}", e))
            })?;

        tracing::debug!(
            base_url = %base_url,
            timeout_secs = config.request_timeout_seconds,
            "Initialized backend client"
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            token: None,
        })
    }

    /// Attach the bearer token used by authenticated endpoints
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Whether a bearer token is attached
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// `PUT /user`: exchange email and password for a session
    ///
    /// # Errors
    ///
    /// Returns [`FluxNovaError::Authentication`] on rejected credentials and
    /// [`FluxNovaError::MalformedResponse`] if no token came back.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let body = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self
            .send_data(self.request(Method::PUT, &["user"])?.json(&body))
            .await?;
        if response.token.as_deref().map_or(true, str::is_empty) {
            return Err(
                FluxNovaError::MalformedResponse("login response has no token".to_string()).into(),
            );
        }
        Ok(response)
    }

    /// `POST /user`: create an account
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<RegisterResponse> {
        let body = Registration {
            email: email.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            profile_picture: String::new(),
        };
        let response = self
            .send(self.request(Method::POST, &["user"])?.json(&body))
            .await?;
        let envelope: Option<Envelope<RegisterResponse>> = response.json().await.ok();
        Ok(envelope.and_then(|e| e.data).unwrap_or_default())
    }

    /// `GET /user/friends`
    pub async fn list_friends(&self) -> Result<Vec<UserRecord>> {
        self.send_data(self.authed(Method::GET, &["user", "friends"])?)
            .await
    }

    /// `POST /user/friends`
    pub async fn add_friend(&self, friend_id: &str) -> Result<()> {
        let body = FriendRef {
            friend_id: friend_id.to_string(),
        };
        self.send(self.authed(Method::POST, &["user", "friends"])?.json(&body))
            .await?;
        Ok(())
    }

    /// `DELETE /user/friends`
    pub async fn remove_friend(&self, friend_id: &str) -> Result<()> {
        let body = FriendRef {
            friend_id: friend_id.to_string(),
        };
        self.send(self.authed(Method::DELETE, &["user", "friends"])?.json(&body))
            .await?;
        Ok(())
    }

    /// `PATCH /user`
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<()> {
        self.send(self.authed(Method::PATCH, &["user"])?.json(update))
            .await?;
        Ok(())
    }

    /// `DELETE /user`
    pub async fn delete_account(&self) -> Result<()> {
        self.send(self.authed(Method::DELETE, &["user"])?).await?;
        Ok(())
    }

    /// `POST /snap`
    pub async fn send_snap(&self, snap: &NewSnap) -> Result<()> {
        self.send(self.authed(Method::POST, &["snap"])?.json(snap))
            .await?;
        Ok(())
    }

    /// Build the URL for `segments` below the base URL, percent-encoding
    /// each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                FluxNovaError::Config(format!("Base URL cannot be a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Request carrying the API key only
    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%method, %url, "Backend request");
        Ok(self
            .client
            .request(method, url)
            .header(API_KEY_HEADER, &self.api_key))
    }

    /// Request carrying the API key and the bearer token
    fn authed(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let token = self
            .token
            .as_deref()
            .ok_or(FluxNovaError::NotAuthenticated)?;
        Ok(self.request(method, segments)?.bearer_auth(token))
    }

    /// Send a request and fail on transport errors or non-success statuses
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            tracing::debug!("Backend request failed: {}", e);
            FluxNovaError::Transport(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let raw = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&raw)
            .ok()
            .and_then(|body| body.describe())
            .unwrap_or(raw);
        tracing::debug!(status = status.as_u16(), %message, "Backend returned error");
        Err(FluxNovaError::from_status(status.as_u16(), message).into())
    }

    /// Send a request and unwrap the `data` field of the envelope
    async fn send_data<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| FluxNovaError::MalformedResponse(e.to_string()))?;
        envelope.data.ok_or_else(|| {
            FluxNovaError::MalformedResponse("response has no data field".to_string()).into()
        })
    }
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn list_snaps(&self) -> Result<Vec<SnapRecord>> {
        self.send_data(self.authed(Method::GET, &["snap"])?).await
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        self.send_data(self.authed(Method::GET, &["user"])?).await
    }

    async fn fetch_snap(&self, snap_id: &str) -> Result<SnapPayload> {
        let content: SnapContent = self
            .send_data(self.authed(Method::GET, &["snap", snap_id])?)
            .await?;
        content.into_payload().ok_or_else(|| {
            FluxNovaError::MalformedResponse(format!(
                "snap {} has no image or no positive duration",
                snap_id
            ))
            .into()
        })
    }

    async fn mark_seen(&self, snap_id: &str) -> Result<()> {
        self.send(self.authed(Method::PUT, &["snap", "seen", snap_id])?)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpBackend {
        let config = ApiConfig {
            base_url: base.to_string(),
            api_key: "k".to_string(),
            ..ApiConfig::default()
        };
        HttpBackend::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let b = backend("https://example.com");
        assert_eq!(
            b.endpoint(&["snap", "seen", "abc"]).unwrap().as_str(),
            "https://example.com/snap/seen/abc"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let b = backend("https://example.com/api/");
        assert_eq!(
            b.endpoint(&["user", "friends"]).unwrap().as_str(),
            "https://example.com/api/user/friends"
        );
    }

    #[test]
    fn test_endpoint_encodes_ids() {
        let b = backend("https://example.com");
        assert_eq!(
            b.endpoint(&["snap", "a/b c"]).unwrap().as_str(),
            "https://example.com/snap/a%2Fb%20c"
        );
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        let config = ApiConfig {
            base_url: "::nope::".to_string(),
            ..ApiConfig::default()
        };
        assert!(HttpBackend::new(&config).is_err());
    }

    #[test]
    fn test_authed_requires_token() {
        let b = backend("https://example.com");
        assert!(!b.is_authenticated());
        let err = b.authed(Method::GET, &["snap"]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FluxNovaError>(),
            Some(FluxNovaError::NotAuthenticated)
        ));
        assert!(b.with_token("t").authed(Method::GET, &["snap"]).is_ok());
    }
}
