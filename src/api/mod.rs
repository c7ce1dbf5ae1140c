//! Backend access for Flux Nova
//!
//! This module defines the [`Backend`] trait the snap viewer depends on and
//! the [`HttpBackend`] implementation that talks to the real service.
//! Account, friend and profile operations are not needed by the viewer and
//! live as inherent methods on [`HttpBackend`].
//!
//! - [`http::HttpBackend`] -- reqwest client with API-key and bearer auth
//! - [`types`] -- wire types and envelope handling
//! - `fake::FakeBackend` -- in-memory backend for viewer tests (cfg(test) only)

pub mod http;
pub mod types;

#[cfg(test)]
pub mod fake;

pub use http::HttpBackend;
pub use types::{SnapPayload, SnapRecord, UserRecord};

use crate::error::Result;

/// The backend calls the snap viewer relies on.
///
/// Implementations must be cheap to share behind an `Arc`; the feed poller
/// and the session controller call into the same instance from separate
/// tasks.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// `GET /snap`: pending snaps addressed to the current user.
    async fn list_snaps(&self) -> Result<Vec<SnapRecord>>;

    /// `GET /user`: every known user, used to resolve sender identities.
    async fn list_users(&self) -> Result<Vec<UserRecord>>;

    /// `GET /snap/{id}`: the image and display duration of one snap.
    ///
    /// # Errors
    ///
    /// Fails on transport errors, non-success statuses, and bodies missing
    /// the image or a positive duration.
    async fn fetch_snap(&self, snap_id: &str) -> Result<SnapPayload>;

    /// `PUT /snap/seen/{id}`: acknowledge that a snap was viewed.
    async fn mark_seen(&self, snap_id: &str) -> Result<()>;
}
