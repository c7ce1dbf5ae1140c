//! In-memory fake backend for viewer unit tests
//!
//! [`FakeBackend`] serves canned snaps, users and payloads and records every
//! call so tests can assert exactly how often the viewer hit the backend.
//! Failure switches let a test simulate a backend that is down.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::api::types::{SnapPayload, SnapRecord, UserRecord};
use crate::api::Backend;
use crate::error::{FluxNovaError, Result};

/// Scriptable in-memory [`Backend`].
#[derive(Debug, Default)]
pub struct FakeBackend {
    snaps: Mutex<Vec<SnapRecord>>,
    users: Mutex<Vec<UserRecord>>,
    payloads: Mutex<HashMap<String, SnapPayload>>,
    seen: Mutex<Vec<String>>,
    fetched: Mutex<Vec<String>>,
    list_calls: AtomicUsize,
    fail_polls: AtomicBool,
    fail_mark_seen: AtomicBool,
    mark_seen_delay: Mutex<Option<Duration>>,
    fetch_delay: Mutex<Option<Duration>>,
    list_delay: Mutex<Option<Duration>>,
}

impl FakeBackend {
    /// Empty backend: no snaps, no users.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pending snap from `from`, with a payload of `duration_secs`.
    pub fn add_snap(&self, id: &str, from: &str, date: &str, duration_secs: u32) {
        self.snaps.lock().unwrap().push(SnapRecord {
            id: id.to_string(),
            from: from.to_string(),
            date: Some(date.to_string()),
        });
        self.payloads.lock().unwrap().insert(
            id.to_string(),
            SnapPayload {
                image: "data:image/png;base64,aGVsbG8=".to_string(),
                duration_secs,
            },
        );
    }

    /// Add a known user.
    pub fn add_user(&self, id: &str, username: &str, picture: Option<&str>) {
        self.users.lock().unwrap().push(UserRecord {
            id: id.to_string(),
            username: username.to_string(),
            profile_picture: picture.map(str::to_string),
        });
    }

    /// Replace the listed snaps without touching payloads.
    pub fn set_listed(&self, records: Vec<SnapRecord>) {
        *self.snaps.lock().unwrap() = records;
    }

    /// Make `GET /snap/{id}` fail for this id.
    pub fn remove_payload(&self, id: &str) {
        self.payloads.lock().unwrap().remove(id);
    }

    /// Make polls fail (or succeed again).
    pub fn set_fail_polls(&self, fail: bool) {
        self.fail_polls.store(fail, Ordering::SeqCst);
    }

    /// Make `mark_seen` fail (or succeed again).
    pub fn set_fail_mark_seen(&self, fail: bool) {
        self.fail_mark_seen.store(fail, Ordering::SeqCst);
    }

    /// Delay each `mark_seen` call by `delay`.
    pub fn set_mark_seen_delay(&self, delay: Duration) {
        *self.mark_seen_delay.lock().unwrap() = Some(delay);
    }

    /// Delay each `fetch_snap` call by `delay`.
    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = Some(delay);
    }

    /// Delay each `list_snaps` and `list_users` response by `delay`.
    ///
    /// The listing is taken when the call starts, so a delayed response
    /// reflects the backend as it was at request time.
    pub fn set_list_delay(&self, delay: Duration) {
        *self.list_delay.lock().unwrap() = Some(delay);
    }

    async fn list_latency(&self) {
        let delay = *self.list_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    /// Snap ids passed to `mark_seen`, in call order.
    pub fn seen_calls(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    /// Snap ids passed to `fetch_snap`, in call order.
    pub fn fetch_calls(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    /// Number of `list_snaps` calls so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Backend for FakeBackend {
    async fn list_snaps(&self) -> Result<Vec<SnapRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_polls.load(Ordering::SeqCst) {
            return Err(FluxNovaError::Transport("backend unreachable".to_string()).into());
        }
        let snaps = self.snaps.lock().unwrap().clone();
        self.list_latency().await;
        Ok(snaps)
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        if self.fail_polls.load(Ordering::SeqCst) {
            return Err(FluxNovaError::Transport("backend unreachable".to_string()).into());
        }
        let users = self.users.lock().unwrap().clone();
        self.list_latency().await;
        Ok(users)
    }

    async fn fetch_snap(&self, snap_id: &str) -> Result<SnapPayload> {
        self.fetched.lock().unwrap().push(snap_id.to_string());
        let delay = *self.fetch_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.payloads
            .lock()
            .unwrap()
            .get(snap_id)
            .cloned()
            .ok_or_else(|| FluxNovaError::from_status(404, "snap not found").into())
    }

    async fn mark_seen(&self, snap_id: &str) -> Result<()> {
        self.seen.lock().unwrap().push(snap_id.to_string());
        let delay = *self.mark_seen_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_mark_seen.load(Ordering::SeqCst) {
            return Err(FluxNovaError::from_status(500, "mark seen failed").into());
        }
        Ok(())
    }
}
