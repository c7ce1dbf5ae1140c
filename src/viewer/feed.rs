//! Pending-snap feed and the poller that keeps it fresh
//!
//! Each successful poll replaces the whole feed. Snaps acknowledged in this
//! process are remembered in a removed set and filtered out of every later
//! poll, so a response that still lists them (stale or not yet purged by
//! the backend) cannot bring them back.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::types::{SnapRecord, UserRecord};
use crate::api::Backend;
use crate::error::Result;

/// Display name used when a sender cannot be resolved
pub const UNKNOWN_SENDER: &str = "unknown user";

/// Shortest period the background poller will run at
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Who sent a snap, as shown in the feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderIdentity {
    /// Sender username
    pub username: String,
    /// Avatar reference (URL or data URI)
    pub avatar: Option<String>,
}

impl SenderIdentity {
    /// Placeholder for senders missing from the user list
    pub fn unknown() -> Self {
        Self {
            username: UNKNOWN_SENDER.to_string(),
            avatar: None,
        }
    }

    fn from_user(user: &UserRecord) -> Self {
        Self {
            username: user.username.clone(),
            avatar: user.avatar().map(str::to_string),
        }
    }
}

/// One pending snap, joined with its sender
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapSummary {
    /// Snap identifier
    pub id: String,
    /// Sender user id
    pub sender_id: String,
    /// Resolved sender, or [`SenderIdentity::unknown`]
    pub sender: SenderIdentity,
    /// Creation time; `None` if the backend sent none or garbage
    pub created_at: Option<DateTime<Utc>>,
}

/// Join snaps to their senders and order them newest first
///
/// Snaps without a usable timestamp go last, keeping backend order among
/// themselves.
pub fn build_feed(snaps: Vec<SnapRecord>, users: &[UserRecord]) -> Vec<SnapSummary> {
    let by_id: HashMap<&str, &UserRecord> = users.iter().map(|u| (u.id.as_str(), u)).collect();

    let mut entries: Vec<SnapSummary> = snaps
        .into_iter()
        .map(|snap| {
            let sender = by_id
                .get(snap.from.as_str())
                .map(|u| SenderIdentity::from_user(u))
                .unwrap_or_else(SenderIdentity::unknown);
            SnapSummary {
                created_at: snap.created_at(),
                id: snap.id,
                sender_id: snap.from,
                sender,
            }
        })
        .collect();

    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    entries
}

/// Locally held feed
#[derive(Debug, Default)]
pub struct Feed {
    entries: Vec<SnapSummary>,
    removed: HashSet<String>,
    version: u64,
}

/// Feed shared between the poller, the acknowledger and readers
pub type SharedFeed = Arc<RwLock<Feed>>;

impl Feed {
    /// Empty shared feed
    pub fn shared() -> SharedFeed {
        Arc::new(RwLock::new(Feed::default()))
    }

    /// Replace the feed with a fresh poll result
    ///
    /// Identifiers in the removed set are dropped. Returns `true` if the
    /// visible entries changed.
    pub fn replace(&mut self, entries: Vec<SnapSummary>) -> bool {
        let entries: Vec<SnapSummary> = entries
            .into_iter()
            .filter(|e| !self.removed.contains(&e.id))
            .collect();
        if entries == self.entries {
            return false;
        }
        self.entries = entries;
        self.version += 1;
        true
    }

    /// Drop a snap for good
    ///
    /// Returns `true` if it was visible.
    pub fn remove(&mut self, snap_id: &str) -> bool {
        self.removed.insert(snap_id.to_string());
        let before = self.entries.len();
        self.entries.retain(|e| e.id != snap_id);
        let changed = self.entries.len() != before;
        if changed {
            self.version += 1;
        }
        changed
    }

    /// Visible entries, newest first
    pub fn entries(&self) -> &[SnapSummary] {
        &self.entries
    }

    /// Look up a visible entry
    pub fn get(&self, snap_id: &str) -> Option<&SnapSummary> {
        self.entries.iter().find(|e| e.id == snap_id)
    }

    /// Whether a snap is visible
    pub fn contains(&self, snap_id: &str) -> bool {
        self.get(snap_id).is_some()
    }

    /// Whether a snap was removed in this process
    pub fn is_removed(&self, snap_id: &str) -> bool {
        self.removed.contains(snap_id)
    }

    /// Number of visible entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the feed is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bumped on every visible change
    pub fn version(&self) -> u64 {
        self.version
    }
}

pub(crate) fn read_feed(feed: &SharedFeed) -> RwLockReadGuard<'_, Feed> {
    feed.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_feed(feed: &SharedFeed) -> RwLockWriteGuard<'_, Feed> {
    feed.write().unwrap_or_else(PoisonError::into_inner)
}

/// Fetches pending snaps and senders, and replaces the feed
#[derive(Clone)]
pub struct FeedPoller {
    backend: Arc<dyn Backend>,
    feed: SharedFeed,
}

impl FeedPoller {
    /// Poller writing into `feed`
    pub fn new(backend: Arc<dyn Backend>, feed: SharedFeed) -> Self {
        Self { backend, feed }
    }

    /// Run one poll cycle
    ///
    /// Snaps and users are fetched concurrently. On any failure the feed is
    /// left untouched.
    ///
    /// # Returns
    ///
    /// The number of visible entries after the update
    pub async fn poll_once(&self) -> Result<usize> {
        let (snaps, users) =
            futures::try_join!(self.backend.list_snaps(), self.backend.list_users())?;
        let entries = build_feed(snaps, &users);

        let mut feed = write_feed(&self.feed);
        if feed.replace(entries) {
            debug!(entries = feed.len(), "Feed updated");
        }
        Ok(feed.len())
    }

    /// Poll now and then on every `interval` until `cancel` fires
    ///
    /// Failed polls are logged and skipped. A poll in flight when `cancel`
    /// fires is dropped without touching the feed. Intervals shorter than
    /// [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn spawn(self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        if interval < MIN_POLL_INTERVAL {
            warn!(?interval, "Poll interval too short, using {:?}", MIN_POLL_INTERVAL);
        }
        let interval = interval.max(MIN_POLL_INTERVAL);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    result = self.poll_once() => {
                        if let Err(e) = result {
                            warn!("Feed poll failed, keeping previous feed: {}", e);
                        }
                    }
                }
            }

            debug!("Feed poller stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeBackend;
    use crate::viewer::acknowledger::SeenAcknowledger;

    fn record(id: &str, from: &str, date: Option<&str>) -> SnapRecord {
        SnapRecord {
            id: id.to_string(),
            from: from.to_string(),
            date: date.map(str::to_string),
        }
    }

    fn user(id: &str, name: &str, picture: &str) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            username: name.to_string(),
            profile_picture: Some(picture.to_string()),
        }
    }

    fn ids(feed: &SharedFeed) -> Vec<String> {
        read_feed(feed).entries().iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn test_build_feed_sorts_newest_first() {
        let snaps = vec![
            record("old", "u1", Some("2024-01-01T00:00:00Z")),
            record("undated", "u1", None),
            record("new", "u1", Some("2024-03-01T00:00:00Z")),
            record("mid", "u1", Some("2024-02-01T00:00:00.000Z")),
        ];
        let feed = build_feed(snaps, &[]);
        let order: Vec<&str> = feed.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(order, vec!["new", "mid", "old", "undated"]);
    }

    #[test]
    fn test_build_feed_resolves_senders() {
        let snaps = vec![
            record("s1", "u1", Some("2024-01-01T00:00:00Z")),
            record("s2", "ghost", Some("2024-01-02T00:00:00Z")),
        ];
        let users = vec![user("u1", "alice", "https://cdn/a.png")];
        let feed = build_feed(snaps, &users);

        let s1 = feed.iter().find(|e| e.id == "s1").unwrap();
        assert_eq!(s1.sender.username, "alice");
        assert_eq!(s1.sender.avatar.as_deref(), Some("https://cdn/a.png"));

        let s2 = feed.iter().find(|e| e.id == "s2").unwrap();
        assert_eq!(s2.sender, SenderIdentity::unknown());
        assert_eq!(s2.sender.username, UNKNOWN_SENDER);
        assert_eq!(s2.sender_id, "ghost");
    }

    #[test]
    fn test_empty_avatar_is_none() {
        let feed = build_feed(
            vec![record("s1", "u1", None)],
            &[user("u1", "alice", "")],
        );
        assert_eq!(feed[0].sender.avatar, None);
    }

    #[test]
    fn test_removed_snap_never_comes_back() {
        let mut feed = Feed::default();
        let entries = build_feed(
            vec![record("a", "u", None), record("b", "u", None)],
            &[],
        );
        assert!(feed.replace(entries.clone()));
        assert!(feed.remove("a"));
        assert!(!feed.remove("a"));

        // A later poll still listing "a" does not resurrect it
        feed.replace(entries);
        assert!(!feed.contains("a"));
        assert!(feed.contains("b"));
        assert!(feed.is_removed("a"));
    }

    #[test]
    fn test_remove_before_first_poll_is_remembered() {
        let mut feed = Feed::default();
        assert!(!feed.remove("a"));
        feed.replace(build_feed(vec![record("a", "u", None)], &[]));
        assert!(feed.is_empty());
    }

    #[test]
    fn test_version_only_bumps_on_change() {
        let mut feed = Feed::default();
        let entries = build_feed(vec![record("a", "u", None)], &[]);
        assert!(feed.replace(entries.clone()));
        let v = feed.version();
        assert!(!feed.replace(entries));
        assert_eq!(feed.version(), v);
        feed.remove("a");
        assert_eq!(feed.version(), v + 1);
    }

    #[tokio::test]
    async fn test_poll_once_replaces_feed() {
        let backend = Arc::new(FakeBackend::new());
        backend.add_user("u1", "alice", None);
        backend.add_snap("s1", "u1", "2024-01-01T00:00:00Z", 5);
        backend.add_snap("s2", "u2", "2024-01-02T00:00:00Z", 5);

        let feed = Feed::shared();
        let poller = FeedPoller::new(backend.clone(), feed.clone());
        assert_eq!(poller.poll_once().await.unwrap(), 2);
        assert_eq!(ids(&feed), vec!["s2", "s1"]);

        // Whole-list replacement, not a merge
        backend.set_listed(vec![record("s3", "u1", None)]);
        poller.poll_once().await.unwrap();
        assert_eq!(ids(&feed), vec!["s3"]);
    }

    #[tokio::test]
    async fn test_failed_poll_keeps_previous_feed() {
        let backend = Arc::new(FakeBackend::new());
        backend.add_snap("s1", "u1", "2024-01-01T00:00:00Z", 5);

        let feed = Feed::shared();
        let poller = FeedPoller::new(backend.clone(), feed.clone());
        poller.poll_once().await.unwrap();

        backend.set_fail_polls(true);
        backend.set_listed(vec![]);
        assert!(poller.poll_once().await.is_err());
        assert_eq!(ids(&feed), vec!["s1"]);
    }

    #[tokio::test]
    async fn test_poll_after_removal_filters_stale_entry() {
        let backend = Arc::new(FakeBackend::new());
        backend.add_snap("s1", "u1", "2024-01-01T00:00:00Z", 5);
        backend.add_snap("s2", "u1", "2024-01-02T00:00:00Z", 5);

        let feed = Feed::shared();
        let poller = FeedPoller::new(backend.clone(), feed.clone());
        poller.poll_once().await.unwrap();

        write_feed(&feed).remove("s1");
        // Backend still lists s1
        poller.poll_once().await.unwrap();
        assert_eq!(ids(&feed), vec!["s2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_removal_during_in_flight_poll_is_not_undone() {
        let backend = Arc::new(FakeBackend::new());
        backend.add_snap("s1", "u1", "2024-01-01T00:00:00Z", 5);
        backend.add_snap("s2", "u1", "2024-01-02T00:00:00Z", 5);

        let feed = Feed::shared();
        let poller = FeedPoller::new(backend.clone(), feed.clone());
        poller.poll_once().await.unwrap();

        // This response is captured before s1 is acknowledged
        backend.set_list_delay(Duration::from_millis(500));
        let in_flight = tokio::spawn({
            let poller = poller.clone();
            async move { poller.poll_once().await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(backend.list_calls(), 2);

        let acknowledger = SeenAcknowledger::new(backend.clone(), feed.clone());
        assert!(acknowledger.acknowledge("s1").await);
        assert_eq!(ids(&feed), vec!["s2"]);

        assert_eq!(in_flight.await.unwrap().unwrap(), 1);
        assert_eq!(ids(&feed), vec!["s2"]);
        assert!(read_feed(&feed).is_removed("s1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_poller_with_zero_interval_does_not_panic() {
        let backend = Arc::new(FakeBackend::new());
        backend.add_snap("s1", "u1", "2024-01-01T00:00:00Z", 5);
        let feed = Feed::shared();
        let cancel = CancellationToken::new();
        let handle = FeedPoller::new(backend.clone(), feed.clone())
            .spawn(Duration::ZERO, cancel.clone());

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(backend.list_calls() >= 1);
        assert_eq!(ids(&feed), vec!["s1"]);

        cancel.cancel();
        assert!(handle.await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_poller_polls_on_interval_until_cancelled() {
        let backend = Arc::new(FakeBackend::new());
        let feed = Feed::shared();
        let cancel = CancellationToken::new();
        let handle = FeedPoller::new(backend.clone(), feed)
            .spawn(Duration::from_secs(1), cancel.clone());

        // Polls at t=0, 1, 2, 3
        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(backend.list_calls(), 4);

        cancel.cancel();
        handle.await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(backend.list_calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_poller_survives_failures() {
        let backend = Arc::new(FakeBackend::new());
        backend.set_fail_polls(true);
        let feed = Feed::shared();
        let cancel = CancellationToken::new();
        let handle = FeedPoller::new(backend.clone(), feed.clone())
            .spawn(Duration::from_secs(1), cancel.clone());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        backend.set_fail_polls(false);
        backend.add_snap("s1", "u1", "2024-01-01T00:00:00Z", 5);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(ids(&feed), vec!["s1"]);

        cancel.cancel();
        handle.await.unwrap();
    }
}
