//! Ephemeral snap viewer
//!
//! The viewer keeps a polled feed of pending snaps and shows at most one of
//! them at a time. A shown snap counts down from its display duration and
//! is closed by whichever comes first, the deadline or a dismissal. Either
//! way the backend is told exactly once that it was seen, and the snap
//! leaves the local feed for good.
//!
//! - [`feed`]: feed model and the [`FeedPoller`] background task
//! - [`controller`]: the [`SnapSessionController`] state machine
//! - [`acknowledger`]: the "mark seen" side effect
//! - [`session`]: state of the snap on screen

pub mod acknowledger;
pub mod controller;
pub mod feed;
pub mod session;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::Backend;
use crate::error::Result;

pub use acknowledger::SeenAcknowledger;
pub use controller::{
    Acknowledgement, CloseOutcome, CloseTrigger, OpenOutcome, SnapSessionController,
};
pub use feed::{
    build_feed, Feed, FeedPoller, SenderIdentity, SharedFeed, SnapSummary, UNKNOWN_SENDER,
};
pub use session::{ActiveSnapSession, SessionView, SnapImage, ViewerPhase};

/// Feed, poller and session controller wired together
///
/// Dropping the viewer tears it down: polling stops, timers are cancelled
/// and an open snap is discarded without being marked seen.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use fluxnova::api::HttpBackend;
/// use fluxnova::config::ApiConfig;
/// use fluxnova::viewer::SnapViewer;
///
/// # tokio_test::block_on(async {
/// let backend = HttpBackend::new(&ApiConfig::default()).unwrap().with_token("tok");
/// let viewer = SnapViewer::start(Arc::new(backend), Duration::from_secs(1));
///
/// viewer.poll_now().await.unwrap();
/// for snap in viewer.feed() {
///     println!("{} from {}", snap.id, snap.sender.username);
/// }
/// # });
/// ```
pub struct SnapViewer {
    feed: SharedFeed,
    poller: FeedPoller,
    controller: SnapSessionController,
    cancel: CancellationToken,
    polling: Mutex<Option<JoinHandle<()>>>,
}

impl SnapViewer {
    /// Viewer over `backend` with an empty feed and no polling yet
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let feed = Feed::shared();
        Self {
            poller: FeedPoller::new(backend.clone(), feed.clone()),
            controller: SnapSessionController::new(backend, feed.clone()),
            feed,
            cancel: CancellationToken::new(),
            polling: Mutex::new(None),
        }
    }

    /// Viewer that polls immediately and then every `interval`
    pub fn start(backend: Arc<dyn Backend>, interval: Duration) -> Self {
        let viewer = Self::new(backend);
        viewer.start_polling(interval);
        viewer
    }

    /// Start background polling; no-op if already polling or torn down
    pub fn start_polling(&self, interval: Duration) {
        if self.cancel.is_cancelled() {
            return;
        }
        let mut polling = self.polling.lock().unwrap_or_else(PoisonError::into_inner);
        if polling.is_none() {
            *polling = Some(self.poller.clone().spawn(interval, self.cancel.child_token()));
        }
    }

    /// Run one poll cycle right away
    ///
    /// After teardown this makes no backend call and returns the size of
    /// the feed as it stands.
    pub async fn poll_now(&self) -> Result<usize> {
        if self.cancel.is_cancelled() {
            return Ok(feed::read_feed(&self.feed).len());
        }
        self.poller.poll_once().await
    }

    /// Visible feed, newest first
    pub fn feed(&self) -> Vec<SnapSummary> {
        feed::read_feed(&self.feed).entries().to_vec()
    }

    /// Feed revision, bumped whenever the visible feed changes
    pub fn feed_version(&self) -> u64 {
        feed::read_feed(&self.feed).version()
    }

    /// Shared handle on the feed
    pub fn shared_feed(&self) -> SharedFeed {
        self.feed.clone()
    }

    /// The session controller
    pub fn controller(&self) -> &SnapSessionController {
        &self.controller
    }

    /// Open a snap from the feed
    pub async fn open(&self, snap_id: &str) -> OpenOutcome {
        self.controller.open(snap_id).await
    }

    /// Dismiss the open snap
    pub async fn close(&self) -> CloseOutcome {
        self.controller.close().await
    }

    /// Stop polling and timers, and discard any open snap unacknowledged
    pub fn teardown(&self) {
        self.cancel.cancel();
        if let Some(handle) = self
            .polling
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
        self.controller.teardown();
    }

    /// Whether [`teardown`](Self::teardown) ran
    pub fn is_torn_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for SnapViewer {
    fn drop(&mut self) {
        self.teardown();
    }
}
