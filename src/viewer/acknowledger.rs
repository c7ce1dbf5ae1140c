//! "Mark seen" side effect

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::Backend;
use crate::viewer::feed::{write_feed, SharedFeed};

/// Tells the backend a snap was viewed and drops it from the local feed.
///
/// Stateless: the caller guarantees it is invoked at most once per snap.
/// The local removal happens whether or not the backend call succeeds, and
/// failures are not retried.
#[derive(Clone)]
pub struct SeenAcknowledger {
    backend: Arc<dyn Backend>,
    feed: SharedFeed,
}

impl SeenAcknowledger {
    /// Acknowledger writing into `feed`
    pub fn new(backend: Arc<dyn Backend>, feed: SharedFeed) -> Self {
        Self { backend, feed }
    }

    /// Issue `PUT /snap/seen/{id}` and remove the snap from the feed
    ///
    /// # Returns
    ///
    /// `true` if the backend accepted the acknowledgement
    pub async fn acknowledge(&self, snap_id: &str) -> bool {
        let accepted = match self.backend.mark_seen(snap_id).await {
            Ok(()) => {
                info!(snap_id, "Snap marked as seen");
                true
            }
            Err(e) => {
                warn!(snap_id, "Failed to mark snap as seen: {}", e);
                false
            }
        };

        write_feed(&self.feed).remove(snap_id);
        accepted
    }
}
