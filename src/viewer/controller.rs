//! Snap session controller
//!
//! Owns the at-most-one [`ActiveSnapSession`] and the two timers attached
//! to it: a one-second countdown that only updates the remaining time, and
//! a single deadline that closes the session when the display time is up.
//! Manual dismissal and the deadline share one closure path; the session's
//! acknowledged flag and generation make that path idempotent whichever
//! fires first.
//!
//! State lives behind a `std::sync::Mutex` that is never held across an
//! `.await`. Network calls (fetching the payload, "mark seen") run with the
//! lock released.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::api::Backend;
use crate::viewer::acknowledger::SeenAcknowledger;
use crate::viewer::feed::{read_feed, SharedFeed};
use crate::viewer::session::{ActiveSnapSession, SessionView, SnapImage, ViewerPhase};

const TICK: Duration = Duration::from_secs(1);

/// Result of [`SnapSessionController::open`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// Session started
    Opened {
        /// Display duration reported by the backend
        duration_secs: u32,
    },
    /// Another session is open or being opened; nothing changed
    AlreadyActive,
    /// The snap was already acknowledged in this process
    AlreadySeen,
    /// The backend did not return a viewable snap
    Unavailable,
    /// The viewer was torn down
    TornDown,
}

/// What triggered a closure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseTrigger {
    /// The display time ran out
    Expired,
    /// The user dismissed the snap
    Dismissed,
}

/// How the "mark seen" step went for a closure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    /// This closure issued "mark seen" and the backend accepted it
    Sent,
    /// This closure issued "mark seen" and it failed (not retried)
    Failed,
    /// An earlier closure of the same session already issued it
    AlreadySent,
}

/// Result of a closure attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// No session to close
    NotActive,
    /// The session was closed
    Closed {
        /// Snap that was on screen
        snap_id: String,
        /// Expiry or dismissal
        trigger: CloseTrigger,
        /// What happened to "mark seen"
        acknowledgement: Acknowledgement,
    },
}

/// The single slot a session can occupy
#[derive(Debug, Default)]
enum Slot {
    #[default]
    Idle,
    Opening {
        snap_id: String,
    },
    Active(ActiveSnapSession),
}

impl Slot {
    fn phase(&self) -> ViewerPhase {
        match self {
            Slot::Idle => ViewerPhase::Idle,
            Slot::Opening { snap_id } => ViewerPhase::Opening {
                snap_id: snap_id.clone(),
            },
            Slot::Active(session) if session.is_seen_acknowledged() => ViewerPhase::Closing {
                snap_id: session.snap_id().to_string(),
            },
            Slot::Active(session) => ViewerPhase::Active {
                snap_id: session.snap_id().to_string(),
                remaining_secs: session.remaining_secs(),
                duration_secs: session.duration_secs(),
            },
        }
    }

    fn active_mut(&mut self, generation: u64) -> Option<&mut ActiveSnapSession> {
        match self {
            Slot::Active(session) if session.generation() == generation => Some(session),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct ControllerState {
    slot: Slot,
    next_generation: u64,
    countdown: Option<JoinHandle<()>>,
    deadline: Option<JoinHandle<()>>,
    torn_down: bool,
}

impl ControllerState {
    fn abort_timers(&mut self) {
        if let Some(handle) = self.countdown.take() {
            handle.abort();
        }
        if let Some(handle) = self.deadline.take() {
            handle.abort();
        }
    }
}

struct Inner {
    backend: Arc<dyn Backend>,
    acknowledger: SeenAcknowledger,
    feed: SharedFeed,
    state: Mutex<ControllerState>,
    phase: watch::Sender<ViewerPhase>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &ControllerState) {
        self.phase.send_replace(state.slot.phase());
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .abort_timers();
    }
}

/// Opens, counts down and closes one snap at a time
///
/// Cloning is cheap and every clone drives the same session.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use fluxnova::api::HttpBackend;
/// use fluxnova::config::ApiConfig;
/// use fluxnova::viewer::{Feed, OpenOutcome, SnapSessionController};
///
/// # async fn example() -> fluxnova::error::Result<()> {
/// let backend = Arc::new(HttpBackend::new(&ApiConfig::default())?.with_token("tok"));
/// let controller = SnapSessionController::new(backend, Feed::shared());
///
/// if let OpenOutcome::Opened { duration_secs } = controller.open("snap-id").await {
///     println!("showing for {}s", duration_secs);
///     controller.close().await;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SnapSessionController {
    inner: Arc<Inner>,
}

impl SnapSessionController {
    /// Controller acknowledging into `feed`
    pub fn new(backend: Arc<dyn Backend>, feed: SharedFeed) -> Self {
        let (phase, _) = watch::channel(ViewerPhase::Idle);
        Self {
            inner: Arc::new(Inner {
                acknowledger: SeenAcknowledger::new(backend.clone(), feed.clone()),
                backend,
                feed,
                state: Mutex::new(ControllerState::default()),
                phase,
            }),
        }
    }

    /// Open a snap
    ///
    /// Rejected without side effects when a session is active or being
    /// opened, when the snap was already acknowledged, or after teardown.
    /// Otherwise the payload is fetched; on success the countdown and the
    /// deadline start, on failure nothing remains open.
    pub async fn open(&self, snap_id: &str) -> OpenOutcome {
        {
            let mut state = self.inner.lock();
            if state.torn_down {
                return OpenOutcome::TornDown;
            }
            if !matches!(state.slot, Slot::Idle) {
                debug!(snap_id, "Open rejected, a session is already active");
                return OpenOutcome::AlreadyActive;
            }
            if read_feed(&self.inner.feed).is_removed(snap_id) {
                debug!(snap_id, "Open rejected, snap already seen");
                return OpenOutcome::AlreadySeen;
            }
            state.slot = Slot::Opening {
                snap_id: snap_id.to_string(),
            };
            self.inner.publish(&state);
        }

        let fetched = self.inner.backend.fetch_snap(snap_id).await;

        let mut state = self.inner.lock();
        if state.torn_down {
            return OpenOutcome::TornDown;
        }

        let payload = match fetched {
            Ok(payload) => payload,
            Err(e) => {
                warn!(snap_id, "Failed to open snap: {}", e);
                state.slot = Slot::Idle;
                self.inner.publish(&state);
                return OpenOutcome::Unavailable;
            }
        };

        let generation = state.next_generation;
        state.next_generation += 1;
        let duration_secs = payload.duration_secs;
        let duration = Duration::from_secs(u64::from(duration_secs));

        state.slot = Slot::Active(ActiveSnapSession::new(generation, snap_id, payload));
        let weak = Arc::downgrade(&self.inner);
        state.countdown = Some(tokio::spawn(run_countdown(weak.clone(), generation)));
        state.deadline = Some(tokio::spawn(run_deadline(weak, generation, duration)));
        self.inner.publish(&state);

        info!(snap_id, duration_secs, "Snap opened");
        OpenOutcome::Opened { duration_secs }
    }

    /// Dismiss the open snap
    ///
    /// Idempotent: without an open session this is [`CloseOutcome::NotActive`].
    pub async fn close(&self) -> CloseOutcome {
        self.close_session(CloseTrigger::Dismissed, None).await
    }

    /// The single closure path shared by dismissal and expiry.
    ///
    /// `generation` pins the closure to one session so a late deadline can
    /// never close a newer one.
    async fn close_session(&self, trigger: CloseTrigger, generation: Option<u64>) -> CloseOutcome {
        let (snap_id, closing_generation, needs_ack) = {
            let mut state = self.inner.lock();
            let Slot::Active(session) = &mut state.slot else {
                return CloseOutcome::NotActive;
            };
            if matches!(generation, Some(g) if g != session.generation()) {
                return CloseOutcome::NotActive;
            }

            if trigger == CloseTrigger::Expired {
                session.expire();
            }
            let needs_ack = session.mark_acknowledged();
            let snap_id = session.snap_id().to_string();
            let closing_generation = session.generation();

            if let Some(handle) = state.countdown.take() {
                handle.abort();
            }
            // Expiry runs inside the deadline task; aborting it would cancel
            // this very closure.
            let deadline = state.deadline.take();
            if trigger == CloseTrigger::Dismissed {
                if let Some(handle) = deadline {
                    handle.abort();
                }
            }
            self.inner.publish(&state);

            (snap_id, closing_generation, needs_ack)
        };

        let acknowledgement = if needs_ack {
            if self.inner.acknowledger.acknowledge(&snap_id).await {
                Acknowledgement::Sent
            } else {
                Acknowledgement::Failed
            }
        } else {
            Acknowledgement::AlreadySent
        };

        {
            let mut state = self.inner.lock();
            if state.slot.active_mut(closing_generation).is_some() {
                state.slot = Slot::Idle;
                self.inner.publish(&state);
            }
        }

        info!(snap_id = %snap_id, ?trigger, ?acknowledgement, "Snap closed");
        CloseOutcome::Closed {
            snap_id,
            trigger,
            acknowledgement,
        }
    }

    /// Cancel every timer and drop the session without acknowledging it
    ///
    /// Every later [`open`](Self::open) returns [`OpenOutcome::TornDown`].
    pub fn teardown(&self) {
        let mut state = self.inner.lock();
        if state.torn_down {
            return;
        }
        state.torn_down = true;
        state.abort_timers();
        if let Slot::Active(session) = &state.slot {
            debug!(snap_id = session.snap_id(), "Discarding open snap on teardown");
        }
        state.slot = Slot::Idle;
        self.inner.publish(&state);
    }

    /// Whether [`teardown`](Self::teardown) ran
    pub fn is_torn_down(&self) -> bool {
        self.inner.lock().torn_down
    }

    /// Whether a session is on screen (including while closing)
    pub fn is_active(&self) -> bool {
        matches!(self.inner.lock().slot, Slot::Active(_))
    }

    /// Copy of the active session's state
    pub fn snapshot(&self) -> Option<SessionView> {
        match &self.inner.lock().slot {
            Slot::Active(session) => Some(session.view()),
            _ => None,
        }
    }

    /// Image of the active session
    pub fn image(&self) -> Option<SnapImage> {
        match &self.inner.lock().slot {
            Slot::Active(session) => Some(session.image().clone()),
            _ => None,
        }
    }

    /// Current phase
    pub fn phase(&self) -> ViewerPhase {
        self.inner.phase.borrow().clone()
    }

    /// Receiver notified on every phase change and countdown step
    pub fn subscribe(&self) -> watch::Receiver<ViewerPhase> {
        self.inner.phase.subscribe()
    }
}

/// Decrement the remaining time once per second until it reaches zero.
///
/// Never closes the session; that is the deadline's job.
async fn run_countdown(inner: Weak<Inner>, generation: u64) {
    let mut ticker = tokio::time::interval_at(Instant::now() + TICK, TICK);
    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };
        let mut state = inner.lock();
        let remaining = match state.slot.active_mut(generation) {
            Some(session) => session.tick(),
            None => break,
        };
        inner.publish(&state);
        if remaining == 0 {
            break;
        }
    }
}

/// Close the session once its display time is over.
async fn run_deadline(inner: Weak<Inner>, generation: u64, duration: Duration) {
    tokio::time::sleep(duration).await;
    if let Some(inner) = inner.upgrade() {
        let controller = SnapSessionController { inner };
        controller
            .close_session(CloseTrigger::Expired, Some(generation))
            .await;
    }
}
