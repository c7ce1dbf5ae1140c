//! Local state of the snap currently on screen

use crate::api::types::SnapPayload;
use crate::media::DataUri;

/// Image payload of an open snap
///
/// Well-formed data URIs are decoded; anything else is kept as the raw
/// text bytes with no MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapImage {
    /// MIME type from the data URI
    pub mime: Option<String>,
    /// Decoded image bytes
    pub bytes: Vec<u8>,
}

impl SnapImage {
    /// Decode a data URI, falling back to the raw text on parse failure
    pub fn from_data_uri(uri: &str) -> Self {
        match DataUri::parse(uri) {
            Ok(decoded) => Self {
                mime: Some(decoded.mime),
                bytes: decoded.bytes,
            },
            Err(e) => {
                tracing::debug!("Snap image is not a data URI ({}), keeping raw payload", e);
                Self {
                    mime: None,
                    bytes: uri.as_bytes().to_vec(),
                }
            }
        }
    }
}

/// The one snap being displayed
///
/// Only the session controller mutates it. `remaining_secs` never
/// increases and `seen_acknowledged` never goes back to false.
#[derive(Debug, Clone)]
pub struct ActiveSnapSession {
    generation: u64,
    snap_id: String,
    image: SnapImage,
    duration_secs: u32,
    remaining_secs: u32,
    seen_acknowledged: bool,
}

impl ActiveSnapSession {
    pub(crate) fn new(generation: u64, snap_id: &str, payload: SnapPayload) -> Self {
        Self {
            generation,
            snap_id: snap_id.to_string(),
            image: SnapImage::from_data_uri(&payload.image),
            duration_secs: payload.duration_secs,
            remaining_secs: payload.duration_secs,
            seen_acknowledged: false,
        }
    }

    /// Counter distinguishing this session from earlier and later ones
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Identifier of the displayed snap
    pub fn snap_id(&self) -> &str {
        &self.snap_id
    }

    /// Displayed image
    pub fn image(&self) -> &SnapImage {
        &self.image
    }

    /// Total display duration
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    /// Seconds left on the countdown
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    /// Whether "mark seen" has been issued for this snap
    pub fn is_seen_acknowledged(&self) -> bool {
        self.seen_acknowledged
    }

    /// One countdown step; saturates at zero
    pub(crate) fn tick(&mut self) -> u32 {
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        self.remaining_secs
    }

    /// The display time is over
    pub(crate) fn expire(&mut self) {
        self.remaining_secs = 0;
    }

    /// Flag the snap as acknowledged.
    ///
    /// Returns `true` only for the call that flips the flag, so the caller
    /// holding that result is the one that must issue "mark seen".
    pub(crate) fn mark_acknowledged(&mut self) -> bool {
        !std::mem::replace(&mut self.seen_acknowledged, true)
    }

    /// Copyable view for display
    pub fn view(&self) -> SessionView {
        SessionView {
            snap_id: self.snap_id.clone(),
            duration_secs: self.duration_secs,
            remaining_secs: self.remaining_secs,
            seen_acknowledged: self.seen_acknowledged,
        }
    }
}

/// Point-in-time copy of the active session, without the image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    /// Identifier of the displayed snap
    pub snap_id: String,
    /// Total display duration
    pub duration_secs: u32,
    /// Seconds left
    pub remaining_secs: u32,
    /// Whether "mark seen" has been issued
    pub seen_acknowledged: bool,
}

/// What the viewer is doing, broadcast to subscribers on every change
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewerPhase {
    /// Nothing on screen
    #[default]
    Idle,
    /// Fetching a snap's payload
    Opening {
        /// Snap being fetched
        snap_id: String,
    },
    /// A snap is on screen and counting down
    Active {
        /// Snap on screen
        snap_id: String,
        /// Seconds left
        remaining_secs: u32,
        /// Total display duration
        duration_secs: u32,
    },
    /// Closure started; waiting for "mark seen" to finish
    Closing {
        /// Snap being closed
        snap_id: String,
    },
}
