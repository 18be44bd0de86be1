//! Playback-related types: transport snapshots and lifecycle events

use serde::Serialize;
use thiserror::Error;

/// Why playback is not running.
///
/// Cloneable so it can live inside [`PlaybackState`] snapshots; playback
/// failures are expected (missing previews, dead locators) and travel as
/// state, never as panics or `Err` across the engine boundary.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize)]
pub enum PlaybackError {
    /// The selected item carries no usable stream locator.
    #[error("item is not playable: {reason}")]
    Unplayable { reason: String },

    /// The stream resource failed to resolve or decode.
    #[error("stream failed to load: {reason}")]
    ResourceLoad { reason: String },
}

/// Point-in-time transport snapshot.
///
/// Every media event folds into exactly one new snapshot merged onto the
/// previous one; fields untouched by the event keep their prior value.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PlaybackState {
    pub playing: bool,
    pub loading: bool,
    pub position_secs: f64,
    /// 0.0 while the duration is unknown.
    pub duration_secs: f64,
    pub error: Option<PlaybackError>,
    pub can_play: bool,
}

/// One-shot lifecycle notifications.
///
/// The sampled state stream replays only the latest snapshot, so transitions
/// that chained effects must never miss (end of track, terminal failure) are
/// broadcast separately.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// The loaded source played to its end.
    Ended,
    /// The loaded source failed; details are in the state snapshot.
    Failed,
}
