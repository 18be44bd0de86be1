//! Model module - data types shared across the crate.
//!
//! - `item`: catalog entries and the derived now-playing projection
//! - `playback`: transport snapshots, playback errors, lifecycle events

mod item;
mod playback;

pub use item::{NowPlaying, PlayableItem};
pub use playback::{PlaybackError, PlaybackEvent, PlaybackState};
