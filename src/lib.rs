//! chartplay - a media-playback controller.
//!
//! Drives a single underlying audio decode/output resource, exposes its
//! transport state as an observable stream, and coordinates that stream with a
//! "current track" selection store so a UI layer can play, pause, seek, and
//! move through a track queue. Organized by responsibility:
//!
//! - `model`: catalog items, transport snapshots, lifecycle events
//! - `engine`: the playback state machine over one audio resource
//! - `selection`: single-slot observable holder of the current item
//! - `queue`: pure next/previous/boundary navigation
//! - `controller`: composition root wiring store, engine and queue
//! - `catalog`: where playable items come from
//! - `logging`: tracing setup for embedding applications

pub mod catalog;
pub mod controller;
pub mod engine;
pub mod logging;
pub mod model;
pub mod queue;
pub mod selection;

pub use catalog::{CatalogProvider, HttpCatalog};
pub use controller::PlayerController;
pub use engine::{EventSink, MediaBackend, MediaEvent, PlaybackEngine, RodioBackend};
pub use model::{NowPlaying, PlayableItem, PlaybackError, PlaybackEvent, PlaybackState};
pub use selection::SelectionStore;
