//! Controller module - composition and policy.
//!
//! The only component allowed to drive both the engine and the selection
//! store. It is organized into submodules by responsibility:
//!
//! - `transport`: user-facing transport commands
//! - `selection_events`: reaction to every current-item change
//! - `engine_events`: end-of-track auto-advance

mod engine_events;
mod selection_events;
mod transport;

use std::sync::{Arc, Mutex};

use tokio::sync::{RwLock, watch};

use crate::catalog::{self, CatalogProvider};
use crate::engine::PlaybackEngine;
use crate::model::{NowPlaying, PlayableItem, PlaybackState};
use crate::selection::SelectionStore;

/// Composition root: wires the selection store to the engine and exposes the
/// transport surface to a UI layer.
#[derive(Clone)]
pub struct PlayerController {
    pub(crate) engine: PlaybackEngine,
    pub(crate) selection: Arc<SelectionStore>,
    pub(crate) queue: Arc<RwLock<Vec<PlayableItem>>>,
    pub(crate) now_playing: Arc<watch::Sender<NowPlaying>>,
    pub(crate) volume: Arc<Mutex<f32>>,
}

impl PlayerController {
    /// Build the controller around `engine` and start its listener tasks.
    pub fn new(engine: PlaybackEngine) -> Self {
        let (now_playing, _) = watch::channel(NowPlaying::default());
        let controller = Self {
            engine,
            selection: Arc::new(SelectionStore::new()),
            queue: Arc::new(RwLock::new(Vec::new())),
            now_playing: Arc::new(now_playing),
            volume: Arc::new(Mutex::new(1.0)),
        };
        controller.spawn_selection_listener();
        controller.spawn_engine_listener();
        controller
    }

    /// The selection store. `set_current` there is the only way an item
    /// starts playing.
    pub fn selection(&self) -> Arc<SelectionStore> {
        self.selection.clone()
    }

    /// Transport state stream; replays the latest snapshot to new
    /// subscribers.
    pub fn state(&self) -> watch::Receiver<PlaybackState> {
        self.engine.state()
    }

    /// Derived display fields for the current selection.
    pub fn now_playing(&self) -> watch::Receiver<NowPlaying> {
        self.now_playing.subscribe()
    }

    /// Replace the queue wholesale. Navigation is recomputed from scratch
    /// against the new list; the current selection is untouched.
    pub async fn set_queue(&self, items: Vec<PlayableItem>) {
        tracing::info!(count = items.len(), "queue replaced");
        *self.queue.write().await = items;
    }

    pub async fn queue(&self) -> Vec<PlayableItem> {
        self.queue.read().await.clone()
    }

    /// Fetch every source and replace the queue with their concatenation, in
    /// the given source order (source order defines next/previous order).
    pub async fn load_catalog<P: CatalogProvider>(
        &self,
        provider: &P,
        sources: &[&str],
    ) -> anyhow::Result<()> {
        let items = catalog::load_merged(provider, sources).await?;
        self.set_queue(items).await;
        Ok(())
    }

    /// Dispose of the engine and close its state stream. Listener tasks wind
    /// down with the channels they watch.
    pub fn shutdown(&self) {
        self.engine.shutdown();
    }
}
