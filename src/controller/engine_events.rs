//! Engine event listener: advance-on-completion

use tokio::sync::broadcast::error::RecvError;

use crate::model::PlaybackEvent;
use crate::queue;

use super::PlayerController;

impl PlayerController {
    pub(crate) fn spawn_engine_listener(&self) {
        let controller = self.clone();
        let mut events = self.engine.events();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(PlaybackEvent::Ended) => controller.on_track_ended().await,
                    Ok(PlaybackEvent::Failed) => {
                        // Already surfaced through the state snapshot; no
                        // retry, the next user action decides.
                        tracing::debug!("playback failed, waiting for user action");
                    }
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "engine event listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            tracing::debug!("engine event listener shutting down");
        });
    }

    async fn on_track_ended(&self) {
        let queue = self.queue.read().await;
        let current = self.selection.current();
        match queue::next(&queue, current.as_ref()) {
            Some(item) => {
                tracing::info!(id = %item.id, title = %item.title, "track ended, advancing");
                let item = item.clone();
                drop(queue);
                self.selection.set_current(Some(item));
            }
            None => {
                // Queue exhausted: back to idle, no wraparound.
                tracing::info!("track ended at the end of the queue, stopping");
                drop(queue);
                self.engine.stop();
            }
        }
    }
}
