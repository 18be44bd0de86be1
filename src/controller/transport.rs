//! User-facing transport commands

use crate::queue;

use super::PlayerController;

/// Step applied by `volume_up`/`volume_down`.
const VOLUME_STEP: f32 = 0.05;

impl PlayerController {
    pub fn play(&self) {
        self.engine.play();
    }

    pub fn pause(&self) {
        self.engine.pause();
    }

    pub fn stop(&self) {
        self.engine.stop();
    }

    /// Seek within the current source, in seconds. Clamped by the engine and
    /// ignored while the duration is unknown.
    pub fn seek(&self, seconds: f64) {
        self.engine.seek_to(seconds);
    }

    pub fn toggle_playback(&self) {
        let playing = self.engine.current_state().playing;
        tracing::debug!(playing, "toggling playback");
        if playing {
            self.engine.pause();
        } else {
            self.engine.play();
        }
    }

    /// Output level in `[0.0, 1.0]`.
    pub fn set_volume(&self, level: f32) {
        let level = level.clamp(0.0, 1.0);
        *self.volume.lock().unwrap() = level;
        self.engine.set_volume(level);
    }

    pub fn volume(&self) -> f32 {
        *self.volume.lock().unwrap()
    }

    pub fn volume_up(&self) {
        self.set_volume(self.volume() + VOLUME_STEP);
    }

    pub fn volume_down(&self) {
        self.set_volume(self.volume() - VOLUME_STEP);
    }

    /// Select the item after the current one. Explicit no-op when nothing is
    /// current or the end of the queue has been reached.
    pub async fn next(&self) {
        let queue = self.queue.read().await;
        let current = self.selection.current();
        match queue::next(&queue, current.as_ref()) {
            Some(item) => {
                let item = item.clone();
                drop(queue);
                // Selecting the item drives load plus autoplay in the
                // selection listener, which also resumes a paused transport.
                self.selection.set_current(Some(item));
            }
            None => tracing::debug!("next: nothing to advance to"),
        }
    }

    /// Select the item before the current one. Explicit no-op when nothing
    /// is current or the front of the queue has been reached.
    pub async fn previous(&self) {
        let queue = self.queue.read().await;
        let current = self.selection.current();
        match queue::previous(&queue, current.as_ref()) {
            Some(item) => {
                let item = item.clone();
                drop(queue);
                self.selection.set_current(Some(item));
            }
            None => tracing::debug!("previous: nothing to step back to"),
        }
    }

    /// Whether the current item is at the first queue position, for UI
    /// enablement.
    pub async fn is_first(&self) -> bool {
        let queue = self.queue.read().await;
        queue::is_first(&queue, self.selection.current().as_ref())
    }

    /// Whether the current item is at the last queue position, for UI
    /// enablement.
    pub async fn is_last(&self) -> bool {
        let queue = self.queue.read().await;
        queue::is_last(&queue, self.selection.current().as_ref())
    }
}
