//! Reaction to selection changes: the load-and-autoplay policy

use crate::model::{NowPlaying, PlayableItem};

use super::PlayerController;

impl PlayerController {
    pub(crate) fn spawn_selection_listener(&self) {
        let controller = self.clone();
        let mut selections = self.selection.subscribe();
        tokio::spawn(async move {
            // Every emission carries a potential side effect (load plus
            // autoplay); none may be skipped or reordered.
            while let Some(change) = selections.recv().await {
                controller.on_selection_change(change);
            }
            tracing::debug!("selection listener shutting down");
        });
    }

    fn on_selection_change(&self, item: Option<PlayableItem>) {
        let Some(item) = item else {
            self.now_playing.send_replace(NowPlaying::default());
            self.engine.stop();
            return;
        };

        tracing::debug!(id = %item.id, title = %item.title, "current item changed");
        self.now_playing.send_replace(NowPlaying::from_item(&item));

        let Some(url) = item.stream_url.as_deref() else {
            // Expected for catalog entries without a preview; playback
            // simply does not start.
            tracing::warn!(
                id = %item.id,
                title = %item.title,
                "item has no stream locator, skipping load"
            );
            self.engine.stop();
            return;
        };

        self.engine.load(Some(url));
        // No-op when already playing, queued until ready while the source is
        // still loading: selecting an item begins playback.
        self.engine.play();
    }
}
