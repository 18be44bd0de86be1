//! Single-slot observable holder of the current item

use std::sync::Mutex;

use tokio::sync::broadcast;

use crate::model::PlayableItem;

const CHANNEL_CAPACITY: usize = 256;

/// The authoritative "current item" cell.
///
/// [`SelectionStore::set_current`] is the only mutation path; everything else
/// holds a read subscription. Emissions are an ordered stream, not a sampled
/// value: every distinct call is delivered to every live subscriber, in call
/// order, so effects that chain off a selection change never miss one.
pub struct SelectionStore {
    latest: Mutex<Option<PlayableItem>>,
    notify: broadcast::Sender<Option<PlayableItem>>,
}

impl SelectionStore {
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            latest: Mutex::new(None),
            notify,
        }
    }

    /// Replace the current item. Always succeeds; subscribers are notified
    /// synchronously, in call order.
    pub fn set_current(&self, item: Option<PlayableItem>) {
        // Lock held across the send so the replay seed and the live stream
        // agree on ordering.
        let mut latest = self.latest.lock().unwrap();
        *latest = item.clone();
        // No live subscribers is fine; the value remains the replay seed.
        let _ = self.notify.send(item);
    }

    /// The latest value, synchronously.
    pub fn current(&self) -> Option<PlayableItem> {
        self.latest.lock().unwrap().clone()
    }

    /// The latest value followed by every subsequent change, in emission
    /// order.
    pub fn subscribe(&self) -> SelectionStream {
        let latest = self.latest.lock().unwrap();
        SelectionStream {
            replay: Some(latest.clone()),
            live: self.notify.subscribe(),
        }
    }
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Read side of the selection store.
pub struct SelectionStream {
    replay: Option<Option<PlayableItem>>,
    live: broadcast::Receiver<Option<PlayableItem>>,
}

impl SelectionStream {
    /// Next emission; `None` once the store has been dropped.
    pub async fn recv(&mut self) -> Option<Option<PlayableItem>> {
        if let Some(seed) = self.replay.take() {
            return Some(seed);
        }
        loop {
            match self.live.recv().await {
                Ok(value) => return Some(value),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    // Bounded buffer overflow; resynchronize on the next
                    // value rather than abort the subscription.
                    tracing::warn!(missed, "selection subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
