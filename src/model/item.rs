//! Catalog item types and the derived now-playing projection

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single playable entry from a catalog source.
///
/// Items are immutable once the controller observes them; identity is the
/// `id` field, never the allocation. An id is unique within one catalog
/// source but not guaranteed unique across merged sources (see
/// [`crate::queue::index_of`]).
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PlayableItem {
    #[serde(alias = "title_id")]
    pub id: String,
    pub title: String,
    /// Display attribution (artist, label, chart credit).
    #[serde(default)]
    pub credit: String,
    #[serde(default, alias = "cover_img_url_small")]
    pub artwork_url: Option<String>,
    /// Opaque stream locator, passed through unmodified. `None` means the
    /// item cannot be played.
    #[serde(default, alias = "itunes_track_preview_url")]
    pub stream_url: Option<String>,
    /// Catalog metadata this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PlayableItem {
    /// Minimal item with just identity and title; catalog metadata stays
    /// empty.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            credit: String::new(),
            artwork_url: None,
            stream_url: None,
            extra: Map::new(),
        }
    }

    pub fn with_credit(mut self, credit: impl Into<String>) -> Self {
        self.credit = credit.into();
        self
    }

    pub fn with_artwork_url(mut self, url: impl Into<String>) -> Self {
        self.artwork_url = Some(url.into());
        self
    }

    pub fn with_stream_url(mut self, url: impl Into<String>) -> Self {
        self.stream_url = Some(url.into());
        self
    }
}

/// Display fields derived from the current selection.
///
/// A pure projection; the authoritative value lives in the selection store.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NowPlaying {
    pub item: Option<PlayableItem>,
    pub title: Option<String>,
    pub credit: Option<String>,
    pub artwork_url: Option<String>,
}

impl NowPlaying {
    pub fn from_item(item: &PlayableItem) -> Self {
        Self {
            title: Some(item.title.clone()),
            credit: Some(item.credit.clone()),
            artwork_url: item.artwork_url.clone(),
            item: Some(item.clone()),
        }
    }
}
