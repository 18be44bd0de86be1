//! Catalog sources: where playable items come from.
//!
//! The controller consumes catalogs only through [`CatalogProvider`];
//! [`HttpCatalog`] is the JSON-over-HTTP implementation.

use std::future::Future;

use anyhow::{Context, Result};
use futures::future::try_join_all;
use serde::Deserialize;

use crate::model::PlayableItem;

/// A source of playable items: fetch `source_url` once, return its list.
/// Callers decide how to combine sources.
pub trait CatalogProvider {
    fn load_items(
        &self,
        source_url: &str,
    ) -> impl Future<Output = Result<Vec<PlayableItem>>> + Send;
}

/// Fetch every source concurrently and concatenate the results in the order
/// the sources were given. Source order is significant: it defines the
/// queue's next/previous order.
pub async fn load_merged<P: CatalogProvider>(
    provider: &P,
    sources: &[&str],
) -> Result<Vec<PlayableItem>> {
    let lists = try_join_all(sources.iter().map(|source| provider.load_items(source))).await?;
    Ok(lists.into_iter().flatten().collect())
}

/// Envelope some catalog APIs wrap their list in.
#[derive(Deserialize)]
struct ItemsEnvelope {
    items: Vec<PlayableItem>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogBody {
    Bare(Vec<PlayableItem>),
    Enveloped(ItemsEnvelope),
}

/// HTTP catalog source returning JSON item lists, either as a bare array or
/// under an `items` key.
#[derive(Clone)]
pub struct HttpCatalog {
    client: reqwest::Client,
}

impl HttpCatalog {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogProvider for HttpCatalog {
    async fn load_items(&self, source_url: &str) -> Result<Vec<PlayableItem>> {
        tracing::debug!(%source_url, "fetching catalog");
        let response = self
            .client
            .get(source_url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("catalog request failed: {source_url}"))?;
        let body: CatalogBody = response
            .json()
            .await
            .with_context(|| format!("catalog body is not a valid item list: {source_url}"))?;

        let items = match body {
            CatalogBody::Bare(items) => items,
            CatalogBody::Enveloped(envelope) => envelope.items,
        };
        tracing::info!(%source_url, count = items.len(), "catalog loaded");
        Ok(items)
    }
}
