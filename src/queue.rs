//! Pure next/previous/boundary logic over an ordered item list.
//!
//! Deliberately free of engine or I/O references so navigation unit-tests
//! without an audio resource or network access.

use crate::model::PlayableItem;

/// First position in `queue` whose id matches `item`; `None` when nothing is
/// current or the id is absent.
///
/// Lookup is first-match: if two concatenated sources carry the same id, the
/// earlier occurrence wins and navigation resolves against it. Callers that
/// need stronger identity must disambiguate ids upstream.
pub fn index_of(queue: &[PlayableItem], item: Option<&PlayableItem>) -> Option<usize> {
    let item = item?;
    queue.iter().position(|candidate| candidate.id == item.id)
}

/// The item after `current`; `None` past the end of the queue (no
/// wraparound) or when `current` does not resolve to a position.
pub fn next<'a>(
    queue: &'a [PlayableItem],
    current: Option<&PlayableItem>,
) -> Option<&'a PlayableItem> {
    let index = index_of(queue, current)?;
    queue.get(index + 1)
}

/// The item before `current`; `None` at the front of the queue or when
/// `current` does not resolve to a position.
pub fn previous<'a>(
    queue: &'a [PlayableItem],
    current: Option<&PlayableItem>,
) -> Option<&'a PlayableItem> {
    let index = index_of(queue, current)?;
    index.checked_sub(1).and_then(|prev| queue.get(prev))
}

/// Whether `current` sits at the first queue position.
pub fn is_first(queue: &[PlayableItem], current: Option<&PlayableItem>) -> bool {
    index_of(queue, current) == Some(0)
}

/// Whether `current` sits at the last queue position.
pub fn is_last(queue: &[PlayableItem], current: Option<&PlayableItem>) -> bool {
    !queue.is_empty() && index_of(queue, current) == Some(queue.len() - 1)
}
