use crate::models::Highlight;
use tracing::debug;

/// Picks the highlights to upload from a fresh parse.
///
/// With `only_new` set, a highlight is kept when no entry of `previous`
/// equals it field for field. Duplicates inside `current` are not collapsed.
pub fn select_highlights(
    current: &[Highlight],
    previous: &[Highlight],
    only_new: bool,
) -> Vec<Highlight> {
    if !only_new {
        return current.to_vec();
    }

    let selected: Vec<Highlight> = current
        .iter()
        .filter(|h| !previous.contains(h))
        .cloned()
        .collect();

    debug!(
        current = current.len(),
        previous = previous.len(),
        new = selected.len(),
        "Compared highlights against log"
    );

    selected
}
