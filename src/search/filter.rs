//! Row visibility for the current filter inputs.

use super::query::FilterState;
use crate::bookmarks::types::DisplayRow;
use crate::status::normalize::{decode_component, encode_component};
use std::collections::BTreeSet;

/// Outcome of one filter pass over the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityResult {
    /// One flag per row, in table order.
    pub visible: Vec<bool>,
    /// Lowercased tags on visible rows that are not committed yet.
    pub available_tags: BTreeSet<String>,
}

impl VisibilityResult {
    pub fn is_visible(&self, row: usize) -> bool {
        self.visible.get(row).copied().unwrap_or(false)
    }

    pub fn visible_count(&self) -> usize {
        self.visible.iter().filter(|v| **v).count()
    }

    /// Rows that failed the filter; callers drop these from their selection.
    pub fn hidden_rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.visible
            .iter()
            .enumerate()
            .filter(|(_, visible)| !**visible)
            .map(|(idx, _)| idx)
    }
}

/// Lowercased forms of the URL filter, precomputed once per pass.
struct UrlNeedle {
    raw: String,
    decoded: String,
    encoded: String,
}

impl UrlNeedle {
    fn new(substring: &str) -> Option<Self> {
        if substring.is_empty() {
            return None;
        }
        let raw = substring.to_lowercase();
        let decoded = decode_component(&raw).to_lowercase();
        let encoded = encode_component(&decoded).to_lowercase();
        Some(Self {
            raw,
            decoded,
            encoded,
        })
    }

    fn matches(&self, url: &str) -> bool {
        let url = url.to_lowercase();
        let url_decoded = decode_component(&url).to_lowercase();

        url.contains(&self.raw)
            || url.contains(&self.decoded)
            || url_decoded.contains(&self.raw)
            || url_decoded.contains(&self.decoded)
            || url.contains(&self.encoded)
    }
}

/// Computes visibility for every row. The stub never filters.
pub fn filter_rows(rows: &[DisplayRow], state: &FilterState) -> VisibilityResult {
    let url_needle = UrlNeedle::new(&state.url_substring);
    let name_needle = state.name_substring.to_lowercase();

    let mut available_tags = BTreeSet::new();
    let visible = rows
        .iter()
        .map(|row| {
            let row_tags: BTreeSet<String> =
                row.tag_list().into_iter().map(|t| t.to_lowercase()).collect();

            let tags_ok = state.committed_tags.iter().all(|t| row_tags.contains(t));
            let url_ok = url_needle.as_ref().map_or(true, |n| n.matches(&row.url));
            let name_ok =
                name_needle.is_empty() || row.display_name.to_lowercase().contains(&name_needle);

            let visible = tags_ok && url_ok && name_ok;
            if visible {
                available_tags.extend(
                    row_tags
                        .into_iter()
                        .filter(|t| !state.committed_tags.contains(t)),
                );
            }
            visible
        })
        .collect();

    VisibilityResult {
        visible,
        available_tags,
    }
}
