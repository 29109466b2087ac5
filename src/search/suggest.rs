//! Fuzzy ranking of the selectable tags against the typed stub.

use rapidfuzz::fuzz;
use std::collections::BTreeSet;

/// Minimum similarity (0-100) a tag needs to be suggested.
pub const DEFAULT_SUGGESTION_THRESHOLD: f64 = 30.0;

/// Levenshtein-ratio similarity scaled to 0-100. Case-sensitive.
pub fn similarity(tag: &str, stub: &str) -> f64 {
    fuzz::ratio(tag.chars(), stub.chars()) * 100.0
}

/// Ranks `available` against `stub`, best first.
///
/// An empty stub returns every tag in set order. Otherwise tags scoring below
/// `threshold` are dropped; ties keep set order.
pub fn rank(available: &BTreeSet<String>, stub: &str, threshold: f64) -> Vec<String> {
    if stub.is_empty() {
        return available.iter().cloned().collect();
    }

    let mut scored: Vec<(f64, &String)> = available
        .iter()
        .map(|tag| (similarity(tag, stub), tag))
        .collect();

    // stable: equal scores stay in set order
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    scored
        .into_iter()
        .filter(|(score, _)| *score >= threshold)
        .map(|(_, tag)| tag.clone())
        .collect()
}

/// Highlight state of the suggestion list, wrapping at both ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionCursor {
    items: Vec<String>,
    highlighted: Option<usize>,
}

impl SuggestionCursor {
    pub fn new(items: Vec<String>) -> Self {
        Self {
            items,
            highlighted: None,
        }
    }

    /// Replaces the list and clears the highlight.
    pub fn reset(&mut self, items: Vec<String>) {
        self.items = items;
        self.highlighted = None;
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn highlighted_item(&self) -> Option<&str> {
        self.highlighted
            .and_then(|idx| self.items.get(idx))
            .map(String::as_str)
    }

    pub fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.highlighted = Some(match self.highlighted {
            Some(idx) if idx + 1 < self.items.len() => idx + 1,
            _ => 0,
        });
    }

    pub fn prev(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let last = self.items.len() - 1;
        self.highlighted = Some(match self.highlighted {
            Some(idx) if idx > 0 && idx <= last => idx - 1,
            _ => last,
        });
    }

    /// Item chosen on Enter: the highlighted one, else the first.
    pub fn accept(&self) -> Option<&str> {
        self.highlighted_item()
            .or_else(|| self.items.first().map(String::as_str))
    }
}
