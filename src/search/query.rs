//! Parsing of the comma-delimited search input.

use serde::Serialize;
use std::collections::BTreeSet;

/// Everything the filter engine needs from the three search inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    /// Finished tags, lowercased.
    pub committed_tags: BTreeSet<String>,
    /// Trailing segment still being typed. Only feeds suggestions.
    pub stub: String,
    pub url_substring: String,
    pub name_substring: String,
}

impl FilterState {
    pub fn new(search_text: &str, url_substring: &str, name_substring: &str) -> Self {
        let (committed_tags, stub) = parse_search_text(search_text);
        Self {
            committed_tags,
            stub,
            url_substring: url_substring.trim().to_string(),
            name_substring: name_substring.trim().to_string(),
        }
    }

    /// No tag, URL or name constraint: every row is visible.
    pub fn is_unfiltered(&self) -> bool {
        self.committed_tags.is_empty()
            && self.url_substring.is_empty()
            && self.name_substring.is_empty()
    }
}

/// Splits the search text into committed tags and the in-progress stub.
///
/// `"a, b,"` commits both parts; `"a, b"` commits `a` and leaves `b` as the stub.
pub fn parse_search_text(text: &str) -> (BTreeSet<String>, String) {
    let mut parts: Vec<&str> = text
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    let stub = if text.trim_end().ends_with(',') {
        String::new()
    } else {
        parts.pop().map(str::to_string).unwrap_or_default()
    };

    let committed = parts.into_iter().map(str::to_lowercase).collect();
    (committed, stub)
}

/// Replaces the trailing stub with `tag,`, keeping every earlier segment.
pub fn apply_suggestion(text: &str, tag: &str) -> String {
    let prefix = match text.rfind(',') {
        Some(idx) => {
            let before = text[..idx].trim();
            if before.is_empty() {
                String::new()
            } else {
                format!("{},", before)
            }
        }
        None => String::new(),
    };
    format!("{}{},", prefix, tag)
}

/// Drops the last segment together with its optional trailing comma.
///
/// `"a,b,c,"` -> `"a,b,"` and `"a,b,c"` -> `"a,b,"`.
pub fn drop_last_segment(text: &str) -> String {
    let without_comma = text.strip_suffix(',').unwrap_or(text);
    match without_comma.rfind(',') {
        Some(idx) => without_comma[..=idx].to_string(),
        None => {
            // a lone "," has no segment to drop
            if without_comma.is_empty() {
                text.to_string()
            } else {
                String::new()
            }
        }
    }
}
