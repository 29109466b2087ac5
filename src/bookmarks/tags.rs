use super::types::TagSet;
use crate::shared::errors::StorageError;
use crate::shared::paths::ensure_parent;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Sole writer of the sideband tag file.
///
/// The file is a JSON object mapping bookmark URL to a list of tags. Writes
/// replace the whole document.
#[derive(Debug, Clone)]
pub struct TagStore {
    path: PathBuf,
}

impl TagStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the tag map.
    ///
    /// With `known_urls`, entries for URLs no longer bookmarked are dropped and
    /// the pruned map is written back. Without it the raw map is returned
    /// untouched. A missing file is an empty map.
    pub fn load(&self, known_urls: Option<&HashSet<String>>) -> Result<TagSet, StorageError> {
        if !self.path.exists() {
            return Ok(TagSet::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let mut tag_set = parse_tag_document(&content)?;

        if let Some(known) = known_urls {
            let pruned = tag_set.retain_urls(known);
            if pruned > 0 {
                tracing::info!(
                    target: "bookmarks::tags",
                    pruned = pruned,
                    "Pruned tags of deleted bookmarks"
                );
            }
            self.save(&tag_set)?;
        }

        Ok(tag_set)
    }

    /// Serializes the map as pretty-printed UTF-8 JSON, overwriting the file.
    pub fn save(&self, tag_set: &TagSet) -> Result<(), StorageError> {
        ensure_parent(&self.path).map_err(|e| StorageError::directory(e.to_string()))?;

        let content = serde_json::to_string_pretty(tag_set)?;
        std::fs::write(&self.path, content)?;
        tracing::debug!(
            target: "bookmarks::tags",
            path = %self.path.display(),
            urls = tag_set.len(),
            "Tags saved"
        );
        Ok(())
    }

    /// Renames an unreadable tag file to `<name>.corrupt` so a later save
    /// cannot destroy it. Returns the new location.
    pub fn move_aside(&self) -> Result<PathBuf, StorageError> {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".corrupt");
        let target = self.path.with_file_name(name);

        std::fs::rename(&self.path, &target)?;
        tracing::warn!(
            target: "bookmarks::tags",
            from = %self.path.display(),
            to = %target.display(),
            "Moved corrupt tag file aside"
        );
        Ok(target)
    }
}

/// Parses the tag document, normalizing every value into a clean tag list.
pub fn parse_tag_document(content: &str) -> Result<TagSet, StorageError> {
    let value: Value = serde_json::from_str(content)?;
    let Value::Object(entries) = value else {
        return Err(StorageError::shape("tag file root is not an object"));
    };

    Ok(entries
        .into_iter()
        .map(|(url, tags)| {
            let tags = normalize_tags(&tags, &url);
            (url, tags)
        })
        .collect())
}

/// Accepts a list of tags or a single comma-delimited string. Tags are
/// trimmed, empties dropped and exact duplicates collapsed.
pub fn normalize_tags(tags: &Value, url: &str) -> Vec<String> {
    let raw: Vec<&str> = match tags {
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        Value::String(joined) => joined.split(',').collect(),
        other => {
            tracing::warn!(
                target: "bookmarks::tags",
                url = %url,
                kind = %json_kind(other),
                "Unexpected tag type, defaulting to empty list"
            );
            return Vec::new();
        }
    };

    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for tag in raw {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|existing| existing == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Splits user input like `"rust, tools,"` into tags.
pub fn parse_tag_input(raw: &str) -> Vec<String> {
    normalize_tags(&Value::String(raw.to_string()), "")
}

/// Appends each of `new_tags` to every URL in `urls`, skipping tags already
/// present in any casing. Returns how many URLs changed.
pub fn add_tags<'a, I>(tag_set: &mut TagSet, urls: I, new_tags: &[String]) -> usize
where
    I: IntoIterator<Item = &'a str>,
{
    let mut changed = 0;

    for url in urls {
        let mut existing = tag_set.get(url).to_vec();
        let mut existing_lower: Vec<String> = existing.iter().map(|t| t.to_lowercase()).collect();
        let before = existing.len();

        for tag in new_tags {
            let tag = tag.trim();
            if tag.is_empty() {
                continue;
            }
            let lower = tag.to_lowercase();
            if !existing_lower.contains(&lower) {
                existing.push(tag.to_string());
                existing_lower.push(lower);
            }
        }

        if existing.len() != before {
            tag_set.set(url, existing);
            changed += 1;
        }
    }

    changed
}

/// Removes `tags` (case-insensitive) from every URL in `urls`. URLs left
/// without tags are removed from the map. Returns how many URLs changed.
pub fn delete_tags<'a, I>(tag_set: &mut TagSet, urls: I, tags: &[String]) -> usize
where
    I: IntoIterator<Item = &'a str>,
{
    let doomed: HashSet<String> = tags.iter().map(|t| t.trim().to_lowercase()).collect();
    if doomed.is_empty() {
        return 0;
    }

    let mut changed = 0;

    for url in urls {
        let existing = tag_set.get(url);
        if existing.is_empty() {
            continue;
        }

        let remaining: Vec<String> = existing
            .iter()
            .filter(|tag| !doomed.contains(&tag.to_lowercase()))
            .cloned()
            .collect();

        if remaining.len() != existing.len() {
            tag_set.set(url, remaining);
            changed += 1;
        }
    }

    changed
}
