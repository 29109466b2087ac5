use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// One bookmark as read from the browser's store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookmarkRecord {
    pub name: String,
    pub url: String,
}

impl BookmarkRecord {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Name shown in the table; untitled bookmarks fall back to their URL.
    pub fn base_name(&self) -> &str {
        if self.name.is_empty() {
            &self.url
        } else {
            &self.name
        }
    }
}

/// Typed bookmark tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkNode {
    Leaf { url: String, title: String },
    Folder { title: String, children: Vec<BookmarkNode> },
}

impl BookmarkNode {
    /// Depth-first, document-order flattening of every leaf below this node.
    pub fn records(&self) -> Vec<BookmarkRecord> {
        let mut out = Vec::new();
        let mut stack = vec![self];

        while let Some(node) = stack.pop() {
            match node {
                BookmarkNode::Leaf { url, title } => {
                    out.push(BookmarkRecord::new(title.clone(), url.clone()));
                }
                BookmarkNode::Folder { children, .. } => {
                    stack.extend(children.iter().rev());
                }
            }
        }

        out
    }
}

/// Joined, disambiguated row handed to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRow {
    pub display_name: String,
    pub url: String,
    /// Comma-joined tags.
    pub tags: String,
}

impl DisplayRow {
    /// The row's tags, trimmed, without empties.
    pub fn tag_list(&self) -> impl Iterator<Item = &str> {
        split_tags(&self.tags)
    }
}

/// Splits a comma-delimited tag string, trimming parts and dropping empties.
pub fn split_tags(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|tag| !tag.is_empty())
}

/// URL -> tags mapping persisted in the sideband tag file.
///
/// Keys are the raw bookmark URLs (not normalized). Tag order within a URL
/// follows insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(BTreeMap<String, Vec<String>>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> &[String] {
        self.0.get(url).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.0.contains_key(url)
    }

    /// Replaces the tags of `url`. An empty list removes the entry.
    pub fn set(&mut self, url: impl Into<String>, tags: Vec<String>) {
        let url = url.into();
        if tags.is_empty() {
            self.0.remove(&url);
        } else {
            self.0.insert(url, tags);
        }
    }

    pub fn remove(&mut self, url: &str) -> Option<Vec<String>> {
        self.0.remove(url)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(url, tags)| (url.as_str(), tags.as_slice()))
    }

    /// Drops entries whose URL is not in `known`. Returns how many were removed.
    pub fn retain_urls(&mut self, known: &HashSet<String>) -> usize {
        let before = self.0.len();
        self.0.retain(|url, _| known.contains(url));
        before - self.0.len()
    }
}

impl<U: Into<String>> FromIterator<(U, Vec<String>)> for TagSet {
    fn from_iter<T: IntoIterator<Item = (U, Vec<String>)>>(iter: T) -> Self {
        let mut set = TagSet::new();
        for (url, tags) in iter {
            set.set(url, tags);
        }
        set
    }
}
