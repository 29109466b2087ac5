//! Reader for Safari's `Bookmarks.plist`.
//!
//! Leaves carry a `URLString` and their title either in
//! `URIDictionary.title` (current layout) or in `Title` (older layout).
//! Folders carry `Children`. Any failure to read or decode yields an empty
//! list at the public boundary.

use super::types::{BookmarkNode, BookmarkRecord};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

const LEAF_TYPE: &str = "WebBookmarkTypeLeaf";

#[derive(Error, Debug)]
pub enum BookmarkReadError {
    #[error("Failed to read bookmark file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode bookmark file: {0}")]
    Plist(#[from] plist::Error),
}

#[derive(Debug, Default, Deserialize)]
struct RawNode {
    #[serde(rename = "WebBookmarkType")]
    kind: Option<String>,
    #[serde(rename = "URLString")]
    url: Option<String>,
    #[serde(rename = "URIDictionary")]
    uri_dictionary: Option<RawUriDictionary>,
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "Children")]
    children: Option<Vec<RawNode>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawUriDictionary {
    title: Option<String>,
}

impl RawNode {
    fn is_leaf(&self) -> bool {
        self.url.is_some() && self.kind.as_deref().map_or(true, |kind| kind == LEAF_TYPE)
    }

    fn leaf_title(&self) -> String {
        self.uri_dictionary
            .as_ref()
            .and_then(|dict| dict.title.clone())
            .filter(|title| !title.is_empty())
            .or_else(|| self.title.clone())
            .unwrap_or_default()
    }

    /// Converts a child entry. An entry that is both a leaf and has children
    /// yields the leaf followed by the folder.
    fn into_nodes(self, out: &mut Vec<BookmarkNode>) {
        if self.is_leaf() {
            out.push(BookmarkNode::Leaf {
                title: self.leaf_title(),
                url: self.url.clone().unwrap_or_default(),
            });
        }

        if let Some(children) = self.children {
            out.push(BookmarkNode::Folder {
                title: self.title.unwrap_or_default(),
                children: convert_children(children),
            });
        }
    }
}

fn convert_children(children: Vec<RawNode>) -> Vec<BookmarkNode> {
    let mut nodes = Vec::with_capacity(children.len());
    for child in children {
        child.into_nodes(&mut nodes);
    }
    nodes
}

/// Decodes a plist document (XML or binary) into the typed tree.
/// Only the root's `Children` are walked; the root itself is never a leaf.
pub fn parse_tree(bytes: &[u8]) -> Result<BookmarkNode, BookmarkReadError> {
    let root: RawNode = plist::from_bytes(bytes)?;
    Ok(BookmarkNode::Folder {
        title: root.title.unwrap_or_default(),
        children: convert_children(root.children.unwrap_or_default()),
    })
}

pub fn read_tree(path: &Path) -> Result<BookmarkNode, BookmarkReadError> {
    let bytes = std::fs::read(path)?;
    parse_tree(&bytes)
}

/// Outcome of reading the bookmark file.
///
/// Callers that derive destructive decisions from the bookmark set (tag
/// pruning, change detection) act only on `Loaded`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkRead {
    Loaded(Vec<BookmarkRecord>),
    /// The file does not exist (Safari never opened).
    Missing,
    /// The file exists but could not be read or decoded, e.g. mid-write.
    Unreadable,
}

impl BookmarkRead {
    pub fn is_loaded(&self) -> bool {
        matches!(self, BookmarkRead::Loaded(_))
    }

    /// The records, or an empty list when the read failed.
    pub fn into_records(self) -> Vec<BookmarkRecord> {
        match self {
            BookmarkRead::Loaded(records) => records,
            BookmarkRead::Missing | BookmarkRead::Unreadable => Vec::new(),
        }
    }
}

/// Reads every bookmark in depth-first document order, reporting whether
/// the file was missing or unreadable.
pub fn load_bookmarks(path: &Path) -> BookmarkRead {
    if !path.exists() {
        tracing::debug!(
            target: "bookmarks::reader",
            path = %path.display(),
            "Bookmark file not found"
        );
        return BookmarkRead::Missing;
    }

    match read_tree(path) {
        Ok(tree) => {
            let records = tree.records();
            tracing::debug!(
                target: "bookmarks::reader",
                path = %path.display(),
                count = records.len(),
                "Bookmarks loaded"
            );
            BookmarkRead::Loaded(records)
        }
        Err(e) => {
            tracing::warn!(
                target: "bookmarks::reader",
                path = %path.display(),
                error = %e,
                "Bookmark file unreadable"
            );
            BookmarkRead::Unreadable
        }
    }
}

/// Like [`load_bookmarks`], but a missing or unreadable file is an empty list.
pub fn read_bookmarks(path: &Path) -> Vec<BookmarkRecord> {
    load_bookmarks(path).into_records()
}
