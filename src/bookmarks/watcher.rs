//! Detects bookmarks added to the browser's store while the app runs.

use super::reader::{load_bookmarks, read_bookmarks, BookmarkRead};
use super::types::BookmarkRecord;
use crate::core::watch::{FileWatcher, WatchConfig, WatchError};
use crossbeam_channel::Sender;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Payload sent when a new bookmark shows up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkAdded {
    pub url: String,
    pub title: String,
}

impl From<BookmarkRecord> for BookmarkAdded {
    fn from(record: BookmarkRecord) -> Self {
        Self {
            url: record.url,
            title: record.name,
        }
    }
}

/// Records whose URL is absent from `old`, in `new`'s document order.
/// Each new URL is reported once, by its first record.
pub fn added_records(old: &[BookmarkRecord], new: &[BookmarkRecord]) -> Vec<BookmarkRecord> {
    let old_urls: HashSet<&str> = old.iter().map(|r| r.url.as_str()).collect();
    let mut seen: HashSet<&str> = HashSet::new();

    new.iter()
        .filter(|r| !old_urls.contains(r.url.as_str()) && seen.insert(r.url.as_str()))
        .cloned()
        .collect()
}

/// Holds the last snapshot of the store and diffs each re-read against it.
#[derive(Debug)]
pub struct ChangeWatcher {
    path: PathBuf,
    snapshot: Vec<BookmarkRecord>,
}

impl ChangeWatcher {
    /// Takes the initial snapshot.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let snapshot = read_bookmarks(&path);
        Self { path, snapshot }
    }

    pub fn with_snapshot(path: impl Into<PathBuf>, snapshot: Vec<BookmarkRecord>) -> Self {
        Self {
            path: path.into(),
            snapshot,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> &[BookmarkRecord] {
        &self.snapshot
    }

    /// Re-reads the store, replaces the snapshot and returns the first added
    /// bookmark in document order, if any.
    ///
    /// A missing or unreadable file (e.g. caught mid-write) leaves the
    /// snapshot untouched, so the next good read is diffed against real data.
    pub fn on_changed(&mut self) -> Option<BookmarkAdded> {
        let BookmarkRead::Loaded(new_data) = load_bookmarks(&self.path) else {
            tracing::debug!(
                target: "bookmarks::watcher",
                path = %self.path.display(),
                "Bookmark file not readable, keeping snapshot"
            );
            return None;
        };
        let added = added_records(&self.snapshot, &new_data);
        self.snapshot = new_data;

        if added.len() > 1 {
            tracing::debug!(
                target: "bookmarks::watcher",
                count = added.len(),
                "Several bookmarks added at once, reporting the first"
            );
        }

        added.into_iter().next().map(BookmarkAdded::from)
    }
}

/// Live watcher: file events -> diff -> `BookmarkAdded` on a channel.
pub struct BookmarkWatcher {
    watcher: FileWatcher,
}

impl BookmarkWatcher {
    pub fn start(path: &Path, tx: Sender<BookmarkAdded>) -> Result<Self, WatchError> {
        let mut changes = ChangeWatcher::new(path);
        let config = WatchConfig::new("bookmarks", path.to_path_buf());

        let watcher = FileWatcher::start(config, move |_| {
            if let Some(added) = changes.on_changed() {
                tracing::info!(
                    target: "bookmarks::watcher",
                    url = %added.url,
                    "New bookmark detected"
                );
                if tx.send(added).is_err() {
                    tracing::debug!(
                        target: "bookmarks::watcher",
                        "Receiver gone, dropping bookmark event"
                    );
                }
            }
        })?;

        Ok(Self { watcher })
    }

    pub fn stop(&mut self) {
        self.watcher.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plist::{Dictionary, Value};
    use std::time::Duration;

    fn rec(name: &str, url: &str) -> BookmarkRecord {
        BookmarkRecord::new(name, url)
    }

    #[test]
    fn test_no_change_reports_nothing() {
        let old = vec![rec("A", "https://a.com")];
        assert!(added_records(&old, &old.clone()).is_empty());
    }

    #[test]
    fn test_addition_is_detected_by_url() {
        let old = vec![rec("A", "https://a.com")];
        let new = vec![rec("A renamed", "https://a.com"), rec("B", "https://b.com")];

        assert_eq!(added_records(&old, &new), vec![rec("B", "https://b.com")]);
    }

    #[test]
    fn test_multiple_additions_keep_document_order() {
        let old = vec![rec("A", "https://a.com")];
        let new = vec![
            rec("C", "https://c.com"),
            rec("A", "https://a.com"),
            rec("B", "https://b.com"),
            rec("C again", "https://c.com"),
        ];

        let added = added_records(&old, &new);
        assert_eq!(added, vec![rec("C", "https://c.com"), rec("B", "https://b.com")]);
    }

    #[test]
    fn test_removal_is_not_an_addition() {
        let old = vec![rec("A", "https://a.com"), rec("B", "https://b.com")];
        let new = vec![rec("A", "https://a.com")];
        assert!(added_records(&old, &new).is_empty());
    }

    fn write_bookmarks(path: &Path, records: &[BookmarkRecord]) {
        let children = records
            .iter()
            .map(|r| {
                let mut dict = Dictionary::new();
                dict.insert("URLString".into(), Value::String(r.url.clone()));
                dict.insert("Title".into(), Value::String(r.name.clone()));
                Value::Dictionary(dict)
            })
            .collect();
        let mut root = Dictionary::new();
        root.insert("Children".into(), Value::Array(children));

        // write then rename, as Safari does, so readers never see a partial file
        let tmp = path.with_extension("tmp");
        Value::Dictionary(root).to_file_binary(&tmp).unwrap();
        std::fs::rename(&tmp, path).unwrap();
    }

    #[test]
    fn test_on_changed_with_missing_file_keeps_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher =
            ChangeWatcher::with_snapshot(dir.path().join("Bookmarks.plist"), vec![rec("A", "https://a.com")]);

        assert_eq!(watcher.on_changed(), None);
        assert_eq!(watcher.snapshot(), &[rec("A", "https://a.com")]);
    }

    #[test]
    fn test_unreadable_file_does_not_fake_additions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Bookmarks.plist");
        let records = vec![rec("A", "https://a.com"), rec("B", "https://b.com")];
        write_bookmarks(&path, &records);
        let mut watcher = ChangeWatcher::new(&path);

        std::fs::write(&path, b"half written").unwrap();
        assert_eq!(watcher.on_changed(), None);
        assert_eq!(watcher.snapshot(), records.as_slice());

        write_bookmarks(&path, &records);
        assert_eq!(watcher.on_changed(), None);
    }

    #[test]
    fn test_live_watcher_sends_added_bookmark() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Bookmarks.plist");
        write_bookmarks(&path, &[rec("A", "https://a.com")]);

        let (tx, rx) = crossbeam_channel::unbounded();
        let mut watcher = BookmarkWatcher::start(&path, tx).unwrap();
        // let the backend register the watch before touching the file
        std::thread::sleep(Duration::from_millis(100));

        write_bookmarks(&path, &[rec("A", "https://a.com"), rec("B", "https://b.com")]);

        let added = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(
            added,
            BookmarkAdded {
                url: "https://b.com".to_string(),
                title: "B".to_string(),
            }
        );
        watcher.stop();
    }
}
