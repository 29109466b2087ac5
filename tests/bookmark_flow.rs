//! End-to-end tests over real files: plist bookmarks, JSON tags, session.

use plist::{Dictionary, Value};
use std::collections::HashSet;
use std::path::Path;
use tagmark_lib::bookmarks::reader::read_bookmarks;
use tagmark_lib::bookmarks::table::build_rows;
use tagmark_lib::bookmarks::tags::TagStore;
use tagmark_lib::bookmarks::watcher::ChangeWatcher;
use tagmark_lib::bookmarks::{BookmarkRecord, TagSet};
use tagmark_lib::core::settings::AppSettings;
use tagmark_lib::{ActionOutcome, Session};

fn leaf(title: &str, url: &str) -> Value {
    let mut uri = Dictionary::new();
    uri.insert("title".into(), Value::String(title.into()));
    let mut dict = Dictionary::new();
    dict.insert("WebBookmarkType".into(), Value::String("WebBookmarkTypeLeaf".into()));
    dict.insert("URLString".into(), Value::String(url.into()));
    dict.insert("URIDictionary".into(), Value::Dictionary(uri));
    Value::Dictionary(dict)
}

fn folder(title: &str, children: Vec<Value>) -> Value {
    let mut dict = Dictionary::new();
    dict.insert("WebBookmarkType".into(), Value::String("WebBookmarkTypeList".into()));
    dict.insert("Title".into(), Value::String(title.into()));
    dict.insert("Children".into(), Value::Array(children));
    Value::Dictionary(dict)
}

fn write_root(path: &Path, children: Vec<Value>) {
    let mut root = Dictionary::new();
    root.insert("Children".into(), Value::Array(children));
    Value::Dictionary(root).to_file_binary(path).unwrap();
}

#[test]
fn test_duplicate_names_are_disambiguated_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Bookmarks.plist");
    write_root(
        &path,
        vec![
            leaf("Example", "https://example.com"),
            folder("Work", vec![leaf("Example", "https://example.org")]),
        ],
    );

    let records = read_bookmarks(&path);
    let rows = build_rows(&records, &TagSet::new());

    let names: Vec<(&str, &str)> = rows
        .iter()
        .map(|r| (r.display_name.as_str(), r.url.as_str()))
        .collect();
    assert_eq!(
        names,
        vec![
            ("Example", "https://example.com"),
            ("Example (2)", "https://example.org"),
        ]
    );
}

#[test]
fn test_missing_and_garbage_bookmark_files_are_empty() {
    let dir = tempfile::tempdir().unwrap();
    assert!(read_bookmarks(&dir.path().join("nope.plist")).is_empty());

    let garbage = dir.path().join("garbage.plist");
    std::fs::write(&garbage, [0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]).unwrap();
    assert!(read_bookmarks(&garbage).is_empty());
}

#[test]
fn test_pruning_rewrites_tag_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tags.json");
    std::fs::write(
        &path,
        r#"{"https://example.com": ["tag1"], "https://old-site.com": ["unused"]}"#,
    )
    .unwrap();

    let store = TagStore::new(&path);
    let known: HashSet<String> = ["https://example.com".to_string()].into_iter().collect();
    let tags = store.load(Some(&known)).unwrap();

    let expected: TagSet = [("https://example.com", vec!["tag1".to_string()])]
        .into_iter()
        .collect();
    assert_eq!(tags, expected);
    assert_eq!(store.load(None).unwrap(), expected);
}

#[test]
fn test_unpruned_load_leaves_file_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tags.json");
    let original = r#"{"https://old-site.com": "a, b"}"#;
    std::fs::write(&path, original).unwrap();

    let tags = TagStore::new(&path).load(None).unwrap();
    assert_eq!(tags.get("https://old-site.com"), &["a", "b"]);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn test_change_watcher_reports_first_addition() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Bookmarks.plist");
    write_root(&path, vec![leaf("A", "https://a.com")]);

    let mut watcher = ChangeWatcher::new(&path);
    assert_eq!(watcher.snapshot(), &[BookmarkRecord::new("A", "https://a.com")]);
    assert_eq!(watcher.on_changed(), None);

    write_root(
        &path,
        vec![
            leaf("A", "https://a.com"),
            folder("New", vec![leaf("B", "https://b.com"), leaf("C", "https://c.com")]),
        ],
    );
    let added = watcher.on_changed().unwrap();
    assert_eq!(added.url, "https://b.com");
    assert_eq!(added.title, "B");
    assert_eq!(watcher.on_changed(), None);
}

#[test]
fn test_session_tagging_round() {
    let dir = tempfile::tempdir().unwrap();
    let settings = AppSettings::in_dir(dir.path());
    write_root(
        &settings.bookmarks_path,
        vec![
            leaf("Rust", "https://www.rust-lang.org"),
            leaf("Docs", "https://docs.rs"),
            leaf("News", "https://news.ycombinator.com"),
        ],
    );

    let mut session = Session::open(settings.clone()).unwrap();
    assert!(session.tags().is_empty());

    session.set_selection([0, 1]);
    assert_eq!(
        session.add_tags("rust, dev").unwrap(),
        ActionOutcome::Done { count: 2 }
    );

    session.set_search_text("rust,");
    assert_eq!(session.visible_rows().count(), 2);
    assert_eq!(session.suggestions(), &["dev"]);

    // hidden rows are never mutated, even if selected before filtering
    session.set_selection([0]);
    session.set_search_text("");
    session.select(2);
    session.set_name_filter("rust");
    assert_eq!(
        session.delete_tags(&["RUST".to_string()]).unwrap(),
        ActionOutcome::Done { count: 1 }
    );
    assert_eq!(session.tags().get("https://www.rust-lang.org"), &["dev"]);
    assert_eq!(session.tags().get("https://docs.rs"), &["rust", "dev"]);

    // a fresh session sees the persisted state
    let reopened = Session::open(settings).unwrap();
    assert_eq!(reopened.tags(), session.tags());
    assert_eq!(reopened.rows()[1].tags, "rust,dev");
}
