//! Status probing against a real bookmark file with a scripted browser.

use plist::{Dictionary, Value};
use std::cell::RefCell;
use std::path::Path;
use tagmark_lib::status::{
    AutomationError, BookmarkStatus, BrowserAutomation, PlistBookmarks, StatusProber,
};

/// Replays a fixed sequence of front-tab answers.
struct ScriptedBrowser {
    answers: RefCell<Vec<Result<Option<String>, AutomationError>>>,
}

impl ScriptedBrowser {
    fn new(answers: Vec<Result<Option<&str>, ()>>) -> Self {
        let mut answers: Vec<_> = answers
            .into_iter()
            .map(|a| match a {
                Ok(url) => Ok(url.map(str::to_string)),
                Err(()) => Err(AutomationError::Failed {
                    exit_code: Some(1),
                    stderr: "Safari got an error".to_string(),
                }),
            })
            .collect();
        answers.reverse();
        Self {
            answers: RefCell::new(answers),
        }
    }
}

impl BrowserAutomation for ScriptedBrowser {
    fn front_url(&self) -> Result<Option<String>, AutomationError> {
        self.answers.borrow_mut().pop().unwrap_or(Ok(None))
    }

    fn open_tabs(&self, _urls: &[String]) -> Result<(), AutomationError> {
        Ok(())
    }
}

fn write_bookmarks(path: &Path, urls: &[&str]) {
    let children = urls
        .iter()
        .map(|url| {
            let mut dict = Dictionary::new();
            dict.insert("URLString".into(), Value::String(url.to_string()));
            dict.insert("Title".into(), Value::String("t".into()));
            Value::Dictionary(dict)
        })
        .collect();
    let mut root = Dictionary::new();
    root.insert("Children".into(), Value::Array(children));
    Value::Dictionary(root).to_file_xml(path).unwrap();
}

#[test]
fn test_probe_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Bookmarks.plist");
    write_bookmarks(
        &path,
        &["https://example.com/page", "https://de.wikipedia.org/wiki/K%C3%B6ln"],
    );

    let browser = ScriptedBrowser::new(vec![
        Ok(Some("https://www.example.com/page/")),
        Ok(Some("https://example.com/other")),
        Ok(Some("https://de.wikipedia.org/wiki/Köln")),
        Ok(Some("https://unrelated.org")),
        Err(()),
        Ok(None),
    ]);
    let mut prober = StatusProber::new(browser, PlistBookmarks::new(&path));

    assert_eq!(prober.check(false), Some(BookmarkStatus::Full));
    assert_eq!(prober.check(false), Some(BookmarkStatus::Domain));
    assert_eq!(prober.check(false), Some(BookmarkStatus::Full));
    assert_eq!(prober.check(false), Some(BookmarkStatus::NotBookmarked));
    assert_eq!(prober.check(false), Some(BookmarkStatus::Error));
    assert_eq!(prober.check(false), Some(BookmarkStatus::NoWindow));
}

#[test]
fn test_forced_probe_sees_new_bookmark() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Bookmarks.plist");
    write_bookmarks(&path, &[]);

    let browser = ScriptedBrowser::new(vec![
        Ok(Some("https://example.com")),
        Ok(Some("https://example.com")),
        Ok(Some("https://example.com")),
    ]);
    let mut prober = StatusProber::new(browser, PlistBookmarks::new(&path));

    assert_eq!(prober.check(false), Some(BookmarkStatus::NotBookmarked));

    write_bookmarks(&path, &["https://example.com/"]);
    assert_eq!(prober.check(false), None);
    assert_eq!(prober.check(true), Some(BookmarkStatus::Full));
}

#[test]
fn test_missing_bookmark_file_is_not_bookmarked() {
    let dir = tempfile::tempdir().unwrap();
    let browser = ScriptedBrowser::new(vec![Ok(Some("https://example.com"))]);
    let mut prober = StatusProber::new(browser, PlistBookmarks::new(dir.path().join("none.plist")));

    assert_eq!(prober.check(false), Some(BookmarkStatus::NotBookmarked));
}
