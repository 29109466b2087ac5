//! "Is the page in the browser's front tab bookmarked?"
//!
//! The prober asks the automation channel for the front tab's URL and
//! compares it against the bookmark set. Re-checks of an unchanged URL are
//! skipped unless forced (e.g. after the bookmark set was reloaded).

use super::matcher::{best_match, MatchKind};
use crate::bookmarks::reader::read_bookmarks;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Failed to run automation script: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Automation script failed with exit code {exit_code:?}: {stderr}")]
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },
}

/// Control channel to the external browser.
pub trait BrowserAutomation {
    /// URL of the front tab, or `None` when the browser has no window.
    fn front_url(&self) -> Result<Option<String>, AutomationError>;

    /// Opens `urls` as new tabs and brings the browser to front.
    fn open_tabs(&self, urls: &[String]) -> Result<(), AutomationError>;
}

/// Where the prober gets the URLs to compare against.
pub trait BookmarkSource {
    fn bookmark_urls(&self) -> Vec<String>;
}

/// Reads URLs straight from the bookmark file on every check.
#[derive(Debug, Clone)]
pub struct PlistBookmarks {
    path: PathBuf,
}

impl PlistBookmarks {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BookmarkSource for PlistBookmarks {
    fn bookmark_urls(&self) -> Vec<String> {
        read_bookmarks(&self.path)
            .into_iter()
            .map(|record| record.url)
            .collect()
    }
}

/// Indicator state shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BookmarkStatus {
    /// The browser has no open window.
    NoWindow,
    /// The automation channel failed; distinct from "not bookmarked".
    Error,
    Full,
    Domain,
    NotBookmarked,
}

impl From<MatchKind> for BookmarkStatus {
    fn from(kind: MatchKind) -> Self {
        match kind {
            MatchKind::Full => BookmarkStatus::Full,
            MatchKind::Domain => BookmarkStatus::Domain,
            MatchKind::None => BookmarkStatus::NotBookmarked,
        }
    }
}

impl BookmarkStatus {
    pub fn describe(&self) -> &'static str {
        match self {
            BookmarkStatus::NoWindow => "no browser window",
            BookmarkStatus::Error => "could not read browser URL",
            BookmarkStatus::Full => "exact bookmark found",
            BookmarkStatus::Domain => "domain bookmarked",
            BookmarkStatus::NotBookmarked => "no bookmark",
        }
    }
}

pub struct StatusProber<A, S> {
    automation: A,
    source: S,
    last_url: Option<String>,
    last_status: Option<BookmarkStatus>,
}

impl<A: BrowserAutomation, S: BookmarkSource> StatusProber<A, S> {
    pub fn new(automation: A, source: S) -> Self {
        Self {
            automation,
            source,
            last_url: None,
            last_status: None,
        }
    }

    pub fn last_status(&self) -> Option<BookmarkStatus> {
        self.last_status
    }

    pub fn last_url(&self) -> Option<&str> {
        self.last_url.as_deref()
    }

    pub fn automation(&self) -> &A {
        &self.automation
    }

    /// Probes the front tab.
    ///
    /// Returns the new status, or `None` when the URL is unchanged since the
    /// last check and `force` is false (the previous status still holds).
    pub fn check(&mut self, force: bool) -> Option<BookmarkStatus> {
        let current_url = match self.automation.front_url() {
            Ok(Some(url)) => url.trim().to_string(),
            Ok(None) => String::new(),
            Err(e) => {
                tracing::warn!(target: "status", error = %e, "Front URL probe failed");
                self.last_url = None;
                self.last_status = Some(BookmarkStatus::Error);
                return self.last_status;
            }
        };

        if current_url.is_empty() {
            self.last_url = None;
            self.last_status = Some(BookmarkStatus::NoWindow);
            return self.last_status;
        }

        if !force
            && self.last_status.is_some()
            && self.last_url.as_deref() == Some(current_url.as_str())
        {
            return None;
        }

        let status = self.check_existence(&current_url);
        self.last_url = Some(current_url);
        self.last_status = Some(status);
        Some(status)
    }

    fn check_existence(&self, url: &str) -> BookmarkStatus {
        let urls = self.source.bookmark_urls();
        let status = BookmarkStatus::from(best_match(url, urls.iter().map(String::as_str)));
        tracing::debug!(
            target: "status",
            url = %url,
            candidates = urls.len(),
            status = ?status,
            "Bookmark existence checked"
        );
        status
    }
}
