//! The interface a front end drives.
//!
//! A `Session` owns one consistent snapshot of bookmarks, tags and table rows
//! plus the state of the three search inputs, the row selection and the
//! suggestion list. Every input change recomputes visibility and suggestions;
//! every tag mutation is persisted before it returns.

use crate::bookmarks::reader::{load_bookmarks, BookmarkRead};
use crate::bookmarks::table::build_rows;
use crate::bookmarks::tags::{self, parse_tag_input, TagStore};
use crate::bookmarks::watcher::BookmarkAdded;
use crate::bookmarks::{BookmarkRecord, DisplayRow, TagSet};
use crate::core::settings::{save_settings, AppSettings, ColorScheme};
use crate::search::filter::{filter_rows, VisibilityResult};
use crate::search::query::{apply_suggestion, drop_last_segment, FilterState};
use crate::search::suggest::{rank, SuggestionCursor};
use crate::shared::errors::StorageError;
use crate::status::prober::{AutomationError, BrowserAutomation};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Tag storage failed: {0}")]
    Storage(#[from] StorageError),
    #[error("Browser automation failed: {0}")]
    Automation(#[from] AutomationError),
}

/// Result of a user action that may have had nothing to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action ran; `count` is the number of bookmarks it touched.
    Done { count: usize },
    /// No visible row is selected.
    NothingSelected,
    /// The tag input held no usable tag.
    NoTags,
}

pub struct Session {
    settings: AppSettings,
    store: TagStore,
    records: Vec<BookmarkRecord>,
    tags: TagSet,
    rows: Vec<DisplayRow>,
    search_text: String,
    url_filter: String,
    name_filter: String,
    filter: FilterState,
    visibility: VisibilityResult,
    selection: BTreeSet<usize>,
    suggestions: SuggestionCursor,
    bookmarks_missing: bool,
}

impl Session {
    /// Loads bookmarks and tags for `settings` and computes the unfiltered view.
    pub fn open(settings: AppSettings) -> Result<Self, SessionError> {
        let store = TagStore::new(settings.tags_path.clone());
        let mut session = Self {
            settings,
            store,
            records: Vec::new(),
            tags: TagSet::new(),
            rows: Vec::new(),
            search_text: String::new(),
            url_filter: String::new(),
            name_filter: String::new(),
            filter: FilterState::default(),
            visibility: VisibilityResult::default(),
            selection: BTreeSet::new(),
            suggestions: SuggestionCursor::default(),
            bookmarks_missing: false,
        };
        session.reload()?;
        Ok(session)
    }

    /// Re-reads the bookmark file, prunes tags of vanished bookmarks and
    /// rebuilds the table. The selection is cleared; filters are kept.
    ///
    /// Tags are only pruned against a bookmark file that was actually read.
    /// A missing file shows an empty table; an unreadable one (e.g. caught
    /// mid-write) keeps the previous bookmarks.
    pub fn reload(&mut self) -> Result<(), SessionError> {
        let bookmarks_path = self.settings.bookmarks_path.clone();
        let read = load_bookmarks(&bookmarks_path);
        self.bookmarks_missing = read == BookmarkRead::Missing;

        match read {
            BookmarkRead::Loaded(records) => {
                let known: HashSet<String> = records.iter().map(|r| r.url.clone()).collect();
                self.records = records;
                self.tags = self.load_tags(Some(&known))?;
            }
            BookmarkRead::Missing => {
                tracing::warn!(
                    target: "bookmarks",
                    path = %bookmarks_path.display(),
                    "Bookmark file missing, tags left unpruned"
                );
                self.records.clear();
                self.tags = self.load_tags(None)?;
            }
            BookmarkRead::Unreadable => {
                tracing::warn!(
                    target: "bookmarks",
                    path = %bookmarks_path.display(),
                    "Bookmark file unreadable, keeping previous bookmarks"
                );
                self.tags = self.load_tags(None)?;
            }
        }

        self.rows = build_rows(&self.records, &self.tags);
        self.selection.clear();
        self.refilter();

        tracing::info!(
            target: "bookmarks",
            bookmarks = self.records.len(),
            tagged = self.tags.len(),
            "Session reloaded"
        );
        Ok(())
    }

    fn load_tags(&self, known: Option<&HashSet<String>>) -> Result<TagSet, SessionError> {
        match self.store.load(known) {
            Ok(tag_set) => Ok(tag_set),
            Err(e) if e.is_corrupt() => {
                tracing::warn!(
                    target: "bookmarks",
                    path = %self.store.path().display(),
                    error = %e,
                    "Tag file corrupt, starting with no tags"
                );
                self.store.move_aside()?;
                Ok(TagSet::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn refilter(&mut self) {
        self.filter = FilterState::new(&self.search_text, &self.url_filter, &self.name_filter);
        self.visibility = filter_rows(&self.rows, &self.filter);

        for row in self.visibility.hidden_rows() {
            self.selection.remove(&row);
        }

        self.rerank();
    }

    fn rerank(&mut self) {
        self.suggestions.reset(rank(
            &self.visibility.available_tags,
            &self.filter.stub,
            self.settings.suggestion_threshold,
        ));
    }

    fn rebuild_rows(&mut self) {
        self.rows = build_rows(&self.records, &self.tags);
        self.refilter();
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn records(&self) -> &[BookmarkRecord] {
        &self.records
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn rows(&self) -> &[DisplayRow] {
        &self.rows
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// True when the bookmark file did not exist at the last reload.
    pub fn bookmarks_missing(&self) -> bool {
        self.bookmarks_missing
    }

    pub fn is_visible(&self, row: usize) -> bool {
        self.visibility.is_visible(row)
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = (usize, &DisplayRow)> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.visibility.is_visible(*idx))
    }

    pub fn available_tags(&self) -> &BTreeSet<String> {
        &self.visibility.available_tags
    }

    pub fn render_row(&self, row: usize) -> Option<String> {
        self.rows
            .get(row)
            .map(|r| r.render_html(&self.settings.colors))
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
        self.refilter();
    }

    pub fn set_url_filter(&mut self, text: impl Into<String>) {
        self.url_filter = text.into();
        self.refilter();
    }

    pub fn set_name_filter(&mut self, text: impl Into<String>) {
        self.name_filter = text.into();
        self.refilter();
    }

    pub fn clear_filters(&mut self) {
        self.search_text.clear();
        self.url_filter.clear();
        self.name_filter.clear();
        self.refilter();
    }

    pub fn drop_last_search_segment(&mut self) {
        self.search_text = drop_last_segment(&self.search_text);
        self.refilter();
    }

    pub fn suggestions(&self) -> &[String] {
        self.suggestions.items()
    }

    pub fn highlighted_suggestion(&self) -> Option<usize> {
        self.suggestions.highlighted()
    }

    pub fn highlight_next(&mut self) {
        self.suggestions.next();
    }

    pub fn highlight_prev(&mut self) {
        self.suggestions.prev();
    }

    /// Completes the stub with the highlighted (or first) suggestion.
    /// Returns false when there is nothing to accept.
    pub fn accept_suggestion(&mut self) -> bool {
        let Some(tag) = self.suggestions.accept().map(str::to_string) else {
            return false;
        };
        self.choose_suggestion(&tag);
        true
    }

    /// Completes the stub with `tag`, e.g. after a click in the list.
    pub fn choose_suggestion(&mut self, tag: &str) {
        self.search_text = apply_suggestion(&self.search_text, tag);
        self.refilter();
    }

    pub fn selection(&self) -> &BTreeSet<usize> {
        &self.selection
    }

    /// Selects a visible row. Hidden or unknown rows are ignored.
    pub fn select(&mut self, row: usize) -> bool {
        if self.visibility.is_visible(row) {
            self.selection.insert(row)
        } else {
            false
        }
    }

    pub fn deselect(&mut self, row: usize) {
        self.selection.remove(&row);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn set_selection(&mut self, rows: impl IntoIterator<Item = usize>) {
        self.selection.clear();
        for row in rows {
            self.select(row);
        }
    }

    /// Selects the first row with `url`, making it visible even if the
    /// current filters hide it. Any previous selection is dropped.
    pub fn select_by_url(&mut self, url: &str) -> bool {
        self.selection.clear();

        let Some(idx) = self.rows.iter().position(|row| row.url == url) else {
            return false;
        };
        if !self.visibility.is_visible(idx) {
            if let Some(visible) = self.visibility.visible.get_mut(idx) {
                *visible = true;
            }
            // the unhidden row's tags join the suggestion pool
            let committed = &self.filter.committed_tags;
            let row_tags = self.rows[idx]
                .tag_list()
                .map(str::to_lowercase)
                .filter(|tag| !committed.contains(tag));
            self.visibility.available_tags.extend(row_tags);
            self.rerank();
        }
        self.selection.insert(idx);
        true
    }

    fn selected_visible(&self) -> impl Iterator<Item = &DisplayRow> {
        self.selection
            .iter()
            .filter(|idx| self.visibility.is_visible(**idx))
            .filter_map(|idx| self.rows.get(*idx))
    }

    /// URLs of rows that are both selected and visible, in table order.
    pub fn selected_visible_urls(&self) -> Vec<String> {
        self.selected_visible().map(|row| row.url.clone()).collect()
    }

    /// Tags present on the selected visible rows, sorted case-insensitively.
    pub fn selection_tags(&self) -> Vec<String> {
        let unique: BTreeSet<&str> = self
            .selected_visible()
            .flat_map(|row| row.tag_list())
            .collect();

        let mut tags: Vec<String> = unique.into_iter().map(str::to_string).collect();
        tags.sort_by_key(|tag| tag.to_lowercase());
        tags
    }

    /// Adds the comma-separated tags in `raw` to every selected visible row.
    pub fn add_tags(&mut self, raw: &str) -> Result<ActionOutcome, SessionError> {
        let new_tags = parse_tag_input(raw);
        if new_tags.is_empty() {
            return Ok(ActionOutcome::NoTags);
        }

        let urls = self.selected_visible_urls();
        if urls.is_empty() {
            tracing::info!(target: "bookmarks", "Add tags ignored, nothing selected");
            return Ok(ActionOutcome::NothingSelected);
        }

        let changed = tags::add_tags(&mut self.tags, urls.iter().map(String::as_str), &new_tags);
        self.persist(changed, "added")?;
        Ok(ActionOutcome::Done { count: changed })
    }

    /// Removes `to_delete` (any casing) from every selected visible row.
    pub fn delete_tags(&mut self, to_delete: &[String]) -> Result<ActionOutcome, SessionError> {
        if to_delete.iter().all(|t| t.trim().is_empty()) {
            return Ok(ActionOutcome::NoTags);
        }

        let urls = self.selected_visible_urls();
        if urls.is_empty() {
            tracing::info!(target: "bookmarks", "Delete tags ignored, nothing selected");
            return Ok(ActionOutcome::NothingSelected);
        }

        let changed =
            tags::delete_tags(&mut self.tags, urls.iter().map(String::as_str), to_delete);
        self.persist(changed, "deleted")?;
        Ok(ActionOutcome::Done { count: changed })
    }

    fn persist(&mut self, changed: usize, action: &str) -> Result<(), SessionError> {
        if changed == 0 {
            return Ok(());
        }
        self.store.save(&self.tags)?;
        tracing::info!(target: "bookmarks", action = action, urls = changed, "Tags updated");

        let selection = std::mem::take(&mut self.selection);
        self.rebuild_rows();
        // row indices are stable across a tag-only rebuild
        self.selection = selection
            .into_iter()
            .filter(|idx| self.visibility.is_visible(*idx))
            .collect();
        Ok(())
    }

    /// Reloads after the watcher saw a new bookmark and selects its row.
    pub fn handle_bookmark_added(&mut self, added: &BookmarkAdded) -> Result<bool, SessionError> {
        tracing::info!(target: "bookmarks", url = %added.url, title = %added.title, "Bookmark added");
        self.reload()?;
        Ok(self.select_by_url(&added.url))
    }

    /// Opens the selected visible bookmarks as browser tabs.
    pub fn open_selected(
        &self,
        automation: &dyn BrowserAutomation,
    ) -> Result<ActionOutcome, SessionError> {
        let urls = self.selected_visible_urls();
        if urls.is_empty() {
            tracing::info!(target: "bookmarks", "Open ignored, nothing selected");
            return Ok(ActionOutcome::NothingSelected);
        }

        automation.open_tabs(&urls)?;
        Ok(ActionOutcome::Done { count: urls.len() })
    }

    pub fn colors(&self) -> &ColorScheme {
        &self.settings.colors
    }

    /// Replaces the row colors and writes the settings to `settings_path`.
    pub fn update_colors(
        &mut self,
        colors: ColorScheme,
        settings_path: &Path,
    ) -> Result<(), SessionError> {
        self.settings.colors = colors;
        save_settings(settings_path, &self.settings)?;
        Ok(())
    }
}
