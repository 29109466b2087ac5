use crate::shared::errors::StorageError;
use crate::shared::paths::{ensure_parent, get_bookmarks_path, get_tags_path};
use crate::search::suggest::DEFAULT_SUGGESTION_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Interval between two status probes of the browser's front tab.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Display colors for the three lines of a bookmark row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorScheme {
    pub name: String,
    pub url: String,
    pub tags: String,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            name: "#cfffed".to_string(),
            url: "#00ccff".to_string(),
            tags: "#008000".to_string(),
        }
    }
}

/// Application configuration, created once at startup and passed to the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    pub bookmarks_path: PathBuf,
    pub tags_path: PathBuf,
    pub poll_interval_ms: u64,
    pub suggestion_threshold: f64,
    pub colors: ColorScheme,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            bookmarks_path: get_bookmarks_path(),
            tags_path: get_tags_path(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            suggestion_threshold: DEFAULT_SUGGESTION_THRESHOLD,
            colors: ColorScheme::default(),
        }
    }
}

impl AppSettings {
    /// Settings rooted in `dir`, handy for tests and portable installs.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            bookmarks_path: dir.join("Bookmarks.plist"),
            tags_path: dir.join("tags.json"),
            ..Self::default()
        }
    }
}

/// Loads settings, falling back to defaults when the file is missing or broken.
pub fn load_settings(path: &Path) -> AppSettings {
    if !path.exists() {
        return AppSettings::default();
    }

    match load_settings_from_file(path) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(
                target: "system",
                path = %path.display(),
                error = %e,
                "Settings unreadable, using defaults"
            );
            AppSettings::default()
        }
    }
}

fn load_settings_from_file(path: &Path) -> Result<AppSettings, StorageError> {
    let contents = std::fs::read_to_string(path)?;
    let settings = serde_json::from_str(&contents)?;
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &AppSettings) -> Result<(), StorageError> {
    ensure_parent(path).map_err(|e| StorageError::directory(e.to_string()))?;

    let contents = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, contents)?;
    Ok(())
}
