use std::path::{Path, PathBuf};

/// Get the base storage directory following XDG Base Directory Specification.
/// Returns `$XDG_DATA_HOME/tagmark` or `~/.local/share/tagmark`.
pub fn get_storage_dir() -> PathBuf {
    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        if !xdg_data.is_empty() {
            return PathBuf::from(xdg_data).join("tagmark");
        }
    }

    home_dir().join(".local").join("share").join("tagmark")
}

/// Get the logs directory path.
/// Returns `{storage_dir}/logs`.
pub fn get_log_dir() -> PathBuf {
    get_storage_dir().join("logs")
}

/// Default location of the sideband tag file.
pub fn get_tags_path() -> PathBuf {
    get_storage_dir().join("tags.json")
}

/// Default location of the settings file.
pub fn get_settings_path() -> PathBuf {
    get_storage_dir().join("config.json")
}

/// Default location of Safari's bookmark container.
pub fn get_bookmarks_path() -> PathBuf {
    home_dir()
        .join("Library")
        .join("Safari")
        .join("Bookmarks.plist")
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Ensure the parent directory of a file exists.
pub fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}
