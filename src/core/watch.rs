//! Debounced watcher for a single file.
//!
//! Editors and browsers usually replace files atomically (write temp, rename),
//! which drops a watch placed on the file itself. The watcher therefore
//! observes the parent directory non-recursively and only reacts to events
//! whose path names the watched file.

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebouncedEvent, Debouncer};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Duration;
use thiserror::Error;

/// Default debounce duration in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Watched file has no parent directory: {0}")]
    NoParent(PathBuf),
    #[error("Directory to watch does not exist: {0}")]
    MissingDirectory(PathBuf),
    #[error("Failed to watch path: {0}")]
    Notify(#[from] notify::Error),
}

/// Configuration for one file watcher.
#[derive(Clone, Debug)]
pub struct WatchConfig {
    /// Identifier used in log lines (e.g. "bookmarks").
    pub watch_id: String,
    /// The file to watch.
    pub file_path: PathBuf,
    /// Debounce duration in milliseconds.
    pub debounce_ms: u64,
}

impl WatchConfig {
    pub fn new(watch_id: impl Into<String>, file_path: PathBuf) -> Self {
        Self {
            watch_id: watch_id.into(),
            file_path,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }

    /// Sets the debounce duration in milliseconds.
    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    fn watch_dir(&self) -> Result<PathBuf, WatchError> {
        match self.file_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
            _ => Err(WatchError::NoParent(self.file_path.clone())),
        }
    }
}

/// A running watcher. Dropping it stops the event thread.
pub struct FileWatcher {
    debouncer: Debouncer<RecommendedWatcher>,
    config: WatchConfig,
    watch_dir: PathBuf,
    stop_tx: Sender<()>,
}

impl FileWatcher {
    /// Starts watching and calls `on_change` once per debounced batch touching the file.
    pub fn start<F>(config: WatchConfig, on_change: F) -> Result<Self, WatchError>
    where
        F: FnMut(&Path) + Send + 'static,
    {
        let watch_dir = config.watch_dir()?;
        if !watch_dir.is_dir() {
            return Err(WatchError::MissingDirectory(watch_dir));
        }

        let (event_tx, event_rx) = channel::<Result<Vec<DebouncedEvent>, notify::Error>>();
        let (stop_tx, stop_rx) = channel::<()>();

        let mut debouncer = new_debouncer(Duration::from_millis(config.debounce_ms), event_tx)?;
        debouncer
            .watcher()
            .watch(&watch_dir, RecursiveMode::NonRecursive)?;

        let watch_id = config.watch_id.clone();
        let file_path = config.file_path.clone();
        std::thread::spawn(move || {
            handle_events(event_rx, stop_rx, &watch_id, &file_path, on_change);
        });

        tracing::info!(
            target: "system",
            watch_id = %config.watch_id,
            path = %config.file_path.display(),
            "File watcher started"
        );

        Ok(Self {
            debouncer,
            config,
            watch_dir,
            stop_tx,
        })
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Stops delivering events and ends the event thread.
    pub fn stop(&mut self) {
        let _ = self.debouncer.watcher().unwatch(&self.watch_dir);
        let _ = self.stop_tx.send(());
        tracing::info!(
            target: "system",
            watch_id = %self.config.watch_id,
            "File watcher stopped"
        );
    }
}

/// True when any path of a debounced batch names `file_path`.
pub fn batch_touches<'a, I>(paths: I, file_path: &Path) -> bool
where
    I: IntoIterator<Item = &'a Path>,
{
    let Some(file_name) = file_path.file_name() else {
        return false;
    };
    paths
        .into_iter()
        .any(|path| path.file_name() == Some(file_name))
}

fn handle_events<F>(
    event_rx: Receiver<Result<Vec<DebouncedEvent>, notify::Error>>,
    stop_rx: Receiver<()>,
    watch_id: &str,
    file_path: &Path,
    mut on_change: F,
) where
    F: FnMut(&Path),
{
    loop {
        if stop_rx.try_recv().is_ok() {
            break;
        }

        match event_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(Ok(events)) => {
                if batch_touches(events.iter().map(|e| e.path.as_path()), file_path) {
                    tracing::debug!(
                        target: "system",
                        watch_id = %watch_id,
                        path = %file_path.display(),
                        "Watched file changed"
                    );
                    on_change(file_path);
                }
            }
            Ok(Err(e)) => {
                tracing::error!(
                    target: "system",
                    watch_id = %watch_id,
                    error = %e,
                    "Watcher error"
                );
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                tracing::info!(
                    target: "system",
                    watch_id = %watch_id,
                    "Watcher channel closed"
                );
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_config_builder() {
        let config = WatchConfig::new("bookmarks", PathBuf::from("/tmp/Bookmarks.plist"))
            .debounce_ms(500);

        assert_eq!(config.watch_id, "bookmarks");
        assert_eq!(config.debounce_ms, 500);
        assert_eq!(config.watch_dir().unwrap(), PathBuf::from("/tmp"));
    }

    #[test]
    fn test_bare_file_name_has_no_watch_dir() {
        let config = WatchConfig::new("bookmarks", PathBuf::from("Bookmarks.plist"));
        assert!(matches!(config.watch_dir(), Err(WatchError::NoParent(_))));
    }

    #[test]
    fn test_batch_touches_matches_file_name_only() {
        let target = Path::new("/lib/Safari/Bookmarks.plist");
        let history = Path::new("/lib/Safari/History.db");
        let bookmarks = Path::new("/lib/Safari/Bookmarks.plist");

        assert!(batch_touches([history, bookmarks], target));
        assert!(!batch_touches([history], target));
        assert!(!batch_touches(std::iter::empty::<&Path>(), target));
    }

    #[test]
    fn test_missing_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = WatchConfig::new("bookmarks", dir.path().join("gone").join("b.plist"));
        let result = FileWatcher::start(config, |_| {});
        assert!(matches!(result, Err(WatchError::MissingDirectory(_))));
    }
}
