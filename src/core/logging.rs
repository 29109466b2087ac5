use chrono::{Days, Local, NaiveDate};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Targets that get their own log file. Everything else lands in `system.log`.
pub const ROUTED_TARGETS: [&str; 2] = ["bookmarks", "status"];

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to create logs directory {path}: {source}")]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to set global tracing subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Guards that must be kept alive to ensure logs are flushed.
pub struct LoggingGuards {
    log_dir: PathBuf,
    _guards: Vec<WorkerGuard>,
}

impl LoggingGuards {
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

/// Routes each event to the file of the subsystem named by its target.
struct TargetWriter {
    writers: HashMap<String, NonBlocking>,
    system_writer: NonBlocking,
}

impl TargetWriter {
    fn new(writers: HashMap<String, NonBlocking>, system_writer: NonBlocking) -> Self {
        Self {
            writers,
            system_writer,
        }
    }
}

impl<'a> MakeWriter<'a> for TargetWriter {
    type Writer = Box<dyn std::io::Write + 'a>;

    fn make_writer(&'a self) -> Self::Writer {
        Box::new(self.system_writer.clone())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        match route_for_target(meta.target()) {
            Some(name) => match self.writers.get(name) {
                Some(writer) => Box::new(writer.clone()),
                None => Box::new(self.system_writer.clone()),
            },
            None => Box::new(self.system_writer.clone()),
        }
    }
}

/// Returns the routed target owning `target`, if any (`status::poller` -> `status`).
pub fn route_for_target(target: &str) -> Option<&'static str> {
    ROUTED_TARGETS.iter().copied().find(|name| {
        target == *name
            || target
                .strip_prefix(name)
                .is_some_and(|rest| rest.starts_with("::"))
    })
}

/// Initialize the logging system with one daily-rolling file per routed target.
pub fn init_logging(log_dir: &Path) -> Result<LoggingGuards, LoggingError> {
    if !log_dir.exists() {
        std::fs::create_dir_all(log_dir).map_err(|source| LoggingError::Directory {
            path: log_dir.to_path_buf(),
            source,
        })?;
    }

    let mut guards = Vec::new();
    let mut target_writers = HashMap::new();

    for target in ROUTED_TARGETS {
        let file_appender =
            RollingFileAppender::new(Rotation::DAILY, log_dir, format!("{}.log", target));
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        target_writers.insert(target.to_string(), non_blocking);
        guards.push(guard);
    }

    let system_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "system.log");
    let (system_writer, system_guard) = tracing_appender::non_blocking(system_appender);
    guards.push(system_guard);

    let writer = TargetWriter::new(target_writers, system_writer);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false),
    );

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!(target: "system", "Logging initialized at {:?}", log_dir);

    Ok(LoggingGuards {
        log_dir: log_dir.to_path_buf(),
        _guards: guards,
    })
}

/// Days of rolled log files kept by [`cleanup_old_logs`].
pub const LOG_RETENTION_DAYS: u64 = 7;

/// Deletes rolled log files (`<target>.log.YYYY-MM-DD`) older than `keep_days`.
/// Errors are logged, never returned. Returns how many files were removed.
pub fn cleanup_old_logs(log_dir: &Path, keep_days: u64) -> usize {
    let Some(cutoff) = Local::now()
        .date_naive()
        .checked_sub_days(Days::new(keep_days))
    else {
        return 0;
    };

    let entries = match std::fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(target: "system", "Failed to read logs directory: {}", e);
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(date) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(rolled_log_date)
        else {
            continue;
        };

        if date < cutoff {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::warn!(target: "system", "Failed to delete old log file {:?}: {}", path, e)
                }
            }
        }
    }
    removed
}

fn rolled_log_date(file_name: &str) -> Option<NaiveDate> {
    let (stem, date) = file_name.rsplit_once('.')?;
    if !stem.ends_with(".log") {
        return None;
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}
