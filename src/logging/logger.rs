//! Structured logger that forwards every message to `tracing`.
use std::path::{Path, PathBuf};

use super::types::{DRY_RUN_TARGET, FATAL_TARGET, Log, STAGE_TARGET, SUCCESS_TARGET};
use crate::tasks::Summary;

/// Implement the methods of [`Log`] by delegating to inherent methods of
/// the same name on the implementing type.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Process-wide logger.
///
/// Console and file output are both produced by the subscriber installed
/// with [`init_subscriber`](super::subscriber::init_subscriber); the logger
/// only remembers the log path so the run summary can point to it.
#[derive(Debug)]
pub struct Logger {
    log_file: PathBuf,
}

impl Logger {
    /// Create a new logger for the given persistent log path.
    #[must_use]
    pub fn new(log_file: &Path) -> Self {
        Self {
            log_file: log_file.to_path_buf(),
        }
    }

    /// Path of the persistent log file.
    #[must_use]
    pub fn log_path(&self) -> &Path {
        &self.log_file
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (console only, and only when verbose).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a recoverable error.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a run-ending error.
    pub fn fatal(&self, msg: &str) {
        tracing::error!(target: FATAL_TARGET, "{msg}");
    }

    /// Log a successful outcome.
    pub fn success(&self, msg: &str) {
        tracing::info!(target: SUCCESS_TARGET, "{msg}");
    }

    /// Log a dry-run intent.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// Print the aggregate outcome counts and the log location.
    pub fn print_summary(&self, summary: &Summary) {
        self.stage("Summary");
        self.info(&summary.to_string());
        if summary.failed > 0 {
            self.warn(&format!(
                "{} tool(s) failed to install; see the log for details",
                summary.failed
            ));
        }
        self.info(&format!("log: {}", self.log_file.display()));
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, fatal, success, dry_run);
}
